use axum::{Router, http::HeaderName, routing::get};
use serde::Serialize;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::DeploymentMode;
use crate::db::Database;
use crate::handlers::{errors::not_found_handler, health_handler};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const WEB_ROOT: &str = "web";

#[derive(Clone, Debug)]
pub struct AppState {
    pub mode: DeploymentMode,
    /// Pools for repository-backed handlers. No route reads them yet.
    /// Absent when the server was started without `--database`.
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(mode: DeploymentMode, database: Option<Database>) -> Self {
        Self { mode, database }
    }
}

/// What serves a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Health,
    Index,
    Assets,
}

/// One mounted route; also the `--routes` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub pattern: String,
    pub handler: RouteTarget,
}

pub fn route_table(mode: &DeploymentMode) -> Vec<RouteDoc> {
    vec![
        RouteDoc {
            method: "GET",
            pattern: "/".to_string(),
            handler: RouteTarget::Index,
        },
        RouteDoc {
            method: "GET",
            pattern: format!("/{WEB_ROOT}/*"),
            handler: RouteTarget::Assets,
        },
        RouteDoc {
            method: "GET",
            pattern: format!("/{}/health", mode.name()),
            handler: RouteTarget::Health,
        },
    ]
}

pub fn route_table_json(mode: &DeploymentMode) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&route_table(mode))
}

pub fn app_router(state: AppState, cors: Option<CorsLayer>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router: Router<AppState> = Router::new();
    for route in route_table(&state.mode) {
        router = match route.handler {
            RouteTarget::Health => router.route(&route.pattern, get(health_handler)),
            RouteTarget::Index => router.route_service(
                &route.pattern,
                ServeFile::new(format!("{WEB_ROOT}/index.html")),
            ),
            RouteTarget::Assets => router.nest_service(
                route.pattern.trim_end_matches("/*"),
                ServeDir::new(WEB_ROOT),
            ),
        };
    }

    let mut router = router.fallback(not_found_handler).with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    router
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

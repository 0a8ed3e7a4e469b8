use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use starship::{
    config::DeploymentMode,
    middleware::cors_layer,
    router::{AppState, app_router, route_table},
};
use tower::ServiceExt;

fn app(mode: &str, origins: &str) -> axum::Router {
    let mode = DeploymentMode::parse(mode);
    let cors = cors_layer(origins).expect("valid origins");
    app_router(AppState::new(mode, None), cors)
}

async fn json_body(resp: axum::response::Response) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

#[tokio::test]
async fn health_route_reports_systems_up() {
    let resp = app("local", "https://app.example.com")
        .oneshot(
            Request::builder()
                .uri("/local/health")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body = json_body(resp).await;
    assert_eq!(body["message"], "Systems Up");
    let time = body["time"].as_str().expect("time is a string");
    assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
}

#[tokio::test]
async fn health_route_follows_the_mode() {
    let router = app("staging", "https://app.example.com");

    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/staging/health")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/local/health")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let resp = app("local", "https://app.example.com")
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Resource not found.");
}

#[tokio::test]
async fn preflight_from_allowed_origin_is_answered() {
    let resp = app("local", "https://app.example.com")
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/local/health")
                .header(header::ORIGIN, "https://app.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-session")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.as_bytes()),
        Some(&b"https://app.example.com"[..])
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).map(|v| v.as_bytes()),
        Some(&b"true"[..])
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_MAX_AGE).map(|v| v.as_bytes()),
        Some(&b"300"[..])
    );
}

#[tokio::test]
async fn other_origins_get_no_cors_grant() {
    let resp = app("local", "https://app.example.com")
        .oneshot(
            Request::builder()
                .uri("/local/health")
                .header(header::ORIGIN, "https://evil.example.net")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[test]
fn wildcard_origin_is_rejected() {
    assert!(cors_layer("*").is_err());
}

#[tokio::test]
async fn index_page_is_served() {
    let resp = app("local", "https://app.example.com")
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn every_listed_route_is_mounted() {
    let mode = DeploymentMode::parse("staging");
    let router = app("staging", "https://app.example.com");

    for route in route_table(&mode) {
        let uri = match route.pattern.strip_suffix("/*") {
            Some(prefix) => format!("{prefix}/index.html"),
            None => route.pattern.clone(),
        };
        let resp = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(route.method)
                    .uri(&uri)
                    .body(Body::empty())
                    .expect("failed to build request"),
            )
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK, "route {uri} is not mounted");
    }
}

use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::cli::Args;
use crate::config::{
    AwsSecretStore, CloudContext, DeploymentMode, EnvironmentProvider, NoSecretStore,
    SecretStore, Settings, mode::region_from_env, resolve_settings,
};
use crate::db::{Database, MigrationRunner, RdsAuthTokenSource, setup_database};
use crate::error::StarshipError;
use crate::middleware::cors_layer;
use crate::router::{AppState, app_router, route_table_json};

/// Startup phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    Config,
    Database,
    WebServer,
}

impl StartupStep {
    pub const ORDER: [StartupStep; 3] = [
        StartupStep::Config,
        StartupStep::Database,
        StartupStep::WebServer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StartupStep::Config => "config",
            StartupStep::Database => "database",
            StartupStep::WebServer => "web-server",
        }
    }
}

/// Output of the config step.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub mode: DeploymentMode,
    pub cloud: CloudContext,
    pub settings: Settings,
}

async fn run_step<T>(
    step: StartupStep,
    fut: impl Future<Output = Result<T, StarshipError>>,
) -> Result<T, StarshipError> {
    info!(step = step.name(), "startup step begin");
    let out = fut.await;
    match &out {
        Ok(_) => info!(step = step.name(), "startup step done"),
        Err(e) => error!(step = step.name(), class = ?e.class(), error = %e, "startup step failed"),
    }
    out
}

pub struct Starship<E> {
    args: Args,
    env: E,
}

impl<E: EnvironmentProvider> Starship<E> {
    pub fn new(args: Args, env: E) -> Self {
        Self { args, env }
    }

    pub async fn launch(&self) -> Result<(), StarshipError> {
        let loaded = run_step(StartupStep::Config, self.load_config()).await?;
        let database = run_step(StartupStep::Database, self.connect_database(&loaded)).await?;
        run_step(StartupStep::WebServer, self.serve(&loaded, database)).await
    }

    pub async fn load_config(&self) -> Result<Loaded, StarshipError> {
        let mode = DeploymentMode::from_env(&self.env);
        let region = region_from_env(&self.env);
        info!(
            mode = %mode,
            region = %region,
            port = self.args.port,
            "starting service"
        );

        let cloud = CloudContext::load(&mode, region).await;
        let secrets: Box<dyn SecretStore> = if mode.is_local() {
            Box::new(NoSecretStore)
        } else {
            Box::new(AwsSecretStore::new(&cloud)?)
        };
        let settings = resolve_settings(&mode, &self.env, secrets.as_ref()).await?;

        Ok(Loaded {
            mode,
            cloud,
            settings,
        })
    }

    pub async fn connect_database(&self, loaded: &Loaded) -> Result<Option<Database>, StarshipError> {
        if !self.args.database {
            info!("database disabled; pass --database to enable");
            return Ok(None);
        }

        let tokens = RdsAuthTokenSource::new(loaded.cloud.clone());
        let database = setup_database(
            &loaded.settings,
            loaded.cloud.region(),
            &tokens,
            &MigrationRunner::embedded(),
        )
        .await?;
        Ok(Some(database))
    }

    pub async fn serve(&self, loaded: &Loaded, database: Option<Database>) -> Result<(), StarshipError> {
        let cors = match cors_layer(&loaded.settings.cors_origins) {
            Ok(cors) => cors,
            Err(e) => {
                close(database).await;
                return Err(e);
            }
        };

        if self.args.routes {
            let table = route_table_json(&loaded.mode);
            close(database).await;
            println!("{}", table?);
            return Ok(());
        }

        let state = AppState::new(loaded.mode.clone(), database.clone());
        let app = app_router(state, cors);

        let served = async {
            let listener = TcpListener::bind((self.args.address.as_str(), self.args.port)).await?;
            info!(address = %self.args.address, port = self.args.port, "HTTP server listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok::<_, StarshipError>(())
        }
        .await;

        close(database).await;
        info!("server stopped");
        served
    }
}

async fn close(database: Option<Database>) {
    if let Some(database) = database {
        database.close().await;
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

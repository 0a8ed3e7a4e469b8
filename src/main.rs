use clap::Parser;
use mimalloc::MiMalloc;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use starship::{Starship, cli::Args, config::SystemEnvironment};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    if let Err(e) = dotenv {
        warn!(error = %e, "no .env file loaded");
    }

    let args = Args::parse();
    if let Err(e) = Starship::new(args, SystemEnvironment).launch().await {
        error!(error = %e, "starship failed to start");
        std::process::exit(1);
    }
}

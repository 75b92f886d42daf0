//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API on its own, for development and debugging with Swagger UI. The workspace's
//! `careguard-run` binary serves the same router.

use api_rest::AppState;
use careguard_core::config::data_dir_from_env_value;
use careguard_core::{CareEngine, CoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the CareGuard REST API server.
///
/// # Environment Variables
/// - `CAREGUARD_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CAREGUARD_DATA_DIR`: Root of the JSON record store (default: "care_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory is invalid or cannot be opened, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("careguard_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CAREGUARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::new(data_dir_from_env_value(
        std::env::var("CAREGUARD_DATA_DIR").ok(),
    ))?;

    tracing::info!("-- Starting CareGuard REST API on {}", addr);

    let engine = CareEngine::open(&cfg).await?;
    api_rest::serve(&addr, AppState::new(engine)).await
}

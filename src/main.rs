use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use careguard_core::config::data_dir_from_env_value;
use careguard_core::{CareEngine, CoreConfig};

/// Env filter with the service's own crates raised to `info`.
fn log_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("careguard_run=info".parse()?)
        .add_directive("careguard_core=info".parse()?)
        .add_directive("api_rest=info".parse()?))
}

/// Main entry point for the CareGuard service
///
/// Resolves configuration once, opens the JSON record store and serves the REST API with
/// Swagger UI at `/swagger-ui`.
///
/// # Environment Variables
/// - `CAREGUARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CAREGUARD_DATA_DIR`: Directory for care data storage (default: "care_data")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, storage or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CAREGUARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::new(data_dir_from_env_value(
        std::env::var("CAREGUARD_DATA_DIR").ok(),
    ))?;

    tracing::info!("++ Starting CareGuard REST on {}", rest_addr);
    tracing::info!("++ Care data directory: {}", cfg.data_dir().display());

    let engine = CareEngine::open(&cfg).await?;
    api_rest::serve(&rest_addr, AppState::new(engine)).await
}

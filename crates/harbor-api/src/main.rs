//! API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p harbor-api
//! ```
//!
//! Configuration is loaded from environment variables, with an optional
//! `.env` file.

use harbor_common::{try_init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let tracing_config = if config.app.env.is_production() {
        TracingConfig::production()
    } else {
        TracingConfig::development()
    };
    if let Err(e) = try_init_tracing(&tracing_config) {
        eprintln!("warning: failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        api_port = config.api.port,
        gateway_port = config.gateway_server.port,
        "configuration loaded"
    );

    harbor_api::run(config).await?;

    Ok(())
}

//! Reaction simulation entry point
//!
//! Run with:
//! ```bash
//! cargo run -p reaction-sim
//! ```
//!
//! Configuration is loaded from environment variables (see `.env.example`).

mod scenarios;
mod world;

use reaction_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::from_app_config(&config)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        worker_id = config.snowflake.worker_id,
        "Configuration loaded"
    );

    if let Err(e) = scenarios::run_all(&config).await {
        error!(error = %e, "Simulation failed");
        std::process::exit(1);
    }
}

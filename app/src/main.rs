//! Lending pool service entry point
//!
//! Configuration comes from the JSON file named by the first argument or by
//! `LENDPOOL_CONFIG`, falling back to defaults. `LENDPOOL_PORT` overrides the
//! configured port.

use std::path::PathBuf;

use anyhow::Context;
use ledger_api::{start_server, AppState};
use ledger_core::AppConfig;

const CONFIG_ENV: &str = "LENDPOOL_CONFIG";
const PORT_ENV: &str = "LENDPOOL_PORT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lendpool=debug".parse()?)
                .add_directive("lending=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = load_config()?;
    let port = config.server.port;
    tracing::info!(
        port,
        collateralization_ratio = config.risk.collateralization_ratio,
        liquidation_threshold = config.risk.liquidation_threshold,
        "Starting lending pool"
    );

    let state = AppState::from_config(config)?;
    start_server(state, port)
        .await
        .context("API server stopped")?;

    Ok(())
}

fn load_config() -> anyhow::Result<AppConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);

    let mut config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            AppConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };

    if let Ok(raw) = std::env::var(PORT_ENV) {
        config.server.port = raw
            .parse()
            .with_context(|| format!("{} must be a port number, got {:?}", PORT_ENV, raw))?;
    }

    Ok(config)
}

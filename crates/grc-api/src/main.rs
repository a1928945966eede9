//! # grc-apid — API Service Entry Point
//!
//! Initializes tracing, loads the engine configuration, and serves the
//! application router.

use grc_api::{app, AppState};
use grc_engine::{ComplianceEngine, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Optional YAML config; defaults apply when unset.
    let config = match std::env::var("GRC_CONFIG") {
        Ok(path) => {
            let source = std::fs::read_to_string(&path)?;
            let config = EngineConfig::from_yaml(&source)
                .map_err(|e| anyhow::anyhow!("loading {path}: {e}"))?;
            tracing::info!(%path, "engine configuration loaded");
            config
        }
        Err(_) => EngineConfig::default(),
    };

    let state = AppState::new(ComplianceEngine::new(config));
    let router = app(state);

    let addr = std::env::var("GRC_LISTEN").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "readiness API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

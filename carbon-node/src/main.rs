//! `carbon-node`, a thin REST facade over the carbon-credited ledger. Out
//! of scope: no peer selection, no gossip, no fork-choice beyond the
//! longest-valid-chain rule the core already enforces by only ever
//! appending to one chain.

mod config;
mod error;
mod routes;

use carbon_core::ledger::LedgerHandle;
use carbon_core::persistence;
use config::NodeConfig;
use routes::AppState;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::load()?;
    info!(addr = %config.socket_addr(), snapshot_dir = %config.snapshot_dir.display(), "starting carbon-node");

    let ledger = match persistence::load(&config.snapshot_dir) {
        Ok(state) => {
            info!("restored ledger state from snapshot");
            LedgerHandle::spawn_with_state(state)
        }
        Err(err) => {
            warn!(%err, "no usable snapshot found, starting from genesis");
            LedgerHandle::spawn_new()
        }
    };

    let state = AppState {
        ledger: ledger.clone(),
        contracts: Arc::new(carbon_core::contracts::ContractEngine::with_builtins()),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;

    let snapshot_dir = config.snapshot_dir.clone();
    let shutdown_ledger = ledger.clone();
    let shutdown_signal = async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested, writing snapshot");
        if let Ok(data) = shutdown_ledger.snapshot().await {
            if let Err(err) = persistence::save(&snapshot_dir, &data) {
                warn!(%err, "failed to write snapshot on shutdown");
            }
        }
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;
    Ok(())
}

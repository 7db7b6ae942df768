//! pallet Control Plane
//!
//! Central coordination service: serves the Control API, schedules
//! workload replicas across the agent pool, and runs the health loop that
//! replaces dead agents.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pallet_control_plane::{
    api, config,
    reconciler::HealthWorker,
    rpc::HttpAgentClient,
    snapshot::SnapshotWriter,
    spawn::{NoopLauncher, ProcessLauncher, WorkerLauncher},
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pallet control plane");
    info!(listen_addr = %config.listen_addr, "Configuration loaded");

    let agent_client = Arc::new(HttpAgentClient::new(
        config.agent_host.clone(),
        Duration::from_secs(config.rpc_timeout_secs),
    ));
    let snapshots = SnapshotWriter::new(config.snapshot_dir.clone());
    let state = AppState::new(agent_client, snapshots);

    // Launch the initial agent pool; each agent self-registers over the
    // Control API once it has bound a port.
    let launcher: Arc<dyn WorkerLauncher> = match &config.agent_bin {
        Some(bin) => Arc::new(ProcessLauncher::new(
            bin.clone(),
            config.listen_addr.port(),
        )),
        None => Arc::new(NoopLauncher),
    };
    for _ in 0..config.agent_pool_size {
        if let Err(e) = launcher.launch() {
            error!(error = %e, "failed to launch initial agent");
        }
    }

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the health worker in background
    let health_worker = HealthWorker::new(
        state.clone(),
        Arc::clone(&launcher),
        Duration::from_secs(config.probe_interval_secs),
        config.probe_failure_threshold,
    );
    let health_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            health_worker.run(shutdown_rx).await;
        }
    });

    // Build and run the server
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    // Signal shutdown to the health worker and wait for it
    let _ = shutdown_tx.send(true);
    if let Err(e) = tokio::time::timeout(Duration::from_secs(10), health_handle).await {
        warn!(error = %e, "Health worker did not shut down in time");
    }

    info!("Control plane shutdown complete");
    Ok(())
}

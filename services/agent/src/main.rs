//! pallet Worker Agent
//!
//! Runs one worker: binds an ephemeral port, reports it to the control
//! plane, and serves container create/delete commands against the local
//! runtime. The control plane port arrives as the single command line
//! argument so the control plane can spawn replacements itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use pallet_agent::{
    api::{self, AppState},
    config,
    register,
    runtime::{ContainerRuntime, DockerRuntime, MockRuntime},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let control_port: u16 = std::env::args()
        .nth(1)
        .context("usage: agent <control-plane-port>")?
        .parse()
        .context("control plane port must be a number")?;

    info!("Starting pallet agent");

    let runtime: Arc<dyn ContainerRuntime> = match config.runtime.as_str() {
        "mock" => Arc::new(MockRuntime::new()),
        _ => Arc::new(DockerRuntime::new(config.bootstrap_script.clone())?),
    };

    let app = api::create_router(AppState::new(runtime));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let agent_port = listener.local_addr()?.port();

    register::announce_port(&config.control_host, control_port, agent_port).await?;

    info!(port = agent_port, "Waiting for connections");
    axum::serve(listener, app).await?;

    Ok(())
}

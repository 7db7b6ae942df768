//! Worker process launching.
//!
//! The control plane starts a fixed-size pool of agent processes at boot and
//! the health loop launches replacements for dead ones. Launched processes
//! inherit stdio and are never waited on; a dead worker is only ever noticed
//! by the health loop's probes.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

/// Seam between the health loop and the operating system.
pub trait WorkerLauncher: Send + Sync {
    /// Launch one replacement worker. The worker self-registers over the
    /// Control API once it has bound a port.
    fn launch(&self) -> Result<()>;
}

/// Spawns the agent binary with the control plane's port as its argument.
pub struct ProcessLauncher {
    agent_bin: PathBuf,
    control_port: u16,
}

impl ProcessLauncher {
    pub fn new(agent_bin: PathBuf, control_port: u16) -> Self {
        Self {
            agent_bin,
            control_port,
        }
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self) -> Result<()> {
        let child = Command::new(&self.agent_bin)
            .arg(self.control_port.to_string())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn agent {}", self.agent_bin.display()))?;

        info!(
            agent_bin = %self.agent_bin.display(),
            pid = child.id(),
            "agent process started"
        );
        Ok(())
    }
}

/// Launcher for deployments where workers are managed externally (and for
/// tests); launching is a logged no-op.
pub struct NoopLauncher;

impl WorkerLauncher for NoopLauncher {
    fn launch(&self) -> Result<()> {
        info!("no agent binary configured; expecting a worker to register on its own");
        Ok(())
    }
}

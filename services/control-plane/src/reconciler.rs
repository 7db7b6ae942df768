//! Agent health reconciliation loop.
//!
//! Probes every agent in the pool on a fixed interval. An agent that fails
//! the configured number of consecutive probes is tombstoned and a
//! replacement worker is launched; the replacement re-registers through the
//! Control API and re-arms the tombstoned record. A successful probe resets
//! the failure count and marks the agent active, which also revives an
//! agent that came back on its own.
//!
//! Each sweep runs under the cluster lock, the same serialization point the
//! request handlers use, so liveness flips never interleave with a
//! placement or teardown batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cluster::AgentId;
use crate::spawn::WorkerLauncher;
use crate::state::AppState;

/// Background worker that keeps the agent pool alive.
pub struct HealthWorker {
    state: AppState,
    launcher: Arc<dyn WorkerLauncher>,
    interval: Duration,
    failure_threshold: u32,
    failures: HashMap<AgentId, u32>,
}

impl HealthWorker {
    pub fn new(
        state: AppState,
        launcher: Arc<dyn WorkerLauncher>,
        interval: Duration,
        failure_threshold: u32,
    ) -> Self {
        Self {
            state,
            launcher,
            interval,
            failure_threshold,
            failures: HashMap::new(),
        }
    }

    /// Run until shutdown is signaled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            failure_threshold = self.failure_threshold,
            "Starting health worker"
        );

        let mut interval = tokio::time::interval(self.interval);
        // Don't immediately tick on startup - wait for first interval
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Health worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One probe pass over the whole pool.
    pub async fn sweep(&mut self) {
        let mut cluster = self.state.cluster().lock().await;
        let roster = cluster.agent_roster();

        for (id, port, active) in roster {
            match self.state.agents().probe(port).await {
                Ok(()) => {
                    debug!(agent_id = %id, port, "agent is alive");
                    self.failures.insert(id, 0);
                    cluster.mark_active(id);
                }
                Err(e) => {
                    if !active {
                        // Already tombstoned; a replacement is on its way.
                        debug!(agent_id = %id, port, error = %e, "dead agent still not responding");
                        continue;
                    }

                    let count = self.failures.entry(id).or_insert(0);
                    *count += 1;
                    warn!(
                        agent_id = %id,
                        port,
                        consecutive_failures = *count,
                        error = %e,
                        "agent probe failed"
                    );

                    if *count >= self.failure_threshold && cluster.mark_inactive(id) {
                        error!(agent_id = %id, port, "agent presumed dead; launching replacement");
                        self.failures.insert(id, 0);
                        if let Err(e) = self.launcher.launch() {
                            error!(error = %e, "failed to launch replacement agent");
                        }
                    }
                }
            }
        }
    }
}

//! Application state shared across request handlers and workers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cluster::Cluster;
use crate::rpc::AgentApi;
use crate::snapshot::SnapshotWriter;

/// Shared application state.
///
/// The cluster sits behind a single async mutex: request handlers and the
/// health loop take the lock for a whole operation, including the agent RPC
/// batch it issues, which is what makes every Control API operation atomic
/// against the others.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cluster: Mutex<Cluster>,
    agents: Arc<dyn AgentApi>,
    snapshots: SnapshotWriter,
}

impl AppState {
    pub fn new(agents: Arc<dyn AgentApi>, snapshots: SnapshotWriter) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cluster: Mutex::new(Cluster::new()),
                agents,
                snapshots,
            }),
        }
    }

    /// The cluster lock.
    pub fn cluster(&self) -> &Mutex<Cluster> {
        &self.inner.cluster
    }

    /// The agent RPC transport.
    pub fn agents(&self) -> &dyn AgentApi {
        self.inner.agents.as_ref()
    }

    /// Dump a snapshot of the given (already locked) cluster state.
    pub async fn persist(&self, cluster: &Cluster) {
        self.inner.snapshots.write(cluster).await;
    }
}

//! Write-only JSON snapshots of cluster state.
//!
//! After every mutating Control API call the registry and the agent pool are
//! dumped to `workloads.json` and `agents.json`. The files are a diagnostic
//! dump only; the control plane boots from a clean slate and never reads
//! them back. Write failures are logged and otherwise ignored.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::cluster::Cluster;

pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Dump the current registry and pool. Never fails the caller.
    pub async fn write(&self, cluster: &Cluster) {
        self.dump("workloads.json", &cluster.assignment_views())
            .await;
        self.dump("agents.json", &cluster.agent_views()).await;
    }

    async fn dump<T: serde::Serialize>(&self, file: &str, value: &T) {
        let path = self.dir.join(file);
        let bytes = match serde_json::to_vec_pretty(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file, error = %e, "failed to serialize snapshot");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            warn!(path = %path.display(), error = %e, "failed to write snapshot");
            return;
        }
        debug!(path = %path.display(), "snapshot written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ContainerSpec, WorkloadSpec};

    #[tokio::test]
    async fn snapshots_dump_registry_and_pool_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut cluster = Cluster::new();
        let id = cluster.register_agent(9001).agent_id();
        cluster
            .insert_workload(WorkloadSpec {
                name: "web".to_string(),
                image: "nginx".to_string(),
                replica_count: 1,
            })
            .unwrap();
        cluster.record_placement(
            id,
            ContainerSpec {
                index: 1,
                configuration_name: "web".to_string(),
                image: "nginx".to_string(),
            },
        );

        let writer = SnapshotWriter::new(dir.path().to_path_buf());
        writer.write(&cluster).await;

        let workloads: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("workloads.json")).unwrap())
                .unwrap();
        assert_eq!(workloads[0]["spec"]["replicaCount"], 1);
        assert_eq!(workloads[0]["agents"][0]["containers"]["web1"]["index"], 1);

        let agents: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("agents.json")).unwrap())
                .unwrap();
        assert_eq!(agents[0]["port"], 9001);
        assert_eq!(agents[0]["active"], true);
    }

    #[tokio::test]
    async fn unwritable_directory_is_not_fatal() {
        let writer = SnapshotWriter::new(PathBuf::from("/nonexistent/pallet"));
        writer.write(&Cluster::new()).await;
    }
}

//! Wire and state types for the cluster model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declarative workload specification submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    /// Workload name; unique key across the cluster.
    pub name: String,

    /// Container image to run.
    pub image: String,

    /// Desired number of replicas.
    pub replica_count: i64,
}

/// One replica of a workload, as sent to an agent.
///
/// Identity is `(configuration_name, index)`; the derived container name is
/// the concatenation of both and must be unique across the whole cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// 1-based replica index.
    pub index: i64,

    /// Name of the owning workload.
    pub configuration_name: String,

    /// Container image.
    pub image: String,
}

impl ContainerSpec {
    /// Derived container name, e.g. `web3` for replica 3 of `web`.
    pub fn derived_name(&self) -> String {
        derived_name(&self.configuration_name, self.index)
    }
}

/// Derived container name for a workload replica.
pub fn derived_name(workload: &str, index: i64) -> String {
    format!("{workload}{index}")
}

/// Stable identifier for an agent record.
///
/// Assigned once when the record enters the pool and never reused for a
/// different record; a replacement worker re-arms the record under the same
/// id rather than occupying an array position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub(crate) u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

impl Serialize for AgentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A worker agent tracked by the pool.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRecord {
    /// Stable record id.
    pub id: AgentId,

    /// Port the agent is currently listening on.
    pub port: u16,

    /// Whether the last liveness decision considered the agent alive.
    pub active: bool,

    /// Containers believed to run on this agent, keyed by derived name.
    pub containers: BTreeMap<String, ContainerSpec>,
}

impl AgentRecord {
    pub(crate) fn new(id: AgentId, port: u16) -> Self {
        Self {
            id,
            port,
            active: true,
            containers: BTreeMap::new(),
        }
    }
}

/// A workload together with the agents hosting its replicas.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    pub spec: WorkloadSpec,
    pub agents: Vec<AgentRecord>,
}

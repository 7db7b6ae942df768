//! Authoritative cluster state: the workload registry and the agent pool.
//!
//! `Cluster` is the single owner of all mutable orchestration state. It is
//! kept behind one async mutex in [`crate::state::AppState`], so every public
//! operation here is an atomic transaction with respect to concurrent API
//! requests and the health loop.
//!
//! # Invariants
//!
//! - At most one assignment per workload name.
//! - A container recorded on an agent implies that agent is a member of the
//!   workload's assignment.
//! - Agent ports are unique among currently-active agents.
//! - Agent records are never deleted; a dead agent becomes a tombstone and is
//!   re-armed in place (same id, new port) when a replacement registers.

mod model;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;
use tracing::info;

pub use model::{derived_name, AgentId, AgentRecord, AssignmentView, ContainerSpec, WorkloadSpec};

/// Errors surfaced by cluster state operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("workload name must not be empty")]
    EmptyName,

    #[error("workload image must not be empty")]
    EmptyImage,

    #[error("replica count must not be negative")]
    NegativeReplicas,

    #[error("workload {0} already exists")]
    AlreadyExists(String),

    #[error("no such configuration: {0}")]
    NotFound(String),

    #[error("no agents available")]
    NoAgents,
}

/// Outcome of an agent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A brand new record was appended to the pool.
    Added(AgentId),
    /// A tombstoned record was re-armed with the new port.
    Rearmed(AgentId),
    /// A record already held this port; reactivated in place.
    Reactivated(AgentId),
}

impl Registration {
    pub fn agent_id(&self) -> AgentId {
        match *self {
            Registration::Added(id) | Registration::Rearmed(id) | Registration::Reactivated(id) => {
                id
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Assignment {
    spec: WorkloadSpec,
    agents: BTreeSet<AgentId>,
}

/// The workload registry and agent pool.
#[derive(Debug, Default)]
pub struct Cluster {
    workloads: BTreeMap<String, Assignment>,
    agents: Vec<AgentRecord>,
    /// Tombstoned agent ids awaiting a replacement, oldest first.
    tombstones: VecDeque<AgentId>,
    next_agent_id: u64,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a workload spec before any mutation.
    pub fn validate_spec(spec: &WorkloadSpec) -> Result<(), ClusterError> {
        if spec.name.is_empty() {
            return Err(ClusterError::EmptyName);
        }
        if spec.image.is_empty() {
            return Err(ClusterError::EmptyImage);
        }
        if spec.replica_count < 0 {
            return Err(ClusterError::NegativeReplicas);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Workload registry
    // ------------------------------------------------------------------

    pub fn contains_workload(&self, name: &str) -> bool {
        self.workloads.contains_key(name)
    }

    /// Stored spec for a workload, if present.
    pub fn workload_spec(&self, name: &str) -> Option<&WorkloadSpec> {
        self.workloads.get(name).map(|a| &a.spec)
    }

    /// Insert a fresh, empty assignment for a workload.
    pub fn insert_workload(&mut self, spec: WorkloadSpec) -> Result<(), ClusterError> {
        if self.workloads.contains_key(&spec.name) {
            return Err(ClusterError::AlreadyExists(spec.name.clone()));
        }
        self.workloads.insert(
            spec.name.clone(),
            Assignment {
                spec,
                agents: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Remove a workload's assignment entirely.
    pub fn remove_workload(&mut self, name: &str) -> bool {
        self.workloads.remove(name).is_some()
    }

    /// Overwrite the stored replica count for a workload.
    pub fn set_replica_count(&mut self, name: &str, replica_count: i64) {
        if let Some(assignment) = self.workloads.get_mut(name) {
            assignment.spec.replica_count = replica_count;
        }
    }

    /// Record a successful placement: the container lands on the agent and
    /// the agent joins the workload's assignment.
    pub fn record_placement(&mut self, agent_id: AgentId, container: ContainerSpec) {
        let workload = container.configuration_name.clone();
        if let Some(agent) = self.agent_mut(agent_id) {
            agent.containers.insert(container.derived_name(), container);
        }
        if let Some(assignment) = self.workloads.get_mut(&workload) {
            assignment.agents.insert(agent_id);
        }
    }

    /// Record a successful teardown of one container on one agent.
    ///
    /// Assignment membership is intentionally left in place; it only goes
    /// away when the whole assignment is removed.
    pub fn record_removal(&mut self, agent_id: AgentId, container_name: &str) {
        if let Some(agent) = self.agent_mut(agent_id) {
            agent.containers.remove(container_name);
        }
    }

    /// Agent ids assigned to a workload.
    pub fn assigned_agents(&self, name: &str) -> Option<Vec<AgentId>> {
        self.workloads
            .get(name)
            .map(|a| a.agents.iter().copied().collect())
    }

    // ------------------------------------------------------------------
    // Agent pool
    // ------------------------------------------------------------------

    /// Register an agent that announced itself on `port`.
    ///
    /// Re-registration of a port we already track reactivates that record in
    /// place, whether it is alive or tombstoned: a restarted agent must
    /// reclaim its own record, or two records would end up sharing one port.
    /// Otherwise the oldest tombstone is re-armed under its existing id, or a
    /// new record is appended if no replacement is pending.
    pub fn register_agent(&mut self, port: u16) -> Registration {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.port == port) {
            let id = agent.id;
            agent.active = true;
            self.tombstones.retain(|t| *t != id);
            return Registration::Reactivated(id);
        }

        if let Some(id) = self.tombstones.pop_front() {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.id == id) {
                agent.port = port;
                agent.active = true;
                info!(agent_id = %id, port, "agent record re-armed by replacement");
                return Registration::Rearmed(id);
            }
        }

        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        self.agents.push(AgentRecord::new(id, port));
        info!(agent_id = %id, port, "agent joined the pool");
        Registration::Added(id)
    }

    /// Tombstone an agent that is no longer responding.
    ///
    /// Returns true on the active-to-inactive transition; repeated calls for
    /// an already-dead agent are no-ops.
    pub fn mark_inactive(&mut self, id: AgentId) -> bool {
        match self.agent_mut(id) {
            Some(agent) if agent.active => {
                agent.active = false;
                self.tombstones.push_back(id);
                true
            }
            _ => false,
        }
    }

    pub fn mark_active(&mut self, id: AgentId) {
        // A probe success for a tombstoned record revives it in place.
        let revived = match self.agent_mut(id) {
            Some(agent) if !agent.active => {
                agent.active = true;
                true
            }
            _ => false,
        };
        if revived {
            self.tombstones.retain(|t| *t != id);
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentRecord> {
        self.agents.iter().find(|a| a.id == id)
    }

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentRecord> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// `(id, port, active)` for every record, in pool order.
    pub fn agent_roster(&self) -> Vec<(AgentId, u16, bool)> {
        self.agents
            .iter()
            .map(|a| (a.id, a.port, a.active))
            .collect()
    }

    /// Placement order for one scheduling batch: agents sorted ascending by
    /// current container count. The sort is stable, so ties keep pool order.
    /// Snapshot once per batch; not re-sorted per replica.
    pub fn placement_order(&self) -> Vec<(AgentId, u16)> {
        let mut order: Vec<&AgentRecord> = self.agents.iter().collect();
        order.sort_by_key(|a| a.containers.len());
        order.iter().map(|a| (a.id, a.port)).collect()
    }

    // ------------------------------------------------------------------
    // Views (status endpoints and snapshots)
    // ------------------------------------------------------------------

    /// All workload specs, for `/envStatus`.
    pub fn workload_specs(&self) -> Vec<WorkloadSpec> {
        self.workloads.values().map(|a| a.spec.clone()).collect()
    }

    /// All agent records, for `/agentsStatus` and the pool snapshot.
    pub fn agent_views(&self) -> Vec<AgentRecord> {
        self.agents.clone()
    }

    /// A workload with its hosting agents, for `/envNameStatus`.
    pub fn assignment_view(&self, name: &str) -> Option<AssignmentView> {
        self.workloads.get(name).map(|assignment| AssignmentView {
            spec: assignment.spec.clone(),
            agents: assignment
                .agents
                .iter()
                .filter_map(|id| self.agent(*id).cloned())
                .collect(),
        })
    }

    /// Every workload with its hosting agents, for the registry snapshot.
    pub fn assignment_views(&self) -> Vec<AssignmentView> {
        self.workloads
            .keys()
            .filter_map(|name| self.assignment_view(name))
            .collect()
    }
}

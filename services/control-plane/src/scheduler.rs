//! Placement, teardown, and the scale/update state machine.
//!
//! All three entry points operate on the locked [`Cluster`] and talk to
//! agents through [`AgentApi`]. Batches are best-effort: every replica is
//! attempted, per-replica failures are collected, and overall success is the
//! conjunction of the per-replica outcomes.
//!
//! The rollback policy is deliberately asymmetric and is pinned by tests:
//! a failed initial create removes the registry assignment but does not
//! retract containers that were already created on agents, and a failed
//! scale-up rolls back nothing, leaving the stored replica count at the
//! requested value.

use tracing::{info, warn};

use crate::cluster::{derived_name, Cluster, ClusterError, ContainerSpec, WorkloadSpec};
use crate::rpc::AgentApi;

/// Aggregate result of one scheduling or teardown batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    errors: Vec<String>,
}

impl BatchOutcome {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Concatenated per-replica error messages.
    pub fn detail(&self) -> String {
        self.errors.join("\n")
    }

    fn record_failure(&mut self, message: String) {
        self.errors.push(message);
    }
}

/// Place replicas `start_index..=spec.replica_count` across the pool.
///
/// `start_index == 1` is an initial create and registers a fresh assignment;
/// any larger value is a scale-up against an existing assignment. Validation
/// and existence failures return early without mutating anything.
pub async fn place(
    cluster: &mut Cluster,
    agents: &dyn AgentApi,
    spec: &WorkloadSpec,
    start_index: i64,
) -> Result<BatchOutcome, ClusterError> {
    Cluster::validate_spec(spec)?;

    if start_index == 1 {
        if cluster.contains_workload(&spec.name) {
            return Err(ClusterError::AlreadyExists(spec.name.clone()));
        }
    } else if !cluster.contains_workload(&spec.name) {
        return Err(ClusterError::NotFound(spec.name.clone()));
    }

    // One load-ordered snapshot for the whole batch.
    let order = cluster.placement_order();
    if order.is_empty() {
        return Err(ClusterError::NoAgents);
    }

    if start_index == 1 {
        cluster.insert_workload(spec.clone())?;
    }

    let mut outcome = BatchOutcome::default();
    let mut i = 0i64;
    while start_index + i <= spec.replica_count {
        let index = start_index + i;
        let (agent_id, port) = order[(i as usize) % order.len()];
        let container = ContainerSpec {
            index,
            configuration_name: spec.name.clone(),
            image: spec.image.clone(),
        };

        match agents.create_container(port, &container).await {
            Ok(()) => {
                info!(workload = %spec.name, index, agent_id = %agent_id, port, "container created");
                cluster.record_placement(agent_id, container);
            }
            Err(e) => {
                warn!(workload = %spec.name, index, agent_id = %agent_id, port, error = %e, "container creation failed");
                outcome.record_failure(format!(
                    "create {} failed on {agent_id}: {e}",
                    container.derived_name()
                ));
            }
        }
        i += 1;
    }

    // Initial create rolls back the registry entry on failure. Containers
    // already created on agents are not retracted.
    if start_index == 1 && !outcome.ok() {
        cluster.remove_workload(&spec.name);
    }

    Ok(outcome)
}

/// Tear down replicas `from_index..=stored replica count` of a workload.
///
/// Best-effort across all assigned agents; the assignment itself is removed
/// only for a fully successful teardown that started at index 1.
pub async fn remove_all(
    cluster: &mut Cluster,
    agents: &dyn AgentApi,
    name: &str,
    from_index: i64,
) -> Result<BatchOutcome, ClusterError> {
    let replica_count = cluster
        .workload_spec(name)
        .ok_or_else(|| ClusterError::NotFound(name.to_string()))?
        .replica_count;
    let assigned = cluster.assigned_agents(name).unwrap_or_default();

    let mut outcome = BatchOutcome::default();
    for agent_id in assigned {
        for index in from_index..=replica_count {
            let container_name = derived_name(name, index);
            let (present, port) = match cluster.agent(agent_id) {
                Some(agent) => (agent.containers.contains_key(&container_name), agent.port),
                None => (false, 0),
            };
            if !present {
                continue;
            }

            match agents.delete_container(port, &container_name).await {
                Ok(()) => {
                    info!(workload = name, container = %container_name, agent_id = %agent_id, "container deleted");
                    cluster.record_removal(agent_id, &container_name);
                }
                Err(e) => {
                    warn!(workload = name, container = %container_name, agent_id = %agent_id, error = %e, "container deletion failed");
                    outcome.record_failure(format!("delete {container_name} failed: {e}"));
                }
            }
        }
    }

    if from_index == 1 && outcome.ok() {
        cluster.remove_workload(name);
    }

    Ok(outcome)
}

/// Classify and apply an update request against the stored spec.
///
/// Image change is a full replace (teardown, then recreate; teardown failure
/// aborts the replace). A higher replica count scales up from the old count;
/// the stored count is set to the requested value before the batch runs and
/// is kept regardless of the outcome. A lower count scales down and then
/// stores the new count. An identical spec is a no-op with zero RPCs.
pub async fn apply_update(
    cluster: &mut Cluster,
    agents: &dyn AgentApi,
    requested: &WorkloadSpec,
) -> Result<BatchOutcome, ClusterError> {
    Cluster::validate_spec(requested)?;

    let existing = cluster
        .workload_spec(&requested.name)
        .ok_or_else(|| ClusterError::NotFound(requested.name.clone()))?
        .clone();

    if requested.image != existing.image {
        info!(
            workload = %requested.name,
            old_image = %existing.image,
            new_image = %requested.image,
            "replacing workload image"
        );
        let teardown = remove_all(cluster, agents, &requested.name, 1).await?;
        if !teardown.ok() {
            return Ok(teardown);
        }
        return place(cluster, agents, requested, 1).await;
    }

    if requested.replica_count == existing.replica_count {
        info!(workload = %requested.name, "update is a no-op");
        return Ok(BatchOutcome::default());
    }

    if requested.replica_count > existing.replica_count {
        info!(
            workload = %requested.name,
            from = existing.replica_count,
            to = requested.replica_count,
            "scaling up"
        );
        cluster.set_replica_count(&requested.name, requested.replica_count);
        return place(cluster, agents, requested, existing.replica_count + 1).await;
    }

    info!(
        workload = %requested.name,
        from = existing.replica_count,
        to = requested.replica_count,
        "scaling down"
    );
    let outcome = remove_all(cluster, agents, &requested.name, requested.replica_count + 1).await?;
    cluster.set_replica_count(&requested.name, requested.replica_count);
    Ok(outcome)
}

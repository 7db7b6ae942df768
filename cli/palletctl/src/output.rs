//! Output formatting for CLI commands.

use colored::Colorize;
use tabled::{Table, Tabled};

use crate::client::{AgentView, AssignmentView, WorkloadSpec};

#[derive(Tabled)]
pub struct WorkloadRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "IMAGE")]
    image: String,
    #[tabled(rename = "REPLICAS")]
    replicas: i64,
}

impl From<&WorkloadSpec> for WorkloadRow {
    fn from(spec: &WorkloadSpec) -> Self {
        Self {
            name: spec.name.clone(),
            image: spec.image.clone(),
            replicas: spec.replica_count,
        }
    }
}

#[derive(Tabled)]
pub struct AgentRow {
    #[tabled(rename = "AGENT")]
    id: String,
    #[tabled(rename = "PORT")]
    port: u16,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CONTAINERS")]
    containers: String,
}

impl From<&AgentView> for AgentRow {
    fn from(agent: &AgentView) -> Self {
        Self {
            id: agent.id.clone(),
            port: agent.port,
            status: if agent.active {
                "active".to_string()
            } else {
                "not active".to_string()
            },
            containers: join_names(agent),
        }
    }
}

fn join_names(agent: &AgentView) -> String {
    agent
        .containers
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print rows as a table, or a dimmed placeholder when there are none.
pub fn print_table<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        println!("{}", empty_message.dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print one workload with its per-agent container division.
pub fn print_assignment(view: &AssignmentView) {
    println!("{} {}", "Configuration:".bold(), view.spec.name);
    println!("  image:    {}", view.spec.image);
    println!("  replicas: {}", view.spec.replica_count);

    for agent in &view.agents {
        let names: Vec<&String> = agent
            .containers
            .iter()
            .filter(|(_, c)| c.configuration_name == view.spec.name)
            .map(|(name, _)| name)
            .collect();
        println!(
            "  {} (port {}): {}",
            agent.id,
            agent.port,
            names
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

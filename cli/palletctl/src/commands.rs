//! CLI commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::{AgentView, ApiClient, AssignmentView, WorkloadSpec};
use crate::manifest::Manifest;
use crate::output::{self, AgentRow, WorkloadRow};

/// pallet CLI - Deploy and manage container workloads.
#[derive(Debug, Parser)]
#[command(name = "pallet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Control plane URL.
    #[arg(
        long,
        global = true,
        env = "PALLET_SERVER",
        default_value = "http://127.0.0.1:1234"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a workload from a manifest.
    Create {
        /// Path to the workload manifest.
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Update a workload to match a manifest (scale or change image).
    Update {
        /// Path to the workload manifest.
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Delete a workload and all of its containers.
    Delete {
        /// Workload name.
        name: String,
    },

    /// Show one workload with its per-agent container division.
    Status {
        /// Workload name.
        name: String,
    },

    /// List all workloads.
    Envs,

    /// List all agents.
    Agents,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let client = ApiClient::new(&self.server)?;

        match &self.command {
            Commands::Create { file } => {
                let manifest = Manifest::load(file)?;
                let message: String = client.post("/create", &manifest.to_request()).await?;
                output::print_success(&message);
            }
            Commands::Update { file } => {
                let manifest = Manifest::load(file)?;
                let message: String = client.post("/update", &manifest.to_request()).await?;
                output::print_success(&message);
            }
            Commands::Delete { name } => {
                let message: String = client.post("/delete", name).await?;
                output::print_success(&message);
            }
            Commands::Status { name } => {
                let view: AssignmentView = client.post("/envNameStatus", name).await?;
                output::print_assignment(&view);
            }
            Commands::Envs => {
                let specs: Vec<WorkloadSpec> = client.get("/envStatus").await?;
                let rows: Vec<WorkloadRow> = specs.iter().map(WorkloadRow::from).collect();
                output::print_table(rows, "No configurations in the system.");
            }
            Commands::Agents => {
                let agents: Vec<AgentView> = client.get("/agentsStatus").await?;
                let rows: Vec<AgentRow> = agents.iter().map(AgentRow::from).collect();
                output::print_table(rows, "No agents in the system.");
            }
        }

        Ok(())
    }
}

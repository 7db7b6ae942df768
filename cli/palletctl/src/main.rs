//! palletctl (pallet) - CLI for the pallet orchestrator.
//!
//! Submits workload manifests to the control plane and renders cluster
//! status for operators.

use anyhow::Result;
use clap::Parser;

mod client;
mod commands;
mod error;
mod manifest;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;

/// Agent configuration, loaded from `PALLET_*` environment variables.
///
/// The control plane port is deliberately not part of this: it arrives as
/// the single command line argument so the control plane can pass it when
/// spawning replacement agents.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the control plane is reachable at.
    pub control_host: String,

    /// `docker` to drive the local Docker daemon, `mock` for an in-memory
    /// runtime used in development and tests.
    pub runtime: String,

    /// Bootstrap script copied into each container and run as its
    /// entrypoint. When unset, containers run their image default command.
    pub bootstrap_script: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let control_host =
            std::env::var("PALLET_CONTROL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let runtime = std::env::var("PALLET_RUNTIME").unwrap_or_else(|_| "docker".to_string());

        let bootstrap_script = std::env::var("PALLET_BOOTSTRAP_SCRIPT")
            .ok()
            .map(PathBuf::from);

        let log_level = std::env::var("PALLET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            control_host,
            runtime,
            bootstrap_script,
            log_level,
        })
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;

/// Control plane configuration, loaded from `PALLET_*` environment
/// variables with defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the Control API listens on.
    pub listen_addr: SocketAddr,

    /// Host agents are reachable at (they differ only by port).
    pub agent_host: String,

    /// Agent binary to spawn for the initial pool and for replacements.
    /// When unset, workers are expected to be started externally.
    pub agent_bin: Option<PathBuf>,

    /// Number of agent processes to spawn at startup.
    pub agent_pool_size: usize,

    /// Health probe interval in seconds.
    pub probe_interval_secs: u64,

    /// Consecutive probe failures before an agent is declared dead.
    pub probe_failure_threshold: u32,

    /// Per-RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Directory the JSON state snapshots are written to.
    pub snapshot_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("PALLET_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:1234".to_string())
            .parse()?;

        let agent_host =
            std::env::var("PALLET_AGENT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let agent_bin = std::env::var("PALLET_AGENT_BIN").ok().map(PathBuf::from);

        let agent_pool_size = std::env::var("PALLET_AGENT_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        let probe_interval_secs = std::env::var("PALLET_PROBE_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let probe_failure_threshold = std::env::var("PALLET_PROBE_FAILURE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        let rpc_timeout_secs = std::env::var("PALLET_RPC_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let snapshot_dir = std::env::var("PALLET_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let log_level = std::env::var("PALLET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            listen_addr,
            agent_host,
            agent_bin,
            agent_pool_size,
            probe_interval_secs,
            probe_failure_threshold,
            rpc_timeout_secs,
            snapshot_dir,
            log_level,
        })
    }
}

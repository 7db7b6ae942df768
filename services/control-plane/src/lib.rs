//! pallet control plane library.
//!
//! The control plane accepts declarative workload specs over HTTP, places
//! replica containers across a pool of worker agents, and keeps the
//! placement consistent as specs are created, scaled, or deleted. A
//! background health loop replaces agents that stop responding.
//!
//! All authoritative state lives in memory behind a single lock; the JSON
//! snapshots written after each mutation are diagnostics, not persistence.

pub mod api;
pub mod cluster;
pub mod config;
pub mod reconciler;
pub mod rpc;
pub mod scheduler;
pub mod snapshot;
pub mod spawn;
pub mod state;

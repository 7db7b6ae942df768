//! pallet worker agent library.
//!
//! An agent manages the containers of one worker: it binds an ephemeral
//! port, announces that port to the control plane, and then executes
//! create/delete commands against the local container runtime.

pub mod api;
pub mod config;
pub mod register;
pub mod runtime;

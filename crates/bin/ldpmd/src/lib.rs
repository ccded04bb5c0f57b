//! # ldpmd: display power management daemon
//!
//! Composition root that wires all adapters together and runs the drivers.
//!
//! ## Responsibilities
//! - Load configuration (`ldpm.toml`, then environment overrides)
//! - Turn the configured inventory into domain records
//! - Construct protocol clients, in-memory storage and application services
//! - Start the status poller and the scheduler on their own tasks
//! - Stop them on Ctrl-C and report the energy saved meanwhile
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod daemon;
pub mod inventory;

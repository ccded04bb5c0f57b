//! # ldpm-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ProtocolClient`: one wire protocol (REST, Simple IP)
//!   - `DeviceRegistry`: device and group records, status write-back
//!   - `ScheduleRepository`: the current rule set
//!   - `ActivityLog`: schedule executions and power changes
//!   - `EventPublisher`: device state-change events
//!   - `Clock`: wall-clock time
//! - Define **driving/inbound** use cases:
//!   - `DeviceAdapter`: retry, protocol fallback and deadline per device
//!   - `BulkDispatcher`: bounded-concurrency fan-out over a group
//!   - `CommandService`: resolve a command target and run it
//!   - `Scheduler`: fire cron rules against the wall clock
//!   - `StatusPoller`: periodic status query of every device
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `ldpm-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod status_poller;

#[cfg(test)]
pub(crate) mod testing;

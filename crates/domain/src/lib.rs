//! # ldpm-domain
//!
//! Pure domain model for the ldpm display power manager.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (networked displays with an address and optional credential)
//! - Define **Groups** (sets of devices targeted together)
//! - Define **Commands** (power-on, power-off, query) and their **results**
//! - Define **Schedules** (cron-triggered commands) and their execution records
//! - Define **Events** (device state transitions) and the power activity log
//! - Contain all invariant enforcement and pure domain logic (cron matching,
//!   energy savings)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod energy;
pub mod event;
pub mod group;
pub mod outcome;
pub mod schedule;

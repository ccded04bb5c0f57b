//! # ldpm-adapter-memory
//!
//! In-memory storage adapters. State lives for the lifetime of the process;
//! the daemon seeds it from its configuration file at startup.
//!
//! | Port | Implementation |
//! |------|----------------|
//! | `DeviceRegistry` | [`MemoryRegistry`] |
//! | `ScheduleRepository` | [`MemoryScheduleStore`] |
//! | `ActivityLog` | [`MemoryActivityLog`] |

mod activity_log;
mod registry;
mod schedule_store;

pub use activity_log::{DEFAULT_HISTORY, MemoryActivityLog};
pub use registry::MemoryRegistry;
pub use schedule_store::MemoryScheduleStore;

use std::sync::{LockResult, PoisonError};

/// Take the guard even if a writer panicked; every write leaves the maps
/// consistent.
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

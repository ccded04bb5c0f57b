//! Activity port: sink for schedule executions and power changes.

use std::future::Future;

use ldpm_domain::energy::PowerLogEntry;
use ldpm_domain::error::LdpmError;
use ldpm_domain::schedule::ScheduleExecution;

/// Append-only log of what the core did.
pub trait ActivityLog {
    /// Record one firing of a schedule rule.
    fn record_execution(
        &self,
        execution: ScheduleExecution,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send;

    /// Record a successful power-on or power-off.
    fn record_power(
        &self,
        entry: PowerLogEntry,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send;
}

impl<T: ActivityLog + Send + Sync> ActivityLog for std::sync::Arc<T> {
    fn record_execution(
        &self,
        execution: ScheduleExecution,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        (**self).record_execution(execution)
    }

    fn record_power(
        &self,
        entry: PowerLogEntry,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        (**self).record_power(entry)
    }
}

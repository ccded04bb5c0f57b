//! Schedule port: source of the rule set evaluated by the scheduler.

use std::future::Future;

use ldpm_domain::error::LdpmError;
use ldpm_domain::schedule::ScheduleRule;

/// Read-only access to schedule rules.
pub trait ScheduleRepository {
    /// The complete current rule set, enabled and disabled.
    fn snapshot(&self) -> impl Future<Output = Result<Vec<ScheduleRule>, LdpmError>> + Send;
}

impl<T: ScheduleRepository + Send + Sync> ScheduleRepository for std::sync::Arc<T> {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<ScheduleRule>, LdpmError>> + Send {
        (**self).snapshot()
    }
}

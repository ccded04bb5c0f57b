//! Schedule execution records.

use serde::{Deserialize, Serialize};

use crate::id::{ExecutionId, ScheduleId};
use crate::time::Timestamp;

/// One firing of a [`ScheduleRule`](super::ScheduleRule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExecution {
    pub id: ExecutionId,
    pub rule_id: ScheduleId,
    pub executed_at: Timestamp,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the rule could not be dispatched at all (e.g. its target
    /// no longer exists).
    pub error: Option<String>,
}

impl ScheduleExecution {
    /// Record of a dispatch that reached its devices.
    #[must_use]
    pub fn completed(
        rule_id: ScheduleId,
        executed_at: Timestamp,
        succeeded: usize,
        failed: usize,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            rule_id,
            executed_at,
            succeeded,
            failed,
            error: None,
        }
    }

    /// Record for a rule that never reached any device.
    #[must_use]
    pub fn rejected(rule_id: ScheduleId, executed_at: Timestamp, error: impl Into<String>) -> Self {
        Self {
            id: ExecutionId::new(),
            rule_id,
            executed_at,
            succeeded: 0,
            failed: 0,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed == 0
    }
}

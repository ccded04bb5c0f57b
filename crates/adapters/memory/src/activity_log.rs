//! In-memory implementation of [`ActivityLog`].
//!
//! Both histories are bounded; the oldest records are dropped first.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use ldpm_app::ports::ActivityLog;
use ldpm_domain::energy::{EnergyRates, EnergyReport, PowerLogEntry, compute_savings};
use ldpm_domain::error::LdpmError;
use ldpm_domain::id::ScheduleId;
use ldpm_domain::schedule::ScheduleExecution;
use ldpm_domain::time::Timestamp;

use crate::recover;

/// Records kept per history before the oldest are dropped.
pub const DEFAULT_HISTORY: usize = 10_000;

#[derive(Debug, Default)]
struct Histories {
    executions: VecDeque<ScheduleExecution>,
    power: VecDeque<PowerLogEntry>,
}

/// Schedule executions and power changes held in process memory.
#[derive(Debug)]
pub struct MemoryActivityLog {
    inner: Mutex<Histories>,
    capacity: usize,
}

impl Default for MemoryActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }
}

impl MemoryActivityLog {
    /// Keep at most `capacity` records per history (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Histories::default()),
            capacity: capacity.max(1),
        }
    }

    /// Every retained execution, oldest first.
    #[must_use]
    pub fn executions(&self) -> Vec<ScheduleExecution> {
        recover(self.inner.lock()).executions.iter().cloned().collect()
    }

    /// Retained executions of one rule, oldest first.
    #[must_use]
    pub fn executions_for(&self, rule_id: ScheduleId) -> Vec<ScheduleExecution> {
        recover(self.inner.lock())
            .executions
            .iter()
            .filter(|e| e.rule_id == rule_id)
            .cloned()
            .collect()
    }

    /// Every retained power change, oldest first.
    #[must_use]
    pub fn power_log(&self) -> Vec<PowerLogEntry> {
        recover(self.inner.lock()).power.iter().copied().collect()
    }

    /// Savings from the retained power log up to `window_end`.
    #[must_use]
    pub fn energy_savings(&self, window_end: Timestamp, rates: &EnergyRates) -> EnergyReport {
        let entries = self.power_log();
        compute_savings(&entries, window_end, rates)
    }

    fn push<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
        if queue.len() == capacity {
            queue.pop_front();
        }
        queue.push_back(item);
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record_execution(
        &self,
        execution: ScheduleExecution,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        tracing::debug!(
            rule_id = %execution.rule_id,
            succeeded = execution.succeeded,
            failed = execution.failed,
            "schedule execution recorded"
        );
        Self::push(
            &mut recover(self.inner.lock()).executions,
            execution,
            self.capacity,
        );
        async { Ok(()) }
    }

    fn record_power(
        &self,
        entry: PowerLogEntry,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        Self::push(&mut recover(self.inner.lock()).power, entry, self.capacity);
        async { Ok(()) }
    }
}

//! In-memory implementation of [`ScheduleRepository`].
//!
//! The scheduler takes a fresh snapshot on every tick, so edits made through
//! this store apply from the next tick on.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::RwLock;

use ldpm_app::ports::ScheduleRepository;
use ldpm_domain::error::{LdpmError, NotFoundError};
use ldpm_domain::id::ScheduleId;
use ldpm_domain::schedule::ScheduleRule;

use crate::recover;

/// Schedule rules held in process memory.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    rules: RwLock<BTreeMap<ScheduleId, ScheduleRule>>,
}

impl MemoryScheduleStore {
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = ScheduleRule>) -> Self {
        Self {
            rules: RwLock::new(rules.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    /// Add a rule or replace the one with the same id.
    pub fn upsert(&self, rule: ScheduleRule) {
        recover(self.rules.write()).insert(rule.id, rule);
    }

    /// Remove a rule. Returns whether it existed.
    pub fn remove(&self, id: ScheduleId) -> bool {
        recover(self.rules.write()).remove(&id).is_some()
    }

    /// Enable or disable a rule without touching its definition.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown rule id.
    pub fn set_enabled(&self, id: ScheduleId, enabled: bool) -> Result<(), LdpmError> {
        let mut rules = recover(self.rules.write());
        let rule = rules.get_mut(&id).ok_or_else(|| NotFoundError {
            entity: "Schedule",
            id: id.to_string(),
        })?;
        rule.enabled = enabled;
        Ok(())
    }
}

impl ScheduleRepository for MemoryScheduleStore {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<ScheduleRule>, LdpmError>> + Send {
        let result = recover(self.rules.read()).values().cloned().collect();
        async move { Ok(result) }
    }
}

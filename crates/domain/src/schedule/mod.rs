//! Schedules: cron-triggered power commands.

mod cron;
mod execution;

pub use cron::{CronError, CronSchedule};
pub use execution::ScheduleExecution;

use serde::{Deserialize, Serialize};

use crate::command::{CommandTarget, PowerAction};
use crate::error::{LdpmError, ValidationError};
use crate::id::ScheduleId;

/// A rule firing `action` against `target` whenever `cron` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub id: ScheduleId,
    pub name: String,
    pub cron: CronSchedule,
    pub action: PowerAction,
    pub target: CommandTarget,
    pub enabled: bool,
}

impl ScheduleRule {
    /// Create a builder for constructing a [`ScheduleRule`].
    #[must_use]
    pub fn builder() -> ScheduleRuleBuilder {
        ScheduleRuleBuilder::default()
    }
}

/// Step-by-step builder for [`ScheduleRule`].
///
/// The cron expression is kept as text until [`build`](Self::build) so that
/// a bad expression surfaces as a validation error there.
#[derive(Debug)]
pub struct ScheduleRuleBuilder {
    id: Option<ScheduleId>,
    name: Option<String>,
    cron: Option<String>,
    action: PowerAction,
    target: Option<CommandTarget>,
    enabled: bool,
}

impl Default for ScheduleRuleBuilder {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            cron: None,
            action: PowerAction::PowerOn,
            target: None,
            enabled: true,
        }
    }
}

impl ScheduleRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn cron(mut self, expression: impl Into<String>) -> Self {
        self.cron = Some(expression.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: PowerAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn target(mut self, target: CommandTarget) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Consume the builder, validate, and return a [`ScheduleRule`].
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - no cron expression was given ([`ValidationError::MissingCron`])
    /// - no target was given ([`ValidationError::MissingTarget`])
    /// - the expression does not parse ([`ValidationError::InvalidCron`])
    pub fn build(self) -> Result<ScheduleRule, LdpmError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let expression = self.cron.ok_or(ValidationError::MissingCron)?;
        let target = self.target.ok_or(ValidationError::MissingTarget)?;
        let cron = CronSchedule::parse(&expression)?;
        Ok(ScheduleRule {
            id: self.id.unwrap_or_default(),
            name,
            cron,
            action: self.action,
            target,
            enabled: self.enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{DeviceId, GroupId};

    #[test]
    fn should_build_enabled_rule_by_default() {
        let rule = ScheduleRule::builder()
            .name("Morning on")
            .cron("0 8 * * 1-5")
            .action(PowerAction::PowerOn)
            .target(CommandTarget::Group(GroupId::new()))
            .build()
            .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.cron.as_str(), "0 8 * * 1-5");
    }

    #[test]
    fn should_return_missing_target_when_target_not_set() {
        let result = ScheduleRule::builder()
            .name("Evening off")
            .cron("0 19 * * *")
            .build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::MissingTarget))
        ));
    }

    #[test]
    fn should_return_missing_cron_when_expression_not_set() {
        let result = ScheduleRule::builder()
            .name("Evening off")
            .target(CommandTarget::Device(DeviceId::new()))
            .build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::MissingCron))
        ));
    }

    #[test]
    fn should_return_invalid_cron_when_expression_malformed() {
        let result = ScheduleRule::builder()
            .name("Broken")
            .cron("0 8-17 * * *")
            .target(CommandTarget::Device(DeviceId::new()))
            .build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::InvalidCron(
                CronError::RangeNotAllowed { field: "hour" }
            )))
        ));
    }

    #[test]
    fn should_return_empty_name_when_name_missing() {
        let result = ScheduleRule::builder()
            .cron("0 8 * * *")
            .target(CommandTarget::Device(DeviceId::new()))
            .build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_roundtrip_rule_through_serde_json() {
        let rule = ScheduleRule::builder()
            .name("Weekend off")
            .cron("0 20 * * SAT,SUN")
            .action(PowerAction::PowerOff)
            .target(CommandTarget::Device(DeviceId::new()))
            .enabled(false)
            .build()
            .unwrap();
        let json = serde_json::to_string(&rule).unwrap();
        let parsed: ScheduleRule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }
}

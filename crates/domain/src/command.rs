//! Command: a power action aimed at one device or one group.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::{CommandId, DeviceId, GroupId};

/// What to do to a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerAction {
    PowerOn,
    PowerOff,
    Query,
}

impl PowerAction {
    /// Whether the action changes the device's power state.
    #[must_use]
    pub fn is_control(self) -> bool {
        !matches!(self, Self::Query)
    }

    /// Desired power flag for control actions, `None` for a query.
    #[must_use]
    pub fn power_flag(self) -> Option<bool> {
        match self {
            Self::PowerOn => Some(true),
            Self::PowerOff => Some(false),
            Self::Query => None,
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PowerOn => f.write_str("power-on"),
            Self::PowerOff => f.write_str("power-off"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// Either a single device or every member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CommandTarget {
    Device(DeviceId),
    Group(GroupId),
}

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    #[default]
    Manual,
    Schedule,
    Api,
}

/// Issuing context shared by every per-device run of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Upper bound on the whole per-device run, measured from its start.
    /// Once spent, no further retries or fallback are attempted.
    pub deadline: Option<Duration>,
    pub idempotency_token: CommandId,
    pub source: CommandSource,
}

impl CommandContext {
    #[must_use]
    pub fn new(source: CommandSource) -> Self {
        Self {
            deadline: None,
            idempotency_token: CommandId::new(),
            source,
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(CommandSource::default())
    }
}

/// A request to run `action` against `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub target: CommandTarget,
    pub action: PowerAction,
    pub context: CommandContext,
}

impl CommandRequest {
    #[must_use]
    pub fn new(target: CommandTarget, action: PowerAction) -> Self {
        Self {
            target,
            action,
            context: CommandContext::default(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: CommandContext) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_action_as_kebab_case() {
        let json = serde_json::to_string(&PowerAction::PowerOn).unwrap();
        assert_eq!(json, "\"power-on\"");
        let parsed: PowerAction = serde_json::from_str("\"power-off\"").unwrap();
        assert_eq!(parsed, PowerAction::PowerOff);
    }

    #[test]
    fn should_expose_power_flag_only_for_control_actions() {
        assert_eq!(PowerAction::PowerOn.power_flag(), Some(true));
        assert_eq!(PowerAction::PowerOff.power_flag(), Some(false));
        assert_eq!(PowerAction::Query.power_flag(), None);
        assert!(!PowerAction::Query.is_control());
    }

    #[test]
    fn should_generate_distinct_idempotency_tokens_per_context() {
        let a = CommandContext::new(CommandSource::Api);
        let b = CommandContext::new(CommandSource::Api);
        assert_ne!(a.idempotency_token, b.idempotency_token);
        assert!(a.deadline.is_none());
    }

    #[test]
    fn should_attach_deadline_when_with_deadline_called() {
        let ctx = CommandContext::default().with_deadline(Duration::from_secs(5));
        assert_eq!(ctx.deadline, Some(Duration::from_secs(5)));
        assert_eq!(ctx.source, CommandSource::Manual);
    }

    #[test]
    fn should_serialize_target_with_type_tag() {
        let id = GroupId::new();
        let json = serde_json::to_value(CommandTarget::Group(id)).unwrap();
        assert_eq!(json["type"], "group");
        assert_eq!(json["id"], id.to_string());
    }
}

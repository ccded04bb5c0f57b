//! Command outcomes: per-device results and bulk aggregates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::PowerAction;
use crate::device::PowerState;
use crate::id::{CommandId, DeviceId};

/// Wire protocol used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Rest,
    SimpleIp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rest => f.write_str("rest"),
            Self::SimpleIp => f.write_str("simple-ip"),
        }
    }
}

/// Failure taxonomy shared by both protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Timeout,
    Network,
    Auth,
    ProtocolUnsupported,
    Device,
}

impl ErrorKind {
    /// Transient failures are retried on the same protocol.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }

    /// Failures that move execution to the secondary protocol.
    #[must_use]
    pub fn triggers_fallback(self) -> bool {
        matches!(self, Self::Timeout | Self::Network | Self::ProtocolUnsupported)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Network => f.write_str("network error"),
            Self::Auth => f.write_str("authentication rejected"),
            Self::ProtocolUnsupported => f.write_str("protocol unsupported"),
            Self::Device => f.write_str("device error"),
        }
    }
}

/// Success or failure of one device run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Succeeded { state: PowerState },
    Failed { error: ErrorKind, message: String },
}

/// The final result of one protocol on one device, after its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAttempt {
    pub protocol: Protocol,
    /// Retries performed on this protocol, not counting the first try.
    pub retries: u32,
    /// `None` when the protocol succeeded.
    pub error: Option<ErrorKind>,
}

/// Outcome of running one action against one device.
///
/// `protocol` always names the protocol that produced the final result, even
/// when fallback happened. The full sequence is kept in `attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Idempotency token of the command this result belongs to.
    pub command_id: CommandId,
    pub device_id: DeviceId,
    pub action: PowerAction,
    pub protocol: Protocol,
    pub outcome: Outcome,
    pub latency: Duration,
    /// Total retries across every protocol tried.
    pub retries: u32,
    pub attempts: Vec<ProtocolAttempt>,
}

impl CommandResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded { .. })
    }

    /// Error kind of a failed result.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed { error, .. } => Some(*error),
        }
    }

    /// Power state reported by a successful result.
    #[must_use]
    pub fn power_state(&self) -> Option<PowerState> {
        match &self.outcome {
            Outcome::Succeeded { state } => Some(*state),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Results of one action fanned out over a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub action: PowerAction,
    /// One entry per device, ordered by device id.
    pub results: Vec<CommandResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkResult {
    /// Sort results by device id and compute the aggregate counts.
    #[must_use]
    pub fn from_results(action: PowerAction, mut results: Vec<CommandResult>) -> Self {
        results.sort_by_key(|r| r.device_id);
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            action,
            results,
            succeeded,
            failed,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(device_id: DeviceId, outcome: Outcome) -> CommandResult {
        CommandResult {
            command_id: CommandId::new(),
            device_id,
            action: PowerAction::PowerOn,
            protocol: Protocol::Rest,
            outcome,
            latency: Duration::from_millis(12),
            retries: 0,
            attempts: vec![],
        }
    }

    #[test]
    fn should_classify_transient_kinds() {
        assert!(ErrorKind::Timeout.is_transient());
        assert!(ErrorKind::Network.is_transient());
        assert!(!ErrorKind::Auth.is_transient());
        assert!(!ErrorKind::ProtocolUnsupported.is_transient());
        assert!(!ErrorKind::Device.is_transient());
    }

    #[test]
    fn should_fall_back_on_unsupported_and_transient_but_not_on_auth() {
        assert!(ErrorKind::ProtocolUnsupported.triggers_fallback());
        assert!(ErrorKind::Timeout.triggers_fallback());
        assert!(ErrorKind::Network.triggers_fallback());
        assert!(!ErrorKind::Auth.triggers_fallback());
        assert!(!ErrorKind::Device.triggers_fallback());
    }

    #[test]
    fn should_order_bulk_results_by_device_id_and_count_outcomes() {
        let low = DeviceId::from_uuid(uuid::Uuid::from_u128(1));
        let high = DeviceId::from_uuid(uuid::Uuid::from_u128(9));
        let bulk = BulkResult::from_results(
            PowerAction::PowerOn,
            vec![
                result(
                    high,
                    Outcome::Failed {
                        error: ErrorKind::Timeout,
                        message: "timed out".to_string(),
                    },
                ),
                result(
                    low,
                    Outcome::Succeeded {
                        state: PowerState::On,
                    },
                ),
            ],
        );
        assert_eq!(bulk.results[0].device_id, low);
        assert_eq!(bulk.results[1].device_id, high);
        assert_eq!(bulk.succeeded, 1);
        assert_eq!(bulk.failed, 1);
        assert_eq!(bulk.total(), 2);
    }

    #[test]
    fn should_expose_error_kind_only_for_failures() {
        let ok = result(
            DeviceId::new(),
            Outcome::Succeeded {
                state: PowerState::Standby,
            },
        );
        assert!(ok.is_success());
        assert_eq!(ok.error_kind(), None);
        assert_eq!(ok.power_state(), Some(PowerState::Standby));

        let failed = result(
            DeviceId::new(),
            Outcome::Failed {
                error: ErrorKind::Auth,
                message: "rejected".to_string(),
            },
        );
        assert_eq!(failed.error_kind(), Some(ErrorKind::Auth));
        assert_eq!(failed.power_state(), None);
    }

    #[test]
    fn should_serialize_outcome_with_status_tag() {
        let json = serde_json::to_value(Outcome::Failed {
            error: ErrorKind::ProtocolUnsupported,
            message: "no such method".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "protocol-unsupported");
    }
}

//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LdpmError`]
//! via `#[from]` (or an explicit `From` impl for boxed storage errors).

use crate::schedule::CronError;

/// Top-level error for every fallible operation exposed by the core.
#[derive(Debug, thiserror::Error)]
pub enum LdpmError {
    /// A domain invariant was violated or a request was malformed.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced device, group or schedule does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An external collaborator (registry, log sink, ...) failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations detected before any IO happens.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device address must not be empty")]
    EmptyAddress,

    #[error("group has no member devices")]
    EmptyGroup,

    #[error("schedule rule has no target")]
    MissingTarget,

    #[error("schedule rule has no cron expression")]
    MissingCron,

    #[error("invalid cron expression")]
    InvalidCron(#[from] CronError),
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record that was looked up (`"Device"`, `"Group"`, ...).
    pub entity: &'static str,
    /// The identifier that was not found.
    pub id: String,
}

impl From<CronError> for LdpmError {
    fn from(err: CronError) -> Self {
        Self::Validation(ValidationError::InvalidCron(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Device abc not found");
    }

    #[test]
    fn should_convert_validation_error_into_ldpm_error() {
        let err: LdpmError = ValidationError::EmptyGroup.into();
        assert!(matches!(
            err,
            LdpmError::Validation(ValidationError::EmptyGroup)
        ));
    }

    #[test]
    fn should_convert_cron_error_into_validation_error() {
        let err: LdpmError = CronError::Empty.into();
        assert!(matches!(
            err,
            LdpmError::Validation(ValidationError::InvalidCron(CronError::Empty))
        ));
    }
}

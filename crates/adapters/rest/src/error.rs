//! REST adapter error types.

use std::time::Duration;

use ldpm_app::ports::ProtocolError;
use ldpm_domain::error::LdpmError;

/// Errors raised while setting the adapter up.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

impl RestError {
    /// Convert into a [`LdpmError::Storage`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> LdpmError {
        LdpmError::Storage(Box::new(self))
    }
}

impl From<RestError> for LdpmError {
    fn from(err: RestError) -> Self {
        err.into_domain()
    }
}

/// Map a transport failure onto the protocol taxonomy.
pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> ProtocolError {
    if err.is_timeout() {
        ProtocolError::Timeout(timeout)
    } else {
        ProtocolError::Network(Box::new(err))
    }
}

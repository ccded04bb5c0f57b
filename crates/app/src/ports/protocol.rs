//! Protocol port: one wire protocol able to run a power action on a device.

use std::future::Future;
use std::time::Duration;

use ldpm_domain::command::PowerAction;
use ldpm_domain::device::PowerState;
use ldpm_domain::outcome::{ErrorKind, Protocol};

/// Failure of a single protocol exchange.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// No complete answer within the allotted time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The connection could not be established or broke mid-exchange.
    #[error("network error")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The device rejected the credential.
    #[error("authentication rejected by device")]
    Auth,

    /// The device does not implement this protocol or method.
    #[error("protocol not supported by device: {0}")]
    Unsupported(String),

    /// Any other non-success answer.
    #[error("device error: {0}")]
    Device(String),
}

impl ProtocolError {
    /// Classify into the serialisable taxonomy carried by results.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Auth => ErrorKind::Auth,
            Self::Unsupported(_) => ErrorKind::ProtocolUnsupported,
            Self::Device(_) => ErrorKind::Device,
        }
    }

    /// Human-readable message including the source chain.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

/// A single wire protocol.
///
/// Implementations perform exactly one exchange per call and never retry;
/// retry and fallback belong to the caller.
pub trait ProtocolClient {
    /// Which protocol this client speaks.
    fn protocol(&self) -> Protocol;

    /// Run `action` against the device at `address`.
    ///
    /// Returns the device's power state after the exchange: the reported
    /// state for a query, the requested state for a control action.
    fn execute(
        &self,
        address: &str,
        credential: Option<&str>,
        action: PowerAction,
        timeout: Duration,
    ) -> impl Future<Output = Result<PowerState, ProtocolError>> + Send;
}

impl<T: ProtocolClient + Send + Sync> ProtocolClient for std::sync::Arc<T> {
    fn protocol(&self) -> Protocol {
        (**self).protocol()
    }

    fn execute(
        &self,
        address: &str,
        credential: Option<&str>,
        action: PowerAction,
        timeout: Duration,
    ) -> impl Future<Output = Result<PowerState, ProtocolError>> + Send {
        (**self).execute(address, credential, action, timeout)
    }
}

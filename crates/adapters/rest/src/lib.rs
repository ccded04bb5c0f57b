//! # ldpm-adapter-rest
//!
//! REST protocol client: JSON-RPC calls posted to each device's system
//! endpoint. Implements [`ProtocolClient`] so the device adapter can use it
//! as the primary protocol.
//!
//! The pre-shared key, when the device has one, travels in the `X-Auth-PSK`
//! header. A device without a credential is still contacted.

pub mod config;
pub mod error;
pub mod rpc;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use ldpm_app::ports::{ProtocolClient, ProtocolError};
use ldpm_domain::command::PowerAction;
use ldpm_domain::device::PowerState;
use ldpm_domain::outcome::Protocol;

pub use config::RestConfig;
pub use error::RestError;

use crate::error::classify;
use crate::rpc::RpcRequest;

/// Header carrying the pre-shared key.
pub const PSK_HEADER: &str = "X-Auth-PSK";

/// JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct RestProtocolClient {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestProtocolClient {
    /// Create a client for the given endpoint layout.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Client`] if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(RestError::Client)?;
        Ok(Self { client, config })
    }

    /// Full endpoint URL for a device address.
    ///
    /// An address that already names a port is used as is; otherwise the
    /// configured port is appended.
    #[must_use]
    pub fn endpoint(&self, address: &str) -> String {
        let authority = if address.parse::<SocketAddr>().is_ok() {
            address.to_string()
        } else if let Ok(ip) = address.parse::<IpAddr>() {
            SocketAddr::new(ip, self.config.port).to_string()
        } else if address.contains(':') {
            address.to_string()
        } else {
            format!("{address}:{}", self.config.port)
        };
        format!("http://{authority}{}", self.config.path)
    }
}

impl ProtocolClient for RestProtocolClient {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    #[tracing::instrument(skip(self, credential))]
    async fn execute(
        &self,
        address: &str,
        credential: Option<&str>,
        action: PowerAction,
        timeout: Duration,
    ) -> Result<PowerState, ProtocolError> {
        let url = self.endpoint(address);
        let mut request = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&RpcRequest::for_action(action));
        if let Some(psk) = credential {
            request = request.header(PSK_HEADER, psk);
        }

        let response = request
            .send()
            .await
            .map_err(|err| classify(err, timeout))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| classify(err, timeout))?;

        tracing::debug!(status, "device replied");
        rpc::interpret(action, status, &body)
    }
}

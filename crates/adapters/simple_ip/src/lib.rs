//! # ldpm-adapter-simple-ip
//!
//! Simple IP protocol client: one fixed-size frame over a fresh TCP
//! connection per exchange. Used as the fallback protocol.
//!
//! The channel has no authentication; any credential is ignored.

pub mod config;
pub mod error;
pub mod frame;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use ldpm_app::ports::{ProtocolClient, ProtocolError};
use ldpm_domain::command::PowerAction;
use ldpm_domain::device::PowerState;
use ldpm_domain::outcome::Protocol;

pub use config::SimpleIpConfig;
pub use error::FrameError;

use crate::error::network;
use crate::frame::{FRAME_LEN, Frame, MessageKind, POWER};

/// Raw TCP control channel.
#[derive(Debug, Clone, Default)]
pub struct SimpleIpProtocolClient {
    config: SimpleIpConfig,
}

impl SimpleIpProtocolClient {
    #[must_use]
    pub fn new(config: SimpleIpConfig) -> Self {
        Self { config }
    }

    /// `host:port` to connect to; an address naming a port keeps it.
    #[must_use]
    pub fn target(&self, address: &str) -> String {
        if address.parse::<SocketAddr>().is_ok() {
            address.to_string()
        } else if let Ok(ip) = address.parse::<IpAddr>() {
            SocketAddr::new(ip, self.config.port).to_string()
        } else if address.contains(':') {
            address.to_string()
        } else {
            format!("{address}:{}", self.config.port)
        }
    }

    async fn exchange(&self, target: &str, action: PowerAction) -> Result<PowerState, ProtocolError> {
        let request = match action.power_flag() {
            Some(on) => Frame::power_control(on),
            None => Frame::power_enquiry(),
        };

        let mut stream = TcpStream::connect(target).await.map_err(network)?;
        stream.write_all(&request.encode()).await.map_err(network)?;

        let mut buf = [0u8; FRAME_LEN];
        loop {
            stream.read_exact(&mut buf).await.map_err(network)?;
            let reply = Frame::decode(&buf)?;
            match reply.kind {
                MessageKind::Notify => {
                    tracing::debug!(parameter = %reply.parameter_text(), "skipping notify frame");
                }
                MessageKind::Answer if reply.function == POWER => {
                    return interpret(action, &reply);
                }
                _ => {
                    return Err(ProtocolError::Device(format!(
                        "unexpected reply {:?} {}",
                        reply.kind,
                        String::from_utf8_lossy(&reply.function)
                    )));
                }
            }
        }
    }
}

fn interpret(action: PowerAction, reply: &Frame) -> Result<PowerState, ProtocolError> {
    if reply.is_error() {
        return Err(ProtocolError::Device(format!(
            "device rejected request: {}",
            reply.parameter_text().trim_end_matches('\0')
        )));
    }
    match action.power_flag() {
        Some(true) => Ok(PowerState::On),
        Some(false) => Ok(PowerState::Standby),
        None => match reply.power_flag() {
            Some(true) => Ok(PowerState::On),
            Some(false) => Ok(PowerState::Standby),
            None => Err(ProtocolError::Device(format!(
                "unreadable power status {}",
                reply.parameter_text()
            ))),
        },
    }
}

impl ProtocolClient for SimpleIpProtocolClient {
    fn protocol(&self) -> Protocol {
        Protocol::SimpleIp
    }

    #[tracing::instrument(skip(self, _credential))]
    async fn execute(
        &self,
        address: &str,
        _credential: Option<&str>,
        action: PowerAction,
        timeout: Duration,
    ) -> Result<PowerState, ProtocolError> {
        let target = self.target(address);
        tokio::time::timeout(timeout, self.exchange(&target, action))
            .await
            .map_err(|_| ProtocolError::Timeout(timeout))?
    }
}

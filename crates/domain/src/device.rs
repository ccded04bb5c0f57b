//! Device: a networked display reachable at a single address.

mod power_state;

pub use power_state::PowerState;

use serde::{Deserialize, Serialize};

use crate::error::{LdpmError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// A controllable display unit addressed by network location.
///
/// Identity, address and credential are owned by the external registry. The
/// `status` is the core's last-known view and is refreshed after polls and
/// commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Host name or IP address, optionally with an explicit port.
    pub address: String,
    pub credential: Option<Credential>,
    #[serde(default)]
    pub status: DeviceStatus,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `address` is empty ([`ValidationError::EmptyAddress`])
    pub fn validate(&self) -> Result<(), LdpmError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }
        Ok(())
    }

    /// The shared secret as a plain string, if one is configured.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_ref().map(Credential::expose)
    }
}

/// Last-known power state plus the time of the last successful contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub power_state: PowerState,
    pub last_contact: Option<Timestamp>,
}

/// Pre-shared key sent to devices that require authenticated control.
///
/// The value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, returning `None` for an empty or blank value.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Access the raw secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    address: Option<String>,
    credential: Option<Credential>,
    status: DeviceStatus,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the pre-shared key. Blank secrets are treated as "no credential".
    #[must_use]
    pub fn credential(mut self, secret: impl Into<String>) -> Self {
        self.credential = Credential::new(secret);
        self
    }

    #[must_use]
    pub fn power_state(mut self, state: PowerState) -> Self {
        self.status.power_state = state;
        self
    }

    #[must_use]
    pub fn last_contact(mut self, ts: Timestamp) -> Self {
        self.status.last_contact = Some(ts);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::Validation`] if `name` or `address` is missing or empty.
    pub fn build(self) -> Result<Device, LdpmError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            credential: self.credential,
            status: self.status,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_device_when_name_and_address_provided() {
        let device = Device::builder()
            .name("Lobby")
            .address("192.168.1.20")
            .build()
            .unwrap();
        assert_eq!(device.name, "Lobby");
        assert_eq!(device.address, "192.168.1.20");
        assert!(device.credential.is_none());
        assert_eq!(device.status.power_state, PowerState::Unknown);
        assert!(device.status.last_contact.is_none());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Device::builder().address("10.0.0.1").build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_address_is_blank() {
        let result = Device::builder().name("Lobby").address("  ").build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::EmptyAddress))
        ));
    }

    #[test]
    fn should_treat_blank_credential_as_absent() {
        let device = Device::builder()
            .name("Lobby")
            .address("10.0.0.1")
            .credential("")
            .build()
            .unwrap();
        assert!(device.credential().is_none());
    }

    #[test]
    fn should_expose_credential_when_set() {
        let device = Device::builder()
            .name("Lobby")
            .address("10.0.0.1")
            .credential("0000")
            .build()
            .unwrap();
        assert_eq!(device.credential(), Some("0000"));
    }

    #[test]
    fn should_redact_credential_in_debug_output() {
        let device = Device::builder()
            .name("Lobby")
            .address("10.0.0.1")
            .credential("super-secret")
            .build()
            .unwrap();
        let debug = format!("{device:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("Credential(***)"));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let device = Device::builder()
            .name("Lobby")
            .address("10.0.0.1")
            .credential("psk")
            .power_state(PowerState::Standby)
            .build()
            .unwrap();
        let json = serde_json::to_string(&device).unwrap();
        let parsed: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, device.id);
        assert_eq!(parsed.credential(), Some("psk"));
        assert_eq!(parsed.status.power_state, PowerState::Standby);
    }
}

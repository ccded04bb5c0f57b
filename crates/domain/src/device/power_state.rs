//! Power state: the last known operational state of a display.

use serde::{Deserialize, Serialize};

/// Discrete power state of a device as last observed by the core.
///
/// Devices answering the REST protocol report `"active"` for a powered
/// display, so that spelling is accepted as an alias of [`On`](Self::On).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    #[serde(alias = "active")]
    On,
    Standby,
    Offline,
    #[default]
    Unknown,
}

impl PowerState {
    /// Whether the device answered its last contact.
    #[must_use]
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::On | Self::Standby)
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Standby => f.write_str("standby"),
            Self::Offline => f.write_str("offline"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

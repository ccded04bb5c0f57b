//! Events emitted when the core observes a device changing state.

use serde::{Deserialize, Serialize};

use crate::device::PowerState;
use crate::id::DeviceId;
use crate::time::Timestamp;

/// A last-known power state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub device_id: DeviceId,
    pub from: PowerState,
    pub to: PowerState,
    pub at: Timestamp,
}

/// Everything published on the device event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    StateChanged(StateChange),
}

impl DeviceEvent {
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::StateChanged(change) => change.device_id,
        }
    }
}

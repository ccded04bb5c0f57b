//! Status tracker: the last-known power state cache.
//!
//! Writes for one device are serialised through a per-device async mutex, so
//! a poll and a command finishing at the same time cannot interleave their
//! registry updates. Different devices never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ldpm_domain::device::{Device, DeviceStatus, PowerState};
use ldpm_domain::error::LdpmError;
use ldpm_domain::event::{DeviceEvent, StateChange};
use ldpm_domain::id::DeviceId;
use ldpm_domain::time::Timestamp;

use crate::ports::{DeviceRegistry, EventPublisher};

type Slot = Arc<tokio::sync::Mutex<DeviceStatus>>;

/// Keeps the core's view of each device and writes changes back to the
/// registry.
pub struct StatusTracker<R, P> {
    registry: R,
    publisher: P,
    slots: Mutex<HashMap<DeviceId, Slot>>,
}

impl<R, P> StatusTracker<R, P>
where
    R: DeviceRegistry,
    P: EventPublisher,
{
    /// Create a tracker writing through `registry` and announcing on `publisher`.
    pub fn new(registry: R, publisher: P) -> Self {
        Self {
            registry,
            publisher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, device: &Device) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(device.id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(device.status)))
            .clone()
    }

    /// Last-known status, if the device has been seen.
    pub async fn status(&self, id: DeviceId) -> Option<DeviceStatus> {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()?;
        let status = *slot.lock().await;
        Some(status)
    }

    /// Record a successful exchange reporting `state`.
    ///
    /// Always refreshes the last-contact time. Returns the transition when
    /// the state differs from the cached one.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the update.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn record_contact(
        &self,
        device: &Device,
        state: PowerState,
        at: Timestamp,
    ) -> Result<Option<StateChange>, LdpmError> {
        let slot = self.slot(device);
        let mut status = slot.lock().await;
        let previous = status.power_state;
        let next = DeviceStatus {
            power_state: state,
            last_contact: Some(at),
        };
        self.registry.update_status(device.id, next).await?;
        *status = next;
        Ok(self.announce(device.id, previous, state, at).await)
    }

    /// Record that the device could not be reached.
    ///
    /// Only writes when the device was not already offline. The last-contact
    /// time is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the update.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn record_unreachable(
        &self,
        device: &Device,
        at: Timestamp,
    ) -> Result<Option<StateChange>, LdpmError> {
        let slot = self.slot(device);
        let mut status = slot.lock().await;
        let previous = status.power_state;
        if previous == PowerState::Offline {
            return Ok(None);
        }
        let next = DeviceStatus {
            power_state: PowerState::Offline,
            last_contact: status.last_contact,
        };
        self.registry.update_status(device.id, next).await?;
        *status = next;
        Ok(self
            .announce(device.id, previous, PowerState::Offline, at)
            .await)
    }

    async fn announce(
        &self,
        device_id: DeviceId,
        from: PowerState,
        to: PowerState,
        at: Timestamp,
    ) -> Option<StateChange> {
        if from == to {
            return None;
        }
        let change = StateChange {
            device_id,
            from,
            to,
            at,
        };
        tracing::info!(%device_id, %from, %to, "device state changed");
        if let Err(err) = self
            .publisher
            .publish(DeviceEvent::StateChanged(change))
            .await
        {
            tracing::warn!(%device_id, error = %err, "failed to publish state change");
        }
        Some(change)
    }
}

//! In-memory implementation of [`DeviceRegistry`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::RwLock;

use ldpm_app::ports::DeviceRegistry;
use ldpm_domain::device::{Device, DeviceStatus};
use ldpm_domain::error::{LdpmError, NotFoundError};
use ldpm_domain::group::Group;
use ldpm_domain::id::{DeviceId, GroupId};

use crate::recover;

#[derive(Debug, Default)]
struct Inventory {
    devices: BTreeMap<DeviceId, Device>,
    groups: BTreeMap<GroupId, Group>,
}

/// Device and group records held in process memory.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: RwLock<Inventory>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a full inventory.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid device or group, or
    /// [`NotFoundError`] when a group lists a device that is not part of
    /// `devices`.
    pub fn from_inventory(devices: Vec<Device>, groups: Vec<Group>) -> Result<Self, LdpmError> {
        let registry = Self::new();
        for device in devices {
            registry.insert_device(device)?;
        }
        for group in groups {
            registry.insert_group(group)?;
        }
        Ok(registry)
    }

    /// Add or replace a device.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the device has no name or address.
    pub fn insert_device(&self, device: Device) -> Result<(), LdpmError> {
        device.validate()?;
        recover(self.inner.write()).devices.insert(device.id, device);
        Ok(())
    }

    /// Add or replace a group. Every member must already be registered.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unnamed group or [`NotFoundError`]
    /// for an unknown member.
    pub fn insert_group(&self, group: Group) -> Result<(), LdpmError> {
        group.validate()?;
        let mut inner = recover(self.inner.write());
        if let Some(missing) = group.members.iter().find(|id| !inner.devices.contains_key(id)) {
            return Err(NotFoundError {
                entity: "Device",
                id: missing.to_string(),
            }
            .into());
        }
        inner.groups.insert(group.id, group);
        Ok(())
    }

    /// Every group, ordered by id.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        recover(self.inner.read()).groups.values().cloned().collect()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn get_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LdpmError>> + Send {
        let result = recover(self.inner.read()).devices.get(&id).cloned();
        async move { Ok(result) }
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, LdpmError>> + Send {
        let result = recover(self.inner.read())
            .devices
            .values()
            .cloned()
            .collect();
        async move { Ok(result) }
    }

    fn group_members(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Vec<Device>>, LdpmError>> + Send {
        let inner = recover(self.inner.read());
        let result = inner.groups.get(&id).map(|group| {
            group
                .members
                .iter()
                .filter_map(|member| inner.devices.get(member).cloned())
                .collect()
        });
        drop(inner);
        async move { Ok(result) }
    }

    fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        let result = match recover(self.inner.write()).devices.get_mut(&id) {
            Some(device) => {
                tracing::trace!(device_id = %id, state = %status.power_state, "status stored");
                device.status = status;
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()),
        };
        async move { result }
    }
}

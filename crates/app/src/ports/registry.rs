//! Registry port: the external owner of device and group records.

use std::future::Future;

use ldpm_domain::device::{Device, DeviceStatus};
use ldpm_domain::error::LdpmError;
use ldpm_domain::id::{DeviceId, GroupId};

/// Read access to devices and groups, plus write-back of observed status.
pub trait DeviceRegistry {
    /// Look up one device.
    fn get_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LdpmError>> + Send;

    /// Every known device.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, LdpmError>> + Send;

    /// Snapshot of a group's member devices, `None` if the group is unknown.
    ///
    /// Members that no longer exist as devices are left out.
    fn group_members(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Vec<Device>>, LdpmError>> + Send;

    /// Store the last-known status observed by the core.
    fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send;
}

impl<T: DeviceRegistry + Send + Sync> DeviceRegistry for std::sync::Arc<T> {
    fn get_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LdpmError>> + Send {
        (**self).get_device(id)
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, LdpmError>> + Send {
        (**self).list_devices()
    }

    fn group_members(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Vec<Device>>, LdpmError>> + Send {
        (**self).group_members(id)
    }

    fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        (**self).update_status(id, status)
    }
}

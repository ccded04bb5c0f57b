//! Static inventory: turns the configured devices, groups and schedules
//! into domain records.
//!
//! Configuration refers to devices and groups by name; names must therefore
//! be unique within their kind.

use std::collections::HashMap;

use ldpm_domain::command::CommandTarget;
use ldpm_domain::device::Device;
use ldpm_domain::error::LdpmError;
use ldpm_domain::group::Group;
use ldpm_domain::id::{DeviceId, GroupId};
use ldpm_domain::schedule::ScheduleRule;

use crate::config::{Config, DeviceEntry, GroupEntry, ScheduleEntry};

/// Domain records built from configuration.
#[derive(Debug, Default)]
pub struct Inventory {
    pub devices: Vec<Device>,
    pub groups: Vec<Group>,
    pub schedules: Vec<ScheduleRule>,
}

/// Inventory errors, naming the offending entry.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("device name {0:?} is used more than once")]
    DuplicateDevice(String),

    #[error("group name {0:?} is used more than once")]
    DuplicateGroup(String),

    #[error("group {group:?} lists unknown device {device:?}")]
    UnknownMember { group: String, device: String },

    #[error("schedule {schedule:?} targets unknown {kind} {name:?}")]
    UnknownTarget {
        schedule: String,
        kind: &'static str,
        name: String,
    },

    #[error("schedule {0:?} must target exactly one device or group")]
    AmbiguousTarget(String),

    #[error("invalid entry {name:?}")]
    Invalid {
        name: String,
        #[source]
        source: LdpmError,
    },
}

impl Inventory {
    /// Build every record, resolving names to ids.
    ///
    /// # Errors
    ///
    /// Returns the first [`InventoryError`] encountered.
    pub fn from_config(config: &Config) -> Result<Self, InventoryError> {
        let mut device_ids: HashMap<&str, DeviceId> = HashMap::new();
        let mut devices = Vec::with_capacity(config.devices.len());
        for entry in &config.devices {
            let device = build_device(entry)?;
            if device_ids.insert(&entry.name, device.id).is_some() {
                return Err(InventoryError::DuplicateDevice(entry.name.clone()));
            }
            devices.push(device);
        }

        let mut group_ids: HashMap<&str, GroupId> = HashMap::new();
        let mut groups = Vec::with_capacity(config.groups.len());
        for entry in &config.groups {
            let group = build_group(entry, &device_ids)?;
            if group_ids.insert(&entry.name, group.id).is_some() {
                return Err(InventoryError::DuplicateGroup(entry.name.clone()));
            }
            groups.push(group);
        }

        let schedules = config
            .schedules
            .iter()
            .map(|entry| build_schedule(entry, &device_ids, &group_ids))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            devices,
            groups,
            schedules,
        })
    }
}

fn invalid(name: &str) -> impl FnOnce(LdpmError) -> InventoryError + '_ {
    move |source| InventoryError::Invalid {
        name: name.to_string(),
        source,
    }
}

fn build_device(entry: &DeviceEntry) -> Result<Device, InventoryError> {
    let mut builder = Device::builder()
        .name(&entry.name)
        .address(&entry.address);
    if let Some(id) = entry.id {
        builder = builder.id(id);
    }
    if let Some(credential) = &entry.credential {
        builder = builder.credential(credential.expose());
    }
    builder.build().map_err(invalid(&entry.name))
}

fn build_group(
    entry: &GroupEntry,
    device_ids: &HashMap<&str, DeviceId>,
) -> Result<Group, InventoryError> {
    let mut builder = Group::builder().name(&entry.name);
    if let Some(id) = entry.id {
        builder = builder.id(id);
    }
    for member in &entry.members {
        let id = device_ids
            .get(member.as_str())
            .ok_or_else(|| InventoryError::UnknownMember {
                group: entry.name.clone(),
                device: member.clone(),
            })?;
        builder = builder.member(*id);
    }
    builder.build().map_err(invalid(&entry.name))
}

fn build_schedule(
    entry: &ScheduleEntry,
    device_ids: &HashMap<&str, DeviceId>,
    group_ids: &HashMap<&str, GroupId>,
) -> Result<ScheduleRule, InventoryError> {
    let unknown = |kind, name: &str| InventoryError::UnknownTarget {
        schedule: entry.name.clone(),
        kind,
        name: name.to_string(),
    };
    let target = match (&entry.device, &entry.group) {
        (Some(device), None) => device_ids
            .get(device.as_str())
            .map(|id| CommandTarget::Device(*id))
            .ok_or_else(|| unknown("device", device.as_str()))?,
        (None, Some(group)) => group_ids
            .get(group.as_str())
            .map(|id| CommandTarget::Group(*id))
            .ok_or_else(|| unknown("group", group.as_str()))?,
        _ => return Err(InventoryError::AmbiguousTarget(entry.name.clone())),
    };

    let mut builder = ScheduleRule::builder()
        .name(&entry.name)
        .cron(&entry.cron)
        .action(entry.action)
        .target(target)
        .enabled(entry.enabled);
    if let Some(id) = entry.id {
        builder = builder.id(id);
    }
    builder.build().map_err(invalid(&entry.name))
}

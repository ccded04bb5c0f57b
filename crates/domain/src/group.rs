//! Group: a named set of devices targeted together by one command.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{LdpmError, ValidationError};
use crate::id::{DeviceId, GroupId};

/// A named collection of devices. Membership order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: BTreeSet<DeviceId>,
}

impl Group {
    /// Create a builder for constructing a [`Group`].
    #[must_use]
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), LdpmError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, device_id: DeviceId) -> bool {
        self.members.contains(&device_id)
    }
}

/// Step-by-step builder for [`Group`].
#[derive(Debug, Default)]
pub struct GroupBuilder {
    id: Option<GroupId>,
    name: Option<String>,
    members: BTreeSet<DeviceId>,
}

impl GroupBuilder {
    #[must_use]
    pub fn id(mut self, id: GroupId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn member(mut self, device_id: DeviceId) -> Self {
        self.members.insert(device_id);
        self
    }

    #[must_use]
    pub fn members(mut self, device_ids: impl IntoIterator<Item = DeviceId>) -> Self {
        self.members.extend(device_ids);
        self
    }

    /// Consume the builder, validate, and return a [`Group`].
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Group, LdpmError> {
        let group = Group {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            members: self.members,
        };
        group.validate()?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_group_with_deduplicated_members() {
        let a = DeviceId::new();
        let b = DeviceId::new();
        let group = Group::builder()
            .name("Conference rooms")
            .member(a)
            .member(b)
            .member(a)
            .build()
            .unwrap();
        assert_eq!(group.members.len(), 2);
        assert!(group.contains(a));
        assert!(group.contains(b));
    }

    #[test]
    fn should_allow_empty_membership_at_construction() {
        let group = Group::builder().name("Lobbies").build().unwrap();
        assert!(group.members.is_empty());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Group::builder().member(DeviceId::new()).build();
        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::EmptyName))
        ));
    }
}

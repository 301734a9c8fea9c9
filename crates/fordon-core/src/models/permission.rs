//! Permission matrix domain model.
//!
//! One permission row per (role, resource) pair, holding four CRUD flags
//! plus a per-subresource flag bundle keyed by subresource route.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FordonError;

/// A CRUD action requested against a resource or subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = FordonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(FordonError::Validation {
                message: format!("unknown action: {other}"),
            }),
        }
    }
}

/// The four CRUD flags of a permission row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudFlags {
    pub can_read: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl CrudFlags {
    /// All four flags granted (system role provisioning default).
    pub fn all_true() -> Self {
        Self {
            can_read: true,
            can_create: true,
            can_update: true,
            can_delete: true,
        }
    }

    /// All four flags denied (custom role provisioning default).
    pub fn all_false() -> Self {
        Self::default()
    }

    /// Returns whether the given action is allowed by these flags.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.can_read,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}

/// CRUD flags for one subresource, keyed by its route within the parent
/// resource. Routes absent from a permission row render as all-false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubresourcePermission {
    pub route: String,
    pub flags: CrudFlags,
}

/// The CRUD flags (plus subresource flags) for one (role, resource) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub resource_id: Uuid,
    pub flags: CrudFlags,
    pub subresource_permissions: Vec<SubresourcePermission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create or upsert a permission row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub role_id: Uuid,
    pub resource_id: Uuid,
    pub flags: CrudFlags,
    pub subresource_permissions: Vec<SubresourcePermission>,
}

/// A permission row seeded during role provisioning, before the role id
/// exists. Provisioning calls attach the generated role id via
/// [`PermissionSeed::into_create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSeed {
    pub resource_id: Uuid,
    pub flags: CrudFlags,
    pub subresource_permissions: Vec<SubresourcePermission>,
}

impl PermissionSeed {
    pub fn into_create(self, role_id: Uuid) -> CreatePermission {
        CreatePermission {
            role_id,
            resource_id: self.resource_id,
            flags: self.flags,
            subresource_permissions: self.subresource_permissions,
        }
    }
}

/// Derives the permission record id for a (role, resource) pair.
///
/// The id is a UUIDv5 of the resource id under the role id namespace, so
/// two rows for the same pair collapse into one record at the storage
/// layer; a unique index on (role_id, resource_id) backs this up.
pub fn permission_record_id(role_id: Uuid, resource_id: Uuid) -> Uuid {
    Uuid::new_v5(&role_id, resource_id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_allow_exactly_the_set_actions() {
        let flags = CrudFlags {
            can_read: true,
            can_update: true,
            ..Default::default()
        };
        assert!(flags.allows(Action::Read));
        assert!(!flags.allows(Action::Create));
        assert!(flags.allows(Action::Update));
        assert!(!flags.allows(Action::Delete));
    }

    #[test]
    fn action_round_trips_through_strings() {
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("drop".parse::<Action>().is_err());
    }

    #[test]
    fn permission_record_id_is_deterministic_per_pair() {
        let role = Uuid::new_v4();
        let res_a = Uuid::new_v4();
        let res_b = Uuid::new_v4();

        assert_eq!(
            permission_record_id(role, res_a),
            permission_record_id(role, res_a)
        );
        assert_ne!(
            permission_record_id(role, res_a),
            permission_record_id(role, res_b)
        );
    }
}

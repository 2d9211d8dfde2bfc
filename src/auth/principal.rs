//! Principal, role and permission records plus the directory capability.
//!
//! The evaluator never talks to the database. It sees a [`Principal`] and an
//! [`AccessDirectory`] — a lookup capability over role and permission records
//! that the storage layer rebuilds fresh for every evaluation. Keeping the
//! seam here means the evaluator is pure and the persistence technology can
//! change without touching authorization logic.

use std::collections::{BTreeSet, HashMap};

/// An actor being evaluated for access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Role assignments; order carries no meaning.
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: i64,
    pub code: String,
    pub is_active: bool,
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: i64,
    pub code: String,
    pub is_active: bool,
}

/// Lookup capability over the role/permission directory.
pub trait AccessDirectory {
    fn role(&self, id: i64) -> Option<&Role>;
    fn permission(&self, id: i64) -> Option<&Permission>;
    /// The full catalog of active permission codes (superuser listing).
    fn active_permission_codes(&self) -> BTreeSet<String>;
}

/// In-memory directory snapshot, built per evaluation by the storage layer.
#[derive(Debug, Default, Clone)]
pub struct AccessSnapshot {
    roles: HashMap<i64, Role>,
    permissions: HashMap<i64, Permission>,
}

impl AccessSnapshot {
    #[must_use]
    pub fn new(roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        Self {
            roles: roles.into_iter().map(|role| (role.id, role)).collect(),
            permissions: permissions
                .into_iter()
                .map(|permission| (permission.id, permission))
                .collect(),
        }
    }
}

impl AccessDirectory for AccessSnapshot {
    fn role(&self, id: i64) -> Option<&Role> {
        self.roles.get(&id)
    }

    fn permission(&self, id: i64) -> Option<&Permission> {
        self.permissions.get(&id)
    }

    fn active_permission_codes(&self) -> BTreeSet<String> {
        self.permissions
            .values()
            .filter(|permission| permission.is_active)
            .map(|permission| permission.code.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lookups_by_id() {
        let snapshot = AccessSnapshot::new(
            vec![Role {
                id: 1,
                code: "editor".to_string(),
                is_active: true,
                permission_ids: vec![10],
            }],
            vec![Permission {
                id: 10,
                code: "quotes.edit".to_string(),
                is_active: true,
            }],
        );
        assert_eq!(snapshot.role(1).map(|role| role.code.as_str()), Some("editor"));
        assert!(snapshot.role(2).is_none());
        assert_eq!(
            snapshot.permission(10).map(|p| p.code.as_str()),
            Some("quotes.edit")
        );
    }

    #[test]
    fn active_catalog_excludes_inactive_permissions() {
        let snapshot = AccessSnapshot::new(
            Vec::new(),
            vec![
                Permission {
                    id: 1,
                    code: "a".to_string(),
                    is_active: true,
                },
                Permission {
                    id: 2,
                    code: "b".to_string(),
                    is_active: false,
                },
            ],
        );
        let catalog = snapshot.active_permission_codes();
        assert!(catalog.contains("a"));
        assert!(!catalog.contains("b"));
    }
}

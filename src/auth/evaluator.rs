//! Authorization queries over a principal and a directory snapshot.
//!
//! Every path starts with the superuser bypass, then derives the effective
//! sets from active roles and active permissions only. Nothing is cached:
//! the caller supplies a fresh directory per check, so assignment changes
//! are visible immediately.

use std::collections::BTreeSet;

use super::AccessError;
use super::principal::{AccessDirectory, Principal};

/// Role codes a superuser reports instead of their actual assignments.
const SUPERUSER_ROLE_SENTINEL: &str = "superuser";

/// Union of permission codes granted through the principal's active roles,
/// filtered to active permissions.
fn derived_permission_codes(
    principal: &Principal,
    directory: &impl AccessDirectory,
) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    for role_id in &principal.role_ids {
        let Some(role) = directory.role(*role_id) else {
            continue;
        };
        if !role.is_active {
            continue;
        }
        for permission_id in &role.permission_ids {
            if let Some(permission) = directory.permission(*permission_id)
                && permission.is_active
            {
                codes.insert(permission.code.clone());
            }
        }
    }
    codes
}

fn active_role_codes(principal: &Principal, directory: &impl AccessDirectory) -> BTreeSet<String> {
    principal
        .role_ids
        .iter()
        .filter_map(|role_id| directory.role(*role_id))
        .filter(|role| role.is_active)
        .map(|role| role.code.clone())
        .collect()
}

#[must_use]
pub fn has_permission(
    principal: &Principal,
    directory: &impl AccessDirectory,
    code: &str,
) -> bool {
    if principal.is_superuser {
        return true;
    }
    derived_permission_codes(principal, directory).contains(code)
}

#[must_use]
pub fn has_any_permission(
    principal: &Principal,
    directory: &impl AccessDirectory,
    codes: &[String],
) -> bool {
    if principal.is_superuser {
        return true;
    }
    let granted = derived_permission_codes(principal, directory);
    codes.iter().any(|code| granted.contains(code))
}

#[must_use]
pub fn has_role(principal: &Principal, directory: &impl AccessDirectory, role_code: &str) -> bool {
    if principal.is_superuser {
        return true;
    }
    active_role_codes(principal, directory).contains(role_code)
}

#[must_use]
pub fn has_any_role(
    principal: &Principal,
    directory: &impl AccessDirectory,
    role_codes: &[String],
) -> bool {
    if principal.is_superuser {
        return true;
    }
    let held = active_role_codes(principal, directory);
    role_codes.iter().any(|code| held.contains(code))
}

/// Effective permission codes. A superuser gets the full active catalog.
#[must_use]
pub fn list_permissions(
    principal: &Principal,
    directory: &impl AccessDirectory,
) -> BTreeSet<String> {
    if principal.is_superuser {
        return directory.active_permission_codes();
    }
    derived_permission_codes(principal, directory)
}

/// Active role codes, or the `superuser` sentinel for superusers.
#[must_use]
pub fn list_roles(principal: &Principal, directory: &impl AccessDirectory) -> BTreeSet<String> {
    if principal.is_superuser {
        return BTreeSet::from([SUPERUSER_ROLE_SENTINEL.to_string()]);
    }
    active_role_codes(principal, directory)
}

/// Gate form of [`has_permission`].
///
/// # Errors
/// `Forbidden` names the single permission that was required, nothing more.
pub fn require_permission(
    principal: &Principal,
    directory: &impl AccessDirectory,
    code: &str,
) -> Result<(), AccessError> {
    if has_permission(principal, directory, code) {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            requirement: format!("permission {code}"),
        })
    }
}

/// Gate form of [`has_role`].
///
/// # Errors
/// `Forbidden` names the single role that was required.
pub fn require_role(
    principal: &Principal,
    directory: &impl AccessDirectory,
    role_code: &str,
) -> Result<(), AccessError> {
    if has_role(principal, directory, role_code) {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            requirement: format!("role {role_code}"),
        })
    }
}

//! Database helpers for login and authorization lookups.
//!
//! Every evaluation gets a fresh [`AccessSnapshot`]; nothing here caches, so
//! role or permission changes are visible on the next request.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};

use crate::auth::principal::{AccessSnapshot, Permission, Principal, Role};

/// Minimal fields needed to authenticate a login request.
pub struct LoginRecord {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Look up login data by normalized username.
pub async fn lookup_login_record(pool: &PgPool, username: &str) -> Result<Option<LoginRecord>> {
    let query = "SELECT id, username, password, is_active, is_staff, is_superuser \
                 FROM users WHERE username = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    Ok(row.map(|row| LoginRecord {
        user_id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
    }))
}

/// Load a principal with their role assignments, or `None` if unknown.
pub async fn load_principal(pool: &PgPool, user_id: i64) -> Result<Option<Principal>> {
    let query = "SELECT id, is_active, is_staff, is_superuser FROM users WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to load principal")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let roles_query = "SELECT role_id FROM user_roles WHERE user_id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = roles_query
    );
    let role_rows = sqlx::query(roles_query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to load role assignments")?;

    Ok(Some(Principal {
        id: row.get("id"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        role_ids: role_rows.iter().map(|row| row.get("role_id")).collect(),
    }))
}

/// Build a fresh directory snapshot from the role and permission tables.
pub async fn load_snapshot(pool: &PgPool) -> Result<AccessSnapshot> {
    let roles_query = "SELECT r.id, r.code, r.is_active, \
                       COALESCE(ARRAY_AGG(rp.permission_id) \
                           FILTER (WHERE rp.permission_id IS NOT NULL), '{}') AS permission_ids \
                       FROM roles r \
                       LEFT JOIN role_permissions rp ON rp.role_id = r.id \
                       GROUP BY r.id, r.code, r.is_active";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = roles_query
    );
    let role_rows = sqlx::query(roles_query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to load roles")?;

    let roles = role_rows
        .iter()
        .map(|row| Role {
            id: row.get("id"),
            code: row.get("code"),
            is_active: row.get("is_active"),
            permission_ids: row.get::<Vec<i64>, _>("permission_ids"),
        })
        .collect();

    let permissions_query = "SELECT id, code, is_active FROM permissions";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = permissions_query
    );
    let permission_rows = sqlx::query(permissions_query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to load permissions")?;

    let permissions = permission_rows
        .iter()
        .map(|row| Permission {
            id: row.get("id"),
            code: row.get("code"),
            is_active: row.get("is_active"),
        })
        .collect();

    Ok(AccessSnapshot::new(roles, permissions))
}

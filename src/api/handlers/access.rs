//! Authorization endpoints: gate checks and derived listings.
//!
//! Each request loads the principal and a fresh directory snapshot, then
//! delegates to the pure evaluator. Unknown principals answer 404; a failed
//! gate answers 403 naming only the unmet requirement.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::error;
use utoipa::ToSchema;

use crate::api::storage;
use crate::auth::evaluator;
use crate::auth::principal::{AccessSnapshot, Principal};

#[derive(ToSchema, Deserialize, Debug)]
pub struct AccessCheckRequest {
    pub user_id: i64,
    /// Permission codes; access is granted when any one is held.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Role codes; access is granted when any one is held.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct AccessListResponse {
    pub user_id: i64,
    pub codes: Vec<String>,
}

async fn load_context(pool: &PgPool, user_id: i64) -> Result<(Principal, AccessSnapshot), Response> {
    let principal = match storage::load_principal(pool, user_id).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            return Err((StatusCode::NOT_FOUND, "Unknown principal".to_string()).into_response());
        }
        Err(err) => {
            error!("Principal lookup failed: {err}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Access check failed".to_string(),
            )
                .into_response());
        }
    };

    let snapshot = match storage::load_snapshot(pool).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("Directory snapshot load failed: {err}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Access check failed".to_string(),
            )
                .into_response());
        }
    };

    Ok((principal, snapshot))
}

#[utoipa::path(
    post,
    path = "/v1/access/check",
    request_body = AccessCheckRequest,
    responses(
        (status = 204, description = "Access granted"),
        (status = 400, description = "Missing payload", body = String),
        (status = 403, description = "Access denied, names the unmet requirement", body = String),
        (status = 404, description = "Unknown principal", body = String)
    ),
    tag = "access"
)]
pub async fn check(
    pool: Extension<PgPool>,
    payload: Option<Json<AccessCheckRequest>>,
) -> impl IntoResponse {
    let request: AccessCheckRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.permissions.is_empty() && request.roles.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Missing permissions or roles".to_string(),
        )
            .into_response();
    }

    let (principal, snapshot) = match load_context(&pool, request.user_id).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let permission_ok = request.permissions.is_empty()
        || evaluator::has_any_permission(&principal, &snapshot, &request.permissions);
    let role_ok =
        request.roles.is_empty() || evaluator::has_any_role(&principal, &snapshot, &request.roles);

    if permission_ok && role_ok {
        return StatusCode::NO_CONTENT.into_response();
    }

    let requirement = if permission_ok {
        format!("role {}", request.roles.join(" or "))
    } else {
        format!("permission {}", request.permissions.join(" or "))
    };
    (StatusCode::FORBIDDEN, format!("Requires {requirement}")).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/permissions",
    params(("id" = i64, Path, description = "Principal id")),
    responses(
        (status = 200, description = "Effective permission codes", body = AccessListResponse),
        (status = 404, description = "Unknown principal", body = String)
    ),
    tag = "access"
)]
pub async fn list_permissions(
    pool: Extension<PgPool>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let (principal, snapshot) = match load_context(&pool, user_id).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let codes = evaluator::list_permissions(&principal, &snapshot)
        .into_iter()
        .collect();
    (StatusCode::OK, Json(AccessListResponse { user_id, codes })).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/roles",
    params(("id" = i64, Path, description = "Principal id")),
    responses(
        (status = 200, description = "Active role codes", body = AccessListResponse),
        (status = 404, description = "Unknown principal", body = String)
    ),
    tag = "access"
)]
pub async fn list_roles(pool: Extension<PgPool>, Path(user_id): Path<i64>) -> impl IntoResponse {
    let (principal, snapshot) = match load_context(&pool, user_id).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let codes = evaluator::list_roles(&principal, &snapshot)
        .into_iter()
        .collect();
    (StatusCode::OK, Json(AccessListResponse { user_id, codes })).into_response()
}

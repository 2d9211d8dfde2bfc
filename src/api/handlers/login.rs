//! Login endpoint backed by the stored-credential verifier.
//!
//! Every authentication failure — unknown username, inactive account,
//! malformed stored hash, wrong password — answers the same way so the
//! endpoint cannot be used to enumerate accounts. The reason is only logged
//! at debug level.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::normalize_username;
use crate::api::{ApiState, storage};
use crate::auth::credential;
use crate::ratelimit::LoginGate;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 429, description = "Account locked after repeated failures", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<ApiState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = normalize_username(&request.username);
    if username.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing username".to_string()).into_response();
    }

    if let LoginGate::Locked { retry_after_secs } = state.attempts.check(&username).await {
        debug!(username, retry_after_secs, "login attempt while locked out");
        return locked_response(retry_after_secs);
    }

    let record = match storage::lookup_login_record(&pool, &username).await {
        Ok(record) => record,
        Err(err) => {
            error!("Login lookup failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let Some(record) = record else {
        debug!(username, "login for unknown username");
        return failed_login(&state, &username).await;
    };

    // The KDF is CPU-bound; keep it off the async workers.
    let password = request.password;
    let stored = record.password_hash.clone();
    let verified =
        match tokio::task::spawn_blocking(move || credential::verify(&password, &stored)).await {
            Ok(verified) => verified,
            Err(err) => {
                error!("Credential verification task failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Login failed".to_string(),
                )
                    .into_response();
            }
        };

    if !verified {
        debug!(username, "password verification failed");
        return failed_login(&state, &username).await;
    }

    if !record.is_active {
        debug!(username, "login for inactive account");
        return failed_login(&state, &username).await;
    }

    state.attempts.record_success(&username).await;

    (
        StatusCode::OK,
        Json(LoginResponse {
            user_id: record.user_id,
            username: record.username,
            is_staff: record.is_staff,
            is_superuser: record.is_superuser,
        }),
    )
        .into_response()
}

async fn failed_login(state: &ApiState, username: &str) -> Response {
    state.attempts.record_failure(username).await;
    if let LoginGate::Locked { retry_after_secs } = state.attempts.check(username).await {
        return locked_response(retry_after_secs);
    }
    (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()).into_response()
}

fn locked_response(retry_after_secs: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        "Too many failed login attempts".to_string(),
    )
        .into_response();
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

//! Password policy endpoint used by the admin UI password form.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::policy::{self, StrengthLabel};

#[derive(ToSchema, Deserialize, Debug)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PasswordCheckResponse {
    /// Whether the password satisfies every policy rule.
    pub ok: bool,
    pub violations: Vec<String>,
    pub score: u8,
    pub strength: StrengthLabel,
}

#[utoipa::path(
    post,
    path = "/v1/password/check",
    request_body = PasswordCheckRequest,
    responses(
        (status = 200, description = "Policy verdict with score and label", body = PasswordCheckResponse),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "password"
)]
pub async fn check(payload: Option<Json<PasswordCheckRequest>>) -> impl IntoResponse {
    let request: PasswordCheckRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let violations = match policy::validate(&request.password) {
        Ok(()) => Vec::new(),
        Err(violations) => violations
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    };
    let score = policy::score(&request.password);

    (
        StatusCode::OK,
        Json(PasswordCheckResponse {
            ok: violations.is_empty(),
            violations,
            score,
            strength: policy::strength_label(score),
        }),
    )
        .into_response()
}

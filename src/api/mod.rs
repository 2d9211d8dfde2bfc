use crate::{
    api::handlers::{health, root},
    ratelimit::{AttemptTracker, WindowLimiter},
};
use anyhow::{Context, Result};
use axum::{
    Extension, Json, middleware as axum_middleware,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
pub mod middleware;
pub mod storage;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Throttling configuration, from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub max_login_attempts: u32,
    pub lockout_secs: u64,
}

/// Shared state for the throttling middleware and the login handler.
#[derive(Debug)]
pub struct ApiState {
    pub limiter: WindowLimiter,
    pub attempts: AttemptTracker,
}

impl ApiState {
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limiter: WindowLimiter::new(limits.rate_limit, limits.rate_window_secs),
            attempts: AttemptTracker::new(limits.max_login_attempts, limits.lockout_secs),
        }
    }
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, limits: Limits) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let state = Arc::new(ApiState::new(limits));

    // Build the router from OpenAPI-wired routes, then extend it with non-doc
    // routes like `/`, preflight-only `OPTIONS /health`, and the spec itself.
    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .route(
            "/openapi.json",
            get(|| async { Json(openapi::openapi()) }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state))
                .layer(axum_middleware::from_fn(middleware::rate_limit))
                .layer(Extension(pool.clone())),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

//! # nidg-api — Axum API Service for the NID Gateway
//!
//! The thin service layer around the registry client: route wiring,
//! input-format validation, the client-system allowlist, and the audit
//! logging pipeline.
//!
//! ## API Surface
//!
//! | Route                  | Module                    | Purpose                     |
//! |------------------------|---------------------------|-----------------------------|
//! | `POST /v1/verifications` | [`routes::verification`] | Demographic verification    |
//! | `GET /v1/audit/stats`  | [`routes::stats`]         | Request-log aggregates      |
//! | `GET /openapi.json`    | [`openapi`]               | OpenAPI document            |
//! | `GET /health/*`        | (this module)             | Liveness / readiness probes |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AllowlistMiddleware → Handler
//! ```
//!
//! Health probes are mounted outside the allowlist gate so orchestration
//! can reach them from unregistered addresses.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::verification::router())
        .merge(routes::stats::router())
        .merge(openapi::router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::allowlist::allowlist_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - Database connection is healthy (when configured).
/// - Registry client is wired; the service can start without it but
///   cannot serve its purpose, so deploys should catch the gap here.
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    if state.registry.is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "registry client not configured",
        )
            .into_response();
    }

    (StatusCode::OK, "ready").into_response()
}

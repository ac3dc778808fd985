//! Read-side statistics over the audit log.
//!
//! A simple aggregate query for operators: how many calls, how many
//! succeeded, how long they took. Requires the database; without one the
//! endpoint answers 503.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db;
use crate::db::audit_log::AuditStats;
use crate::error::AppError;
use crate::state::AppState;

/// Build the statistics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/audit/stats", get(audit_stats))
}

/// Query parameters for the statistics endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Restrict to one registered system name.
    pub system: Option<String>,
    /// Lower bound on record creation time (RFC 3339).
    pub since: Option<DateTime<Utc>>,
}

/// GET /v1/audit/stats — aggregate request-log statistics.
#[utoipa::path(
    get,
    path = "/v1/audit/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Aggregate statistics", body = AuditStats),
        (status = 503, description = "Audit persistence not configured"),
    ),
    tag = "audit"
)]
pub(crate) async fn audit_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<AuditStats>, AppError> {
    let Some(pool) = &state.db_pool else {
        return Err(AppError::service_unavailable(
            "audit persistence is not configured",
        ));
    };

    let stats = db::audit_log::stats(pool, query.system.as_deref(), query.since)
        .await
        .map_err(|e| AppError::Internal(format!("audit stats query failed: {e}")))?;

    Ok(Json(stats))
}

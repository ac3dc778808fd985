//! Audit log persistence operations.
//!
//! All functions take a `&MySqlPool` and operate on the `audit_log`
//! table. Audit rows are immutable once created; there are no update
//! operations.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::audit::AuditRecord;

/// Insert one audit record.
pub async fn insert(pool: &MySqlPool, record: &AuditRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_log (request_id, client_ip, system_name, subject_id,
         request_snapshot, response_snapshot, outcome, error_detail,
         processing_time_ms, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.request_id.to_string())
    .bind(&record.client_ip)
    .bind(&record.system_name)
    .bind(&record.subject_id)
    .bind(&record.request_snapshot)
    .bind(&record.response_snapshot)
    .bind(record.outcome.as_str())
    .bind(&record.error_detail)
    .bind(i64::try_from(record.processing_time_ms).unwrap_or(i64::MAX))
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Aggregate counts for the read-side statistics endpoint.
#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AuditStats {
    /// Total number of audited calls.
    pub total: i64,
    /// Calls that produced a verification result.
    pub success: i64,
    /// Calls that failed with a domain error.
    pub error: i64,
    /// Mean processing time in milliseconds, absent when no rows match.
    pub avg_processing_time_ms: Option<f64>,
}

/// Aggregate request-log statistics, optionally filtered by system name
/// and a lower bound on `created_at`.
pub async fn stats(
    pool: &MySqlPool,
    system_name: Option<&str>,
    since: Option<DateTime<Utc>>,
) -> Result<AuditStats, sqlx::Error> {
    const SELECT: &str = "SELECT COUNT(*) AS total,
         COUNT(IF(outcome = 'SUCCESS', 1, NULL)) AS success,
         COUNT(IF(outcome = 'ERROR', 1, NULL)) AS error,
         CAST(AVG(processing_time_ms) AS DOUBLE) AS avg_processing_time_ms
         FROM audit_log";

    // SQLx has no great dynamic query builder; bind per filter combination.
    let row = match (system_name, since) {
        (Some(system), Some(since)) => {
            sqlx::query_as::<_, AuditStats>(&format!(
                "{SELECT} WHERE system_name = ? AND created_at >= ?"
            ))
            .bind(system)
            .bind(since)
            .fetch_one(pool)
            .await?
        }
        (Some(system), None) => {
            sqlx::query_as::<_, AuditStats>(&format!("{SELECT} WHERE system_name = ?"))
                .bind(system)
                .fetch_one(pool)
                .await?
        }
        (None, Some(since)) => {
            sqlx::query_as::<_, AuditStats>(&format!("{SELECT} WHERE created_at >= ?"))
                .bind(since)
                .fetch_one(pool)
                .await?
        }
        (None, None) => {
            sqlx::query_as::<_, AuditStats>(SELECT)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(row)
}

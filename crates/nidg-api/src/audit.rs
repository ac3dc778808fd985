//! Audit logging pipeline.
//!
//! Every inbound verification call produces exactly one audit record:
//! the identifying request fields, the sanitized response payload, the
//! outcome, and the wall-clock processing time. Persistence runs on a
//! spawned task so the caller's response never waits on the database,
//! and a failed write is logged rather than surfaced.
//!
//! ## Sanitization
//!
//! Inlined photos are multi-kilobyte base64 blobs; storing them would
//! bloat the audit table and duplicate personal imagery outside the
//! registry. Before a snapshot is persisted, every embedded binary field
//! is replaced with a redaction marker naming the field. The rule
//! recurses through nested person-detail structures and arrays.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::MySqlPool;

use nidg_core::RequestId;

use crate::db;

/// Field names treated as binary assets regardless of value.
const BINARY_FIELD_NAMES: [&str; 5] = ["photo", "image", "picture", "avatar", "signature"];

/// Prefix marking a self-describing embedded binary value.
const EMBEDDED_DATA_MARKER: &str = "data:";

/// Outcome of the audited call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The call produced a verification result (including a mismatch).
    Success,
    /// The call failed with a domain error.
    Error,
}

impl AuditOutcome {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Correlation fields tying an audit record to its inbound call.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub request_id: RequestId,
    pub client_ip: String,
    pub system_name: String,
    pub subject_id: String,
}

/// One immutable audit row, written exactly once.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub request_id: RequestId,
    pub client_ip: String,
    pub system_name: String,
    pub subject_id: String,
    pub request_snapshot: Value,
    pub response_snapshot: Value,
    pub outcome: AuditOutcome,
    pub error_detail: Option<String>,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Fire-and-forget writer for audit records.
///
/// The verification handler is the only producer; the registry client
/// never touches the audit table.
#[derive(Clone)]
pub struct AuditSink {
    pool: Option<MySqlPool>,
}

impl AuditSink {
    /// Create a sink. With `None` the sink logs and drops records
    /// (development mode without a database).
    pub fn new(pool: Option<MySqlPool>) -> Self {
        Self { pool }
    }

    /// Record one request/response pair.
    ///
    /// Snapshots are sanitized before the record leaves this function.
    /// The insert itself runs on a spawned task; its failure is logged
    /// and never changes the caller-visible outcome.
    pub fn record(
        &self,
        context: AuditContext,
        mut request_snapshot: Value,
        mut response_snapshot: Value,
        outcome: AuditOutcome,
        error_detail: Option<String>,
        processing_time_ms: u64,
    ) {
        sanitize_snapshot(&mut request_snapshot);
        sanitize_snapshot(&mut response_snapshot);

        let record = AuditRecord {
            request_id: context.request_id,
            client_ip: context.client_ip,
            system_name: context.system_name,
            subject_id: context.subject_id,
            request_snapshot,
            response_snapshot,
            outcome,
            error_detail,
            processing_time_ms,
            created_at: Utc::now(),
        };

        let Some(pool) = self.pool.clone() else {
            tracing::debug!(
                request_id = %record.request_id,
                outcome = record.outcome.as_str(),
                "audit persistence disabled, dropping record"
            );
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = db::audit_log::insert(&pool, &record).await {
                tracing::error!(
                    request_id = %record.request_id,
                    error = %e,
                    "audit record insert failed"
                );
            }
        });
    }
}

/// Replace embedded binary assets with a redaction marker, recursively.
///
/// An object field is redacted when its name is one of
/// [`BINARY_FIELD_NAMES`] (case-insensitive) or its string value starts
/// with the `data:` marker; array elements are redacted on the value
/// rule alone.
pub fn sanitize_snapshot(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if is_binary_field(key, entry) {
                    *entry = Value::String(format!("[redacted:{key}]"));
                } else {
                    sanitize_snapshot(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if matches!(item, Value::String(s) if s.starts_with(EMBEDDED_DATA_MARKER)) {
                    *item = Value::String("[redacted:inline-data]".to_string());
                } else {
                    sanitize_snapshot(item);
                }
            }
        }
        _ => {}
    }
}

fn is_binary_field(key: &str, value: &Value) -> bool {
    if BINARY_FIELD_NAMES
        .iter()
        .any(|name| key.eq_ignore_ascii_case(name))
    {
        return true;
    }
    matches!(value, Value::String(s) if s.starts_with(EMBEDDED_DATA_MARKER))
}

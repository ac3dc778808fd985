//! # Verification Route
//!
//! The gateway's single write operation: accept a national-identity
//! record from a registered client system, obtain a verdict from the
//! registry through [`nidg_registry_client::RegistryClient`], and leave
//! one audit row behind.
//!
//! ## Flow
//!
//! 1. Validate field formats (digit count, calendar date, name script)
//! 2. Submit to the registry through the verification client
//! 3. Record the request/response pair out-of-band via the audit sink
//! 4. Return the normalized verdict; a conditional mismatch is HTTP 200
//!    with `verified == false`, never an error

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use nidg_core::{EnglishName, NidNumber, RequestId};
use nidg_registry_client::{FieldMatch, VerificationRequest};

use crate::audit::{AuditContext, AuditOutcome};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::middleware::allowlist::ClientSystem;
use crate::state::AppState;

/// Minimum subject age in years; IDs are only issued to adults.
const MIN_SUBJECT_AGE_YEARS: u32 = 18;

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/verifications", post(verify_identity))
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to verify a national identity record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// National ID number (10 or 17 digits).
    pub nid: String,
    /// Date of birth (YYYY-MM-DD).
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: String,
    /// Name in Latin script, as printed on the ID card.
    #[serde(rename = "nameEn")]
    pub name_en: String,
}

/// Verification verdict returned to the client system.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Correlation identifier; the audit row carries the same value.
    #[serde(rename = "requestId")]
    #[schema(value_type = String)]
    pub request_id: RequestId,
    /// Whether the registry confirmed the supplied fields.
    pub verified: bool,
    /// Per-field match flags.
    #[serde(rename = "fieldMatch")]
    #[schema(value_type = Object)]
    pub field_match: FieldMatch,
    /// Person details from the registry, photo inlined when available.
    #[serde(rename = "personDetails")]
    #[schema(value_type = Object)]
    pub person_details: serde_json::Map<String, Value>,
    /// Present when the record was found but fields did not match.
    #[serde(rename = "advisoryMessage", skip_serializing_if = "Option::is_none")]
    pub advisory_message: Option<String>,
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), String> {
        if !(self.nid.len() == 10 || self.nid.len() == 17)
            || !self.nid.chars().all(|c| c.is_ascii_digit())
        {
            return Err(format!(
                "nid must be exactly 10 or 17 digits, got {} characters",
                self.nid.len()
            ));
        }

        if self.name_en.trim().is_empty() {
            return Err("nameEn must not be empty".into());
        }
        if self.name_en.len() > 255 {
            return Err("nameEn must not exceed 255 characters".into());
        }

        let dob = NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d")
            .map_err(|_| "dateOfBirth must be a YYYY-MM-DD calendar date".to_string())?;
        let today = Utc::now().date_naive();
        if dob > today {
            return Err("dateOfBirth must not be in the future".into());
        }
        if dob > today - chrono::Months::new(12 * MIN_SUBJECT_AGE_YEARS) {
            return Err(format!(
                "subject must be at least {MIN_SUBJECT_AGE_YEARS} years old"
            ));
        }

        Ok(())
    }
}

impl VerifyRequest {
    /// Convert into the client's domain request. The newtype constructors
    /// re-check formats; anything they reject answers 422.
    fn to_domain(&self) -> Result<VerificationRequest, AppError> {
        let nid = NidNumber::new(self.nid.as_str())?;
        let name_en = EnglishName::new(self.name_en.as_str())?;
        let date_of_birth = NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d")
            .map_err(|e| {
                AppError::from(nidg_core::ValidationError::InvalidDateOfBirth(e.to_string()))
            })?;
        Ok(VerificationRequest {
            nid,
            date_of_birth,
            name_en,
        })
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /v1/verifications — verify a national identity record.
#[utoipa::path(
    post,
    path = "/v1/verifications",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification verdict (mismatch included)", body = VerifyResponse),
        (status = 403, description = "Caller not on the system allowlist"),
        (status = 422, description = "Invalid field format"),
        (status = 502, description = "Registry rejected the call"),
        (status = 503, description = "Registry client not configured or unreachable"),
    ),
    tag = "verification"
)]
pub(crate) async fn verify_identity(
    State(state): State<AppState>,
    caller: Option<Extension<ClientSystem>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let started = Instant::now();
    let request_id = RequestId::new();

    let req = extract_validated_json(body)?;
    let registry = state.registry.as_ref().ok_or_else(|| {
        AppError::service_unavailable(
            "registry client not configured. Set NIDG_REGISTRY_BASE_URL, \
             NIDG_REGISTRY_USERNAME and NIDG_REGISTRY_PASSWORD.",
        )
    })?;
    let domain = req.to_domain()?;

    let caller = caller.map_or_else(ClientSystem::unregistered, |Extension(c)| c);
    let context = AuditContext {
        request_id,
        client_ip: caller.ip.clone(),
        system_name: caller.name.clone(),
        subject_id: req.nid.clone(),
    };
    let request_snapshot = serde_json::json!({
        "nid": req.nid,
        "dateOfBirth": req.date_of_birth,
        "nameEn": req.name_en,
    });

    match registry.verify(&domain).await {
        Ok(report) => {
            let response = VerifyResponse {
                request_id,
                verified: report.verified,
                field_match: report.field_match,
                person_details: report.person_details,
                advisory_message: report.advisory_message,
            };
            let response_snapshot = serde_json::to_value(&response).unwrap_or(Value::Null);
            state.audit.record(
                context,
                request_snapshot,
                response_snapshot,
                AuditOutcome::Success,
                None,
                elapsed_ms(started),
            );
            tracing::info!(
                %request_id,
                system = %caller.name,
                verified = response.verified,
                "verification completed"
            );
            Ok(Json(response))
        }
        Err(e) => {
            state.audit.record(
                context,
                request_snapshot,
                Value::Null,
                AuditOutcome::Error,
                Some(e.to_string()),
                elapsed_ms(started),
            );
            tracing::warn!(%request_id, system = %caller.name, error = %e, "verification failed");
            Err(e.into())
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> VerifyRequest {
        VerifyRequest {
            nid: "12345678901234567".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            name_en: "Jane Doe".to_string(),
        }
    }

    #[test]
    fn router_builds_successfully() {
        let _router = router();
    }

    #[test]
    fn request_deserializes_wire_field_names() {
        let json = r#"{
            "nid": "12345678901234567",
            "dateOfBirth": "1990-01-01",
            "nameEn": "Jane Doe"
        }"#;
        let req: VerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.nid, "12345678901234567");
        assert_eq!(req.date_of_birth, "1990-01-01");
        assert_eq!(req.name_en, "Jane Doe");
    }

    #[test]
    fn validates_well_formed_request() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_wrong_digit_count() {
        let mut req = valid_request();
        req.nid = "1234567890123".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_non_numeric_nid() {
        let mut req = valid_request();
        req.nid = "12345abcde".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_empty_name() {
        let mut req = valid_request();
        req.name_en = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_unparseable_date() {
        let mut req = valid_request();
        req.date_of_birth = "01/01/1990".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_future_date() {
        let mut req = valid_request();
        req.date_of_birth = "2999-01-01".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_minor_subject() {
        let mut req = valid_request();
        let dob = Utc::now().date_naive() - chrono::Months::new(12 * 10);
        req.date_of_birth = dob.format("%Y-%m-%d").to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn domain_conversion_round_trips() {
        let domain = valid_request().to_domain().expect("convert");
        assert_eq!(domain.nid.as_str(), "12345678901234567");
        assert_eq!(domain.name_en.as_str(), "Jane Doe");
        assert_eq!(domain.date_of_birth.format("%Y-%m-%d").to_string(), "1990-01-01");
    }

    #[test]
    fn response_omits_absent_advisory() {
        let response = VerifyResponse {
            request_id: RequestId::new(),
            verified: true,
            field_match: FieldMatch {
                name_en: true,
                date_of_birth: true,
            },
            person_details: serde_json::Map::new(),
            advisory_message: None,
        };
        let json = serde_json::to_string(&response).expect("serialize");
        assert!(!json.contains("advisoryMessage"));
        assert!(json.contains("requestId"));
        assert!(json.contains("fieldMatch"));
    }
}

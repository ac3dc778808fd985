//! Registry verification client.
//!
//! Owns the outbound protocol against the national identity registry:
//! the login exchange, demographic verification submission, response
//! classification, one bounded re-authentication retry on 401, and photo
//! inlining.
//!
//! ## Response classification
//!
//! The registry reports three meaningfully different shapes:
//!
//! - HTTP 200 with `status: "OK"` and the verification body nested
//!   under `success`: the record matched (or the registry's own
//!   `verified` flag says otherwise; it is trusted either way).
//! - A non-success client status carrying `{verified, data,
//!   fieldVerificationResult}` at top level: the record was found but
//!   the supplied fields did not match. This is a valid verification
//!   outcome, never a transport error.
//! - Anything else: a hard failure, surfaced with the upstream
//!   status/body for diagnostics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use nidg_core::IdChannel;

use crate::asset;
use crate::config::RegistryConfig;
use crate::credentials::CredentialCache;
use crate::error::RegistryError;
use crate::types::{FieldMatch, VerificationReport, VerificationRequest};

/// Advisory attached when the registry found the record but the supplied
/// fields did not match it.
const MISMATCH_ADVISORY: &str =
    "national ID record found, but one or more supplied fields did not match";

/// HTTP client for the national identity registry.
///
/// Shared across async tasks behind an `Arc`. The only serialization
/// point between concurrent verifications is the credential refresh
/// inside [`CredentialCache`].
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: zeroize::Zeroizing<String>,
    credentials: CredentialCache,
}

impl RegistryClient {
    /// Build a client from configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegistryError::ServiceUnavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            credentials: CredentialCache::new(
                Duration::from_secs(config.token_ttl_secs),
                Duration::from_secs(config.token_refresh_margin_secs),
            ),
        })
    }

    /// Verify a demographic record against the registry.
    ///
    /// A 401 invalidates the cached credential and the whole flow retries
    /// exactly once with a freshly obtained token; a second 401 is fatal.
    /// A conditional mismatch is a successful call with
    /// `verified == false`, never an error. Photo inlining failures keep
    /// the original reference and never fail the call.
    pub async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationReport, RegistryError> {
        let url = format!("{}/voter/demographic/verification", self.base_url);
        let payload = VerificationPayload::from_request(request);

        let mut reauthenticated = false;
        let outcome = loop {
            let token = self.credentials.get_valid(|| self.authenticate()).await?;

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&payload)
                .send()
                .await
                .map_err(|e| RegistryError::ServiceUnavailable {
                    reason: format!("verification: {e}"),
                })?;

            if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
                // The registry's 401 is authoritative: the token is dead
                // regardless of how much of the assumed lifetime remains.
                self.credentials.invalidate().await;
                if reauthenticated {
                    break Err(RegistryError::ServiceUnavailable {
                        reason: "registry rejected a freshly issued credential".to_string(),
                    });
                }
                tracing::info!("registry rejected bearer token, re-authenticating once");
                reauthenticated = true;
                continue;
            }

            break classify(resp).await;
        };

        let mut report = into_report(outcome?);
        self.inline_photo(&mut report.person_details).await;
        Ok(report)
    }

    /// Perform the login exchange and return a fresh access token.
    ///
    /// Called from inside the credential cache's single-flight section;
    /// never retried here.
    async fn authenticate(&self) -> Result<String, RegistryError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = LoginPayload {
            username: &self.username,
            password: self.password.as_str(),
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryError::ServiceUnavailable {
                reason: format!("login: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Authentication {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let envelope: LoginEnvelope =
            resp.json()
                .await
                .map_err(|e| RegistryError::Authentication {
                    status: status.as_u16(),
                    body: format!("malformed login response: {e}"),
                })?;

        if envelope.status != "OK" {
            return Err(RegistryError::Authentication {
                status: status.as_u16(),
                body: format!("login answered status {:?}", envelope.status),
            });
        }

        tracing::debug!("registry login succeeded");
        Ok(envelope.success.data.access_token)
    }

    /// Replace a `photo` URL in the person details with an inlined copy.
    ///
    /// On inliner failure the original reference stays untouched; the
    /// verification result is unaffected either way.
    async fn inline_photo(&self, details: &mut Map<String, Value>) {
        let Some(reference) = details.get("photo").and_then(Value::as_str).map(str::to_owned)
        else {
            return;
        };

        match asset::inline(&self.http, &reference).await {
            Ok(encoded) => {
                details.insert("photo".to_string(), Value::String(encoded.to_data_uri()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "photo inlining failed, keeping original reference");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    status: String,
    success: LoginSuccess,
}

#[derive(Debug, Deserialize)]
struct LoginSuccess {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct VerificationPayload<'a> {
    identify: Identify<'a>,
    verify: VerifyFields<'a>,
}

/// Identification section: exactly one channel field is serialized,
/// chosen by the ID number's digit count.
#[derive(Debug, Serialize)]
struct Identify<'a> {
    #[serde(rename = "nid10Digit", skip_serializing_if = "Option::is_none")]
    nid_10_digit: Option<&'a str>,
    #[serde(rename = "nid17Digit", skip_serializing_if = "Option::is_none")]
    nid_17_digit: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VerifyFields<'a> {
    #[serde(rename = "nameEn")]
    name_en: &'a str,
    #[serde(rename = "dateOfBirth")]
    date_of_birth: String,
}

impl<'a> VerificationPayload<'a> {
    fn from_request(request: &'a VerificationRequest) -> Self {
        let identify = match request.nid.channel() {
            IdChannel::Nid10 => Identify {
                nid_10_digit: Some(request.nid.as_str()),
                nid_17_digit: None,
            },
            IdChannel::Nid17 => Identify {
                nid_10_digit: None,
                nid_17_digit: Some(request.nid.as_str()),
            },
        };
        Self {
            identify,
            verify: VerifyFields {
                name_en: request.name_en.as_str(),
                date_of_birth: request.date_of_birth.format("%Y-%m-%d").to_string(),
            },
        }
    }
}

/// Verification body shared by the matched and mismatched shapes. Nested
/// under `success` on the matched path, at top level on the mismatch
/// path.
#[derive(Debug, Deserialize)]
struct VerificationBody {
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(rename = "fieldVerificationResult", default)]
    field_verification_result: Option<FieldFlags>,
}

#[derive(Debug, Deserialize)]
struct FieldFlags {
    #[serde(rename = "nameEn", default)]
    name_en: Option<bool>,
    #[serde(rename = "dateOfBirth", default)]
    date_of_birth: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct VerificationEnvelope {
    status: String,
    success: VerificationBody,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Protocol outcome of a verification exchange, before photo inlining.
enum Outcome {
    /// Registry signalled success; `verified` comes from the body.
    Matched(VerificationBody),
    /// Record found but the supplied fields did not match.
    Mismatched(VerificationBody),
}

/// Classify a non-401 verification response.
async fn classify(resp: reqwest::Response) -> Result<Outcome, RegistryError> {
    let status = resp.status();

    if status.is_success() {
        let envelope: VerificationEnvelope =
            resp.json()
                .await
                .map_err(|e| RegistryError::VerificationFailed {
                    status: status.as_u16(),
                    body: format!("malformed verification response: {e}"),
                })?;
        if envelope.status != "OK" {
            return Err(RegistryError::VerificationFailed {
                status: status.as_u16(),
                body: format!("unexpected response status {:?}", envelope.status),
            });
        }
        return Ok(Outcome::Matched(envelope.success));
    }

    let body = resp.text().await.unwrap_or_default();

    if status.is_server_error() {
        return Err(RegistryError::ServiceUnavailable {
            reason: format!("verification: HTTP {status}: {}", excerpt(&body)),
        });
    }

    // Conditional mismatch: the verification body sits at top level
    // rather than nested under `success`. Only a body that actually
    // carries verification data qualifies.
    if let Ok(found) = serde_json::from_str::<VerificationBody>(&body) {
        if found.field_verification_result.is_some() || found.data.is_some() {
            return Ok(Outcome::Mismatched(found));
        }
    }

    Err(RegistryError::VerificationFailed {
        status: status.as_u16(),
        body: excerpt(&body),
    })
}

/// Fold a protocol outcome into the caller-facing report.
///
/// Absent field flags default to `false`; the mismatch path still
/// carries whatever partial person details the registry supplied.
fn into_report(outcome: Outcome) -> VerificationReport {
    let (verified, body, advisory_message) = match outcome {
        Outcome::Matched(body) => (body.verified, body, None),
        Outcome::Mismatched(body) => (false, body, Some(MISMATCH_ADVISORY.to_string())),
    };

    let field_match = body
        .field_verification_result
        .map(|flags| FieldMatch {
            name_en: flags.name_en.unwrap_or(false),
            date_of_birth: flags.date_of_birth.unwrap_or(false),
        })
        .unwrap_or_default();

    VerificationReport {
        verified,
        field_match,
        person_details: body.data.unwrap_or_default(),
        advisory_message,
    }
}

/// Truncate an upstream body for diagnostics.
fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 512;
    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_CHARS).collect();
        truncated.push_str("...");
        truncated
    }
}

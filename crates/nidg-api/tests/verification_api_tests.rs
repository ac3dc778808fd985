//! # Integration Tests for the Gateway API
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`,
//! backing the registry with wiremock where the flow needs one. No
//! database is attached: the audit sink runs in its log-and-drop mode.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nidg_api::middleware::allowlist::Allowlist;
use nidg_api::state::AppState;
use nidg_api::app;
use nidg_registry_client::{RegistryClient, RegistryConfig};

const VALID_BODY: &str =
    r#"{"nid":"12345678901234567","dateOfBirth":"1990-01-01","nameEn":"Jane Doe"}"#;

fn verify_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/verifications")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn registry_state(server: &MockServer) -> AppState {
    let config = RegistryConfig::new(server.uri(), "gateway-svc", "test-password");
    AppState::new().with_registry(RegistryClient::new(config).expect("client build"))
}

// ── Configuration gaps ───────────────────────────────────────────────────

#[tokio::test]
async fn verify_returns_503_without_registry_client() {
    let app = app(AppState::new());
    let resp = app.oneshot(verify_request(VALID_BODY)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn stats_returns_503_without_database() {
    let app = app(AppState::new());
    let req = Request::builder()
        .method("GET")
        .uri("/v1/audit/stats")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ── Input validation ─────────────────────────────────────────────────────

#[tokio::test]
async fn verify_rejects_wrong_digit_count() {
    let app = app(AppState::new());
    let body = r#"{"nid":"12345","dateOfBirth":"1990-01-01","nameEn":"Jane Doe"}"#;
    let resp = app.oneshot(verify_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("10 or 17 digits"));
}

#[tokio::test]
async fn verify_rejects_malformed_json() {
    let app = app(AppState::new());
    let resp = app.oneshot(verify_request("{not json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn verify_rejects_bad_date() {
    let app = app(AppState::new());
    let body = r#"{"nid":"12345678901234567","dateOfBirth":"01/01/1990","nameEn":"Jane Doe"}"#;
    let resp = app.oneshot(verify_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Allowlist gate ───────────────────────────────────────────────────────

#[tokio::test]
async fn allowlist_blocks_unknown_address() {
    let state = AppState::new()
        .with_allowlist(Allowlist::parse("tax-portal=10.2.0.4").expect("parse"));
    let app = app(state);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/verifications")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "192.168.1.9")
        .body(Body::from(VALID_BODY))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn allowlist_admits_registered_address() {
    let state = AppState::new()
        .with_allowlist(Allowlist::parse("tax-portal=10.2.0.4").expect("parse"));
    let app = app(state);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/verifications")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "10.2.0.4")
        .body(Body::from(VALID_BODY))
        .unwrap();

    // Past the gate; fails later only because no registry is configured.
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_probes_bypass_the_allowlist() {
    let state = AppState::new()
        .with_allowlist(Allowlist::parse("tax-portal=10.2.0.4").expect("parse"));
    let app = app(state);

    let req = Request::builder()
        .method("GET")
        .uri("/health/liveness")
        .header("x-forwarded-for", "192.168.1.9")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── Health probes ────────────────────────────────────────────────────────

#[tokio::test]
async fn readiness_reports_missing_registry() {
    let app = app(AppState::new());
    let req = Request::builder()
        .method("GET")
        .uri("/health/readiness")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn readiness_passes_with_registry_wired() {
    let server = MockServer::start().await;
    let app = app(registry_state(&server));

    let req = Request::builder()
        .method("GET")
        .uri("/health/readiness")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── End-to-end against a registry stub ───────────────────────────────────

async fn mount_registry_stubs(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "success": {"data": {"access_token": "tok-1"}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn end_to_end_full_match() {
    let server = MockServer::start().await;
    mount_registry_stubs(&server).await;

    Mock::given(method("POST"))
        .and(path("/voter/demographic/verification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "success": {
                "verified": true,
                "data": {"nameEn": "Jane Doe", "fatherName": "John Doe"},
                "fieldVerificationResult": {"nameEn": true, "dateOfBirth": true}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(registry_state(&server));
    let resp = app.oneshot(verify_request(VALID_BODY)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["verified"], true);
    assert_eq!(body["fieldMatch"]["nameEn"], true);
    assert_eq!(body["fieldMatch"]["dateOfBirth"], true);
    assert_eq!(body["personDetails"]["nameEn"], "Jane Doe");
    assert!(body["requestId"].as_str().is_some());
    assert!(body.get("advisoryMessage").is_none());
}

#[tokio::test]
async fn end_to_end_conditional_mismatch_is_http_200() {
    let server = MockServer::start().await;
    mount_registry_stubs(&server).await;

    Mock::given(method("POST"))
        .and(path("/voter/demographic/verification"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "verified": false,
            "data": {"nameEn": "Jane A Doe"},
            "fieldVerificationResult": {"nameEn": false, "dateOfBirth": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(registry_state(&server));
    let resp = app.oneshot(verify_request(VALID_BODY)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["verified"], false);
    assert_eq!(body["fieldMatch"]["nameEn"], false);
    assert_eq!(body["fieldMatch"]["dateOfBirth"], true);
    assert!(body["advisoryMessage"]
        .as_str()
        .unwrap()
        .contains("did not match"));
}

#[tokio::test]
async fn end_to_end_registry_outage_is_503() {
    let server = MockServer::start().await;
    mount_registry_stubs(&server).await;

    Mock::given(method("POST"))
        .and(path("/voter/demographic/verification"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(registry_state(&server));
    let resp = app.oneshot(verify_request(VALID_BODY)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ── OpenAPI ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app(AppState::new());
    let req = Request::builder()
        .method("GET")
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert!(body["paths"].get("/v1/verifications").is_some());
}

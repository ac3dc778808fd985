//! OpenAPI document assembly.
//!
//! Auto-generated from the utoipa annotations on the route handlers and
//! schema types, served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// OpenAPI document for the gateway API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "NID Gateway API",
        description = "National identity verification gateway: registered client \
                       systems submit demographic records and receive registry \
                       verdicts; every call is audited."
    ),
    paths(
        crate::routes::verification::verify_identity,
        crate::routes::stats::audit_stats,
    ),
    components(schemas(
        crate::routes::verification::VerifyRequest,
        crate::routes::verification::VerifyResponse,
        crate::db::audit_log::AuditStats,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "verification", description = "Demographic verification"),
        (name = "audit", description = "Request-log statistics"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — machine-readable API description.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use reconwarden_core::UserId;
use reconwarden_domain::{ExceptionId, SuggestionId};

use crate::app::dto::{
    ConfirmSuggestionRequest, RejectSuggestionRequest, suggestion_to_json,
};
use crate::app::errors::domain_error_to_response;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/exception/:exception_id", get(generate_for_exception))
        .route("/confirm", post(confirm))
        .route("/reject", post(reject))
        .route("/calibration", get(calibration))
}

/// Regenerate and return ranked suggestions for one open exception.
pub async fn generate_for_exception(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(exception_id): Path<String>,
) -> axum::response::Response {
    let exception_id: ExceptionId = match exception_id.parse() {
        Ok(id) => id,
        Err(e) => return domain_error_to_response(e),
    };

    match services
        .engine
        .generate(tenant.tenant_id(), exception_id, Utc::now())
    {
        Ok(suggestions) => {
            let items: Vec<_> = suggestions.iter().map(suggestion_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ConfirmSuggestionRequest>,
) -> axum::response::Response {
    let suggestion_id: SuggestionId = match body.suggestion_id.parse() {
        Ok(id) => id,
        Err(e) => return domain_error_to_response(e),
    };
    let actor = UserId::from_uuid(*principal.principal_id().as_uuid());

    match services
        .lifecycle
        .confirm(tenant.tenant_id(), suggestion_id, actor, Utc::now())
    {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "reconciliation_link_id": receipt.link.id.to_string(),
                "exception_resolved": receipt.exception_resolved,
            })),
        )
            .into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<RejectSuggestionRequest>,
) -> axum::response::Response {
    let suggestion_id: SuggestionId = match body.suggestion_id.parse() {
        Ok(id) => id,
        Err(e) => return domain_error_to_response(e),
    };
    let actor = UserId::from_uuid(*principal.principal_id().as_uuid());

    match services
        .lifecycle
        .reject(tenant.tenant_id(), suggestion_id, actor, Utc::now())
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true })),
        )
            .into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

pub async fn calibration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let model_version = services
        .governor
        .settings_for(tenant.tenant_id())
        .ml_model_version;
    let report = services
        .calibration
        .report(tenant.tenant_id(), &model_version);
    (StatusCode::OK, Json(report)).into_response()
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use reconwarden_core::UserId;
use reconwarden_domain::{DriftSignalId, MlStatus};

use crate::app::dto::{
    AcknowledgeSignalRequest, DriftEventsQuery, ResetStatusRequest, settings_to_json,
    signal_to_json,
};
use crate::app::errors::{domain_error_to_response, json_error, parse_ml_status};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Signal count returned when no `limit` is given.
pub const DEFAULT_EVENT_LIMIT: usize = 50;
/// Hard cap on `limit`; requests above it are clamped, not rejected.
pub const MAX_EVENT_LIMIT: usize = 500;
/// Recent signals embedded in the summary payload.
const SUMMARY_SIGNAL_LIMIT: usize = 10;

pub fn router() -> Router {
    Router::new()
        .route("/summary", get(summary))
        .route("/drift-events", get(drift_events))
        .route("/detect", post(detect))
        .route("/acknowledge", post(acknowledge))
        .route("/reset-status", post(reset_status))
}

/// Current status plus live metrics over the same windows the detector uses.
pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let tenant_id = tenant.tenant_id();
    let settings = services.governor.settings_for(tenant_id);
    let snapshot = services.detector.snapshot(tenant_id, Utc::now());
    let recent = services
        .governor
        .signal_history(tenant_id, SUMMARY_SIGNAL_LIMIT);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "settings": settings_to_json(&settings),
            "metrics": {
                "recent_outcome_count": snapshot.recent_outcome_count,
                "recent_accuracy": snapshot.recent_accuracy,
                "expected_calibration_error": snapshot.expected_calibration_error,
                "false_auto_rate": snapshot.false_auto_rate,
                "guardrail_block_rate": snapshot.guardrail_block_rate,
            },
            "recent_signals": recent.iter().map(signal_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub async fn drift_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Query(query): Query<DriftEventsQuery>,
) -> axum::response::Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .clamp(1, MAX_EVENT_LIMIT);
    let items = services
        .governor
        .signal_history(tenant.tenant_id(), limit)
        .iter()
        .map(signal_to_json)
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// Run the drift detector and apply the governor transition.
pub async fn detect(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let tenant_id = tenant.tenant_id();
    let settings = services.governor.settings_for(tenant_id);
    if settings.ml_status == MlStatus::Disabled {
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": settings.ml_status,
                "signals": [],
                "message": "automated matching is disabled for this tenant; reset-status is required before detection resumes",
            })),
        )
            .into_response();
    }

    let now = Utc::now();
    let signals = services.detector.detect(tenant_id, now);
    let report = services.governor.apply(tenant_id, signals, now);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status_before": report.status_before,
            "status_after": report.status_after,
            "action": report.action,
            "signals": report.signals.iter().map(signal_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub async fn acknowledge(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<AcknowledgeSignalRequest>,
) -> axum::response::Response {
    let signal_id: DriftSignalId = match body.signal_id.parse() {
        Ok(id) => id,
        Err(e) => return domain_error_to_response(e),
    };
    let actor = UserId::from_uuid(*principal.principal_id().as_uuid());

    match services
        .governor
        .acknowledge(tenant.tenant_id(), signal_id, actor, Utc::now())
    {
        Ok(signal) => (StatusCode::OK, Json(signal_to_json(&signal))).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

/// Admin-only reset out of DISABLED (or back to ACTIVE from LIMITED).
pub async fn reset_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ResetStatusRequest>,
) -> axum::response::Response {
    if !principal.is_admin() {
        return json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required to reset ml status",
        );
    }

    let status = match parse_ml_status(&body.status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.governor.reset(tenant.tenant_id(), status) {
        Ok(settings) => (StatusCode::OK, Json(settings_to_json(&settings))).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

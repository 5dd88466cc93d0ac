use serde::Deserialize;
use serde_json::{Value, json};

use reconwarden_domain::{DriftSignal, Suggestion, TenantMlSettings};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ConfirmSuggestionRequest {
    pub suggestion_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectSuggestionRequest {
    pub suggestion_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeSignalRequest {
    pub signal_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DriftEventsQuery {
    pub limit: Option<usize>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn suggestion_to_json(s: &Suggestion) -> Value {
    json!({
        "id": s.id.to_string(),
        "exception_id": s.exception_id.to_string(),
        "bank_transaction_id": s.bank_transaction_id.map(|id| id.to_string()),
        "invoice_id": s.invoice_id.map(|id| id.to_string()),
        "suggestion_type": s.suggestion_type,
        "confidence": s.confidence,
        "suggested_amount_minor": s.suggested_amount_minor,
        "currency": s.currency,
        "rationale": s.rationale.to_api_map(),
        "created_at": s.created_at.to_rfc3339(),
    })
}

pub fn signal_to_json(s: &DriftSignal) -> Value {
    json!({
        "id": s.id.to_string(),
        "model_version": s.model_version,
        "drift_type": s.drift_type,
        "severity": s.severity,
        "metric": s.metric,
        "baseline_value": s.baseline_value,
        "current_value": s.current_value,
        "delta": s.delta,
        "details": s.details,
        "auto_action_taken": s.auto_action_taken,
        "detected_at": s.detected_at.to_rfc3339(),
        "acknowledged_at": s.acknowledged_at.map(|t| t.to_rfc3339()),
        "acknowledged_by": s.acknowledged_by.map(|u| u.to_string()),
    })
}

pub fn settings_to_json(s: &TenantMlSettings) -> Value {
    json!({
        "ml_enabled": s.ml_enabled,
        "ml_status": s.ml_status,
        "ml_model_version": s.ml_model_version,
        "last_fallback_reason": s.last_fallback_reason,
        "last_fallback_at": s.last_fallback_at.map(|t| t.to_rfc3339()),
    })
}

//! Drift detection over the suggestion outcome trail.
//!
//! Compares a recent window (last 7 days) against a baseline window (8 to 30
//! days ago) and emits one [`DriftSignal`] per fired check. Checks below
//! their minimum sample size are skipped silently rather than reported as
//! healthy.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

use reconwarden_core::TenantId;
use reconwarden_domain::{
    AutoAction, DriftSignal, DriftSignalId, DriftType, GuardrailAction, GuardrailEvent,
    GuardrailEventId, OutcomeId, OutcomeKind, Severity, SuggestionOutcome, TenantMlSettings,
};
use reconwarden_store::TenantStore;

use crate::stats::{HISTOGRAM_BINS, expected_calibration_error, population_stability_index};

pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const BASELINE_WINDOW_DAYS: i64 = 30;

pub const MIN_ACCURACY_SAMPLES: usize = 5;
pub const MIN_CALIBRATION_SAMPLES: usize = 10;
pub const MIN_PSI_SAMPLES: usize = 10;
pub const MIN_AUTO_CONFIRMED_SAMPLES: usize = 5;
pub const MIN_GUARDRAIL_EVENTS: usize = 10;

pub const ACCURACY_DROP_THRESHOLD: f64 = 0.05;
pub const ECE_THRESHOLD: f64 = 0.08;
pub const PSI_THRESHOLD: f64 = 0.25;
pub const INCORRECT_RATE_SPIKE_FACTOR: f64 = 2.0;
pub const FALSE_AUTO_RATE_THRESHOLD: f64 = 0.01;
pub const GUARDRAIL_BLOCK_RATE_THRESHOLD: f64 = 0.20;

/// Live metric view for the monitoring summary endpoint.
///
/// Computed from the same windows the detector uses, so dashboards and
/// alerting never disagree about what "recent" means.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot {
    pub recent_outcome_count: usize,
    pub recent_accuracy: Option<f64>,
    pub expected_calibration_error: Option<f64>,
    pub false_auto_rate: Option<f64>,
    pub guardrail_block_rate: Option<f64>,
}

pub struct DriftDetector {
    outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
    guardrails: Arc<dyn TenantStore<GuardrailEventId, GuardrailEvent>>,
    settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
}

struct Windows {
    recent: Vec<SuggestionOutcome>,
    baseline: Vec<SuggestionOutcome>,
}

impl DriftDetector {
    pub fn new(
        outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
        guardrails: Arc<dyn TenantStore<GuardrailEventId, GuardrailEvent>>,
        settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
    ) -> Self {
        Self {
            outcomes,
            guardrails,
            settings,
        }
    }

    /// Runs every drift check for one tenant.
    ///
    /// Returned signals are unpersisted and carry `auto_action_taken = none`;
    /// the governor stamps the real action when it records them.
    pub fn detect(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Vec<DriftSignal> {
        let model_version = self.model_version(tenant_id);
        let windows = self.windows(tenant_id, now);
        let recent_guardrails = self.recent_guardrails(tenant_id, now);

        let mut signals = Vec::new();
        let mut push = |signal: Option<DriftSignal>| {
            if let Some(s) = signal {
                signals.push(s);
            }
        };

        push(accuracy_drop_signal(&windows, tenant_id, &model_version, now));
        push(calibration_signal(&windows.recent, tenant_id, &model_version, now));
        push(feature_distribution_signal(&windows, tenant_id, &model_version, now));
        push(incorrect_rate_signal(&windows, tenant_id, &model_version, now));
        push(false_auto_signal(&windows.recent, tenant_id, &model_version, now));
        push(guardrail_block_signal(&recent_guardrails, tenant_id, &model_version, now));

        tracing::debug!(
            %tenant_id,
            signal_count = signals.len(),
            recent_outcomes = windows.recent.len(),
            baseline_outcomes = windows.baseline.len(),
            "drift detection pass complete"
        );
        signals
    }

    /// Live metrics over the recent window, for the monitoring summary.
    pub fn snapshot(&self, tenant_id: TenantId, now: DateTime<Utc>) -> MonitoringSnapshot {
        let windows = self.windows(tenant_id, now);
        let recent_guardrails = self.recent_guardrails(tenant_id, now);

        let calibration_samples: Vec<(f64, bool)> = windows
            .recent
            .iter()
            .map(|o| (o.predicted_probability(), o.was_correct()))
            .collect();

        MonitoringSnapshot {
            recent_outcome_count: windows.recent.len(),
            recent_accuracy: accuracy(&windows.recent),
            expected_calibration_error: expected_calibration_error(
                &calibration_samples,
                HISTOGRAM_BINS,
            ),
            false_auto_rate: false_auto_rate(&windows.recent),
            guardrail_block_rate: block_rate(&recent_guardrails),
        }
    }

    fn model_version(&self, tenant_id: TenantId) -> String {
        self.settings
            .get(tenant_id, &tenant_id)
            .unwrap_or_else(|| TenantMlSettings::default_for(tenant_id))
            .ml_model_version
    }

    fn windows(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Windows {
        let recent_start = now - Duration::days(RECENT_WINDOW_DAYS);
        let baseline_start = now - Duration::days(BASELINE_WINDOW_DAYS);

        let mut recent = Vec::new();
        let mut baseline = Vec::new();
        for outcome in self.outcomes.list(tenant_id) {
            if outcome.decided_at > now {
                continue;
            }
            if outcome.decided_at > recent_start {
                recent.push(outcome);
            } else if outcome.decided_at > baseline_start {
                baseline.push(outcome);
            }
        }
        Windows { recent, baseline }
    }

    fn recent_guardrails(&self, tenant_id: TenantId, now: DateTime<Utc>) -> Vec<GuardrailEvent> {
        let recent_start = now - Duration::days(RECENT_WINDOW_DAYS);
        self.guardrails
            .list(tenant_id)
            .into_iter()
            .filter(|e| e.occurred_at > recent_start && e.occurred_at <= now)
            .collect()
    }
}

fn signal(
    tenant_id: TenantId,
    model_version: &str,
    drift_type: DriftType,
    severity: Severity,
    metric: &str,
    baseline_value: f64,
    current_value: f64,
    details: serde_json::Value,
    now: DateTime<Utc>,
) -> DriftSignal {
    DriftSignal {
        id: DriftSignalId::new(),
        tenant_id,
        model_version: model_version.to_string(),
        drift_type,
        severity,
        metric: metric.to_string(),
        baseline_value,
        current_value,
        delta: current_value - baseline_value,
        details,
        auto_action_taken: AutoAction::None,
        detected_at: now,
        acknowledged_at: None,
        acknowledged_by: None,
    }
}

fn accuracy(outcomes: &[SuggestionOutcome]) -> Option<f64> {
    if outcomes.is_empty() {
        return None;
    }
    let correct = outcomes.iter().filter(|o| o.was_correct()).count();
    Some(correct as f64 / outcomes.len() as f64)
}

fn incorrect_rate(outcomes: &[SuggestionOutcome]) -> Option<f64> {
    accuracy(outcomes).map(|a| 1.0 - a)
}

fn false_auto_rate(outcomes: &[SuggestionOutcome]) -> Option<f64> {
    let auto: Vec<&SuggestionOutcome> = outcomes
        .iter()
        .filter(|o| o.outcome == OutcomeKind::AutoConfirmed)
        .collect();
    if auto.is_empty() {
        return None;
    }
    let wrong = auto.iter().filter(|o| !o.was_correct()).count();
    Some(wrong as f64 / auto.len() as f64)
}

fn block_rate(events: &[GuardrailEvent]) -> Option<f64> {
    if events.is_empty() {
        return None;
    }
    let blocked = events
        .iter()
        .filter(|e| e.action == GuardrailAction::Block)
        .count();
    Some(blocked as f64 / events.len() as f64)
}

fn accuracy_drop_signal(
    windows: &Windows,
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    if windows.recent.len() < MIN_ACCURACY_SAMPLES || windows.baseline.len() < MIN_ACCURACY_SAMPLES
    {
        return None;
    }
    let baseline = accuracy(&windows.baseline)?;
    let recent = accuracy(&windows.recent)?;
    let drop = baseline - recent;
    if drop <= ACCURACY_DROP_THRESHOLD {
        return None;
    }
    let severity = if drop > 0.15 {
        Severity::Critical
    } else if drop > 0.10 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::OutcomeShift,
        severity,
        "accuracy",
        baseline,
        recent,
        json!({
            "recent_samples": windows.recent.len(),
            "baseline_samples": windows.baseline.len(),
            "accuracy_drop": drop,
        }),
        now,
    ))
}

fn calibration_signal(
    recent: &[SuggestionOutcome],
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    if recent.len() < MIN_CALIBRATION_SAMPLES {
        return None;
    }
    let samples: Vec<(f64, bool)> = recent
        .iter()
        .map(|o| (o.predicted_probability(), o.was_correct()))
        .collect();
    let ece = expected_calibration_error(&samples, HISTOGRAM_BINS)?;
    if ece <= ECE_THRESHOLD {
        return None;
    }
    let severity = if ece > 0.15 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::ConfidenceCalibration,
        severity,
        "expected_calibration_error",
        ECE_THRESHOLD,
        ece,
        json!({
            "sample_count": recent.len(),
            "bins": HISTOGRAM_BINS,
        }),
        now,
    ))
}

fn feature_distribution_signal(
    windows: &Windows,
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    // Zero-outstanding invoices yield an infinite ratio; exclude them from
    // the histogram rather than poisoning the pooled range.
    let ratios = |outcomes: &[SuggestionOutcome]| -> Vec<f64> {
        outcomes
            .iter()
            .map(|o| o.rationale_snapshot.amount_diff_ratio())
            .filter(|r| r.is_finite())
            .collect()
    };
    let baseline = ratios(&windows.baseline);
    let current = ratios(&windows.recent);
    if baseline.len() < MIN_PSI_SAMPLES || current.len() < MIN_PSI_SAMPLES {
        return None;
    }
    let psi = population_stability_index(&baseline, &current, HISTOGRAM_BINS)?;
    if psi <= PSI_THRESHOLD {
        return None;
    }
    let severity = if psi > 0.5 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::FeatureDistribution,
        severity,
        "amount_diff_ratio_psi",
        PSI_THRESHOLD,
        psi,
        json!({
            "recent_samples": current.len(),
            "baseline_samples": baseline.len(),
            "bins": HISTOGRAM_BINS,
        }),
        now,
    ))
}

fn incorrect_rate_signal(
    windows: &Windows,
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    if windows.recent.len() < MIN_ACCURACY_SAMPLES || windows.baseline.len() < MIN_ACCURACY_SAMPLES
    {
        return None;
    }
    let baseline = incorrect_rate(&windows.baseline)?;
    let recent = incorrect_rate(&windows.recent)?;
    if baseline <= 0.0 || recent <= INCORRECT_RATE_SPIKE_FACTOR * baseline {
        return None;
    }
    let severity = if recent > 0.2 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::OutcomeShift,
        severity,
        "incorrect_rate",
        baseline,
        recent,
        json!({
            "recent_samples": windows.recent.len(),
            "baseline_samples": windows.baseline.len(),
            "spike_factor": INCORRECT_RATE_SPIKE_FACTOR,
        }),
        now,
    ))
}

fn false_auto_signal(
    recent: &[SuggestionOutcome],
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    let auto_count = recent
        .iter()
        .filter(|o| o.outcome == OutcomeKind::AutoConfirmed)
        .count();
    if auto_count < MIN_AUTO_CONFIRMED_SAMPLES {
        return None;
    }
    let rate = false_auto_rate(recent)?;
    if rate <= FALSE_AUTO_RATE_THRESHOLD {
        return None;
    }
    let severity = if rate > 0.05 {
        Severity::Critical
    } else if rate > 0.02 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::AutomationRisk,
        severity,
        "false_auto_rate",
        FALSE_AUTO_RATE_THRESHOLD,
        rate,
        json!({ "auto_confirmed_samples": auto_count }),
        now,
    ))
}

fn guardrail_block_signal(
    events: &[GuardrailEvent],
    tenant_id: TenantId,
    model_version: &str,
    now: DateTime<Utc>,
) -> Option<DriftSignal> {
    if events.len() < MIN_GUARDRAIL_EVENTS {
        return None;
    }
    let rate = block_rate(events)?;
    if rate <= GUARDRAIL_BLOCK_RATE_THRESHOLD {
        return None;
    }
    let severity = if rate > 0.4 {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(signal(
        tenant_id,
        model_version,
        DriftType::AutomationRisk,
        severity,
        "guardrail_block_rate",
        GUARDRAIL_BLOCK_RATE_THRESHOLD,
        rate,
        json!({ "event_count": events.len() }),
        now,
    ))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use reconwarden_core::{TenantId, UserId};

use crate::entity_id;

entity_id! {
    /// Identifier of a persisted drift signal.
    DriftSignalId
}

/// Category of statistical drift a signal reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftType {
    OutcomeShift,
    ConfidenceCalibration,
    FeatureDistribution,
    AutomationRisk,
}

/// Severity ladder driving the governor transition table.
///
/// Ordering matters: `low < medium < high < critical`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Automated response recorded on each persisted signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoAction {
    None,
    Warn,
    Limit,
    KillSwitch,
}

impl AutoAction {
    /// Response the governor takes for a given severity.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => AutoAction::KillSwitch,
            Severity::High => AutoAction::Limit,
            Severity::Medium => AutoAction::Warn,
            Severity::Low => AutoAction::None,
        }
    }
}

/// One fired drift signal, persisted for audit.
///
/// Mutated only by acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSignal {
    pub id: DriftSignalId,
    pub tenant_id: TenantId,
    pub model_version: String,
    pub drift_type: DriftType,
    pub severity: Severity,
    /// Metric name, e.g. `accuracy`, `expected_calibration_error`.
    pub metric: String,
    pub baseline_value: f64,
    pub current_value: f64,
    pub delta: f64,
    pub details: Value,
    pub auto_action_taken: AutoAction,
    pub detected_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<UserId>,
}

impl DriftSignal {
    pub fn acknowledge(&mut self, actor: UserId, now: DateTime<Utc>) {
        self.acknowledged_at = Some(now);
        self.acknowledged_by = Some(actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn auto_action_maps_from_severity() {
        assert_eq!(AutoAction::for_severity(Severity::Critical), AutoAction::KillSwitch);
        assert_eq!(AutoAction::for_severity(Severity::High), AutoAction::Limit);
        assert_eq!(AutoAction::for_severity(Severity::Medium), AutoAction::Warn);
        assert_eq!(AutoAction::for_severity(Severity::Low), AutoAction::None);
    }
}

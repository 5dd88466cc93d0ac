use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::drift::Severity;

pub const DEFAULT_MODEL_VERSION: &str = "heuristic-v1";

/// Automated-matching status for one tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MlStatus {
    Active,
    Limited,
    Disabled,
}

impl MlStatus {
    /// Total transition table `{ACTIVE, LIMITED, DISABLED} × Severity → MlStatus`.
    ///
    /// DISABLED is absorbing: only an explicit admin reset leaves it.
    pub fn transition(self, severity: Severity) -> MlStatus {
        match (self, severity) {
            (MlStatus::Disabled, _) => MlStatus::Disabled,
            (_, Severity::Critical) => MlStatus::Disabled,
            (_, Severity::High) => MlStatus::Limited,
            (status, Severity::Medium | Severity::Low) => status,
        }
    }
}

/// Singleton ML settings row per tenant.
///
/// Mutated only by the auto-response governor or an explicit admin reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMlSettings {
    pub tenant_id: TenantId,
    pub ml_enabled: bool,
    pub ml_status: MlStatus,
    pub ml_model_version: String,
    pub last_fallback_reason: Option<String>,
    pub last_fallback_at: Option<DateTime<Utc>>,
}

impl TenantMlSettings {
    /// Row used when a tenant has no persisted settings yet.
    pub fn default_for(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            ml_enabled: true,
            ml_status: MlStatus::Active,
            ml_model_version: DEFAULT_MODEL_VERSION.to_string(),
            last_fallback_reason: None,
            last_fallback_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_disables_from_any_state() {
        assert_eq!(MlStatus::Active.transition(Severity::Critical), MlStatus::Disabled);
        assert_eq!(MlStatus::Limited.transition(Severity::Critical), MlStatus::Disabled);
        assert_eq!(MlStatus::Disabled.transition(Severity::Critical), MlStatus::Disabled);
    }

    #[test]
    fn high_limits_but_never_reenables() {
        assert_eq!(MlStatus::Active.transition(Severity::High), MlStatus::Limited);
        assert_eq!(MlStatus::Limited.transition(Severity::High), MlStatus::Limited);
        assert_eq!(MlStatus::Disabled.transition(Severity::High), MlStatus::Disabled);
    }

    #[test]
    fn medium_and_low_leave_status_unchanged() {
        for status in [MlStatus::Active, MlStatus::Limited, MlStatus::Disabled] {
            assert_eq!(status.transition(Severity::Medium), status);
            assert_eq!(status.transition(Severity::Low), status);
        }
    }
}

//! Auto-response governor.
//!
//! Drives the per-tenant ML status state machine from detector output and
//! persists every fired signal, tagged with the action taken, for audit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use reconwarden_core::{DomainError, DomainResult, TenantId, UserId};
use reconwarden_domain::{
    AutoAction, DriftSignal, DriftSignalId, MlStatus, Severity, TenantMlSettings,
};
use reconwarden_store::TenantStore;

/// Outcome of one governor pass.
#[derive(Debug, Clone, Serialize)]
pub struct GovernorReport {
    pub signals: Vec<DriftSignal>,
    pub status_before: MlStatus,
    pub status_after: MlStatus,
    pub action: AutoAction,
}

pub struct AutoResponseGovernor {
    settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
    signals: Arc<dyn TenantStore<DriftSignalId, DriftSignal>>,
}

impl AutoResponseGovernor {
    pub fn new(
        settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
        signals: Arc<dyn TenantStore<DriftSignalId, DriftSignal>>,
    ) -> Self {
        Self { settings, signals }
    }

    /// Current settings row for a tenant, defaulting a fresh ACTIVE row when
    /// none has been persisted yet.
    pub fn settings_for(&self, tenant_id: TenantId) -> TenantMlSettings {
        self.settings
            .get(tenant_id, &tenant_id)
            .unwrap_or_else(|| TenantMlSettings::default_for(tenant_id))
    }

    /// Applies detector output to the tenant's ML status.
    ///
    /// The worst severity across the batch picks the transition; every signal
    /// is persisted tagged with the resulting action. With no signals this is
    /// a no-op that reports the current status.
    pub fn apply(
        &self,
        tenant_id: TenantId,
        signals: Vec<DriftSignal>,
        now: DateTime<Utc>,
    ) -> GovernorReport {
        let mut settings = self.settings_for(tenant_id);
        let status_before = settings.ml_status;

        let Some(max_severity) = signals.iter().map(|s| s.severity).max() else {
            return GovernorReport {
                signals,
                status_before,
                status_after: status_before,
                action: AutoAction::None,
            };
        };

        let action = AutoAction::for_severity(max_severity);
        let status_after = status_before.transition(max_severity);

        if action == AutoAction::KillSwitch && status_before != MlStatus::Disabled {
            let reason = signals
                .iter()
                .find(|s| s.severity == Severity::Critical)
                .map(|s| s.metric.clone())
                .unwrap_or_else(|| "critical drift".to_string());
            tracing::warn!(
                %tenant_id,
                governor_action = "kill_switch",
                metric = %reason,
                "critical drift detected, disabling automated matching"
            );
            settings.ml_enabled = false;
            settings.last_fallback_reason = Some(reason);
            settings.last_fallback_at = Some(now);
        } else if status_after != status_before {
            tracing::warn!(
                %tenant_id,
                governor_action = "limit",
                ?status_before,
                ?status_after,
                "drift detected, limiting automated matching"
            );
        }

        settings.ml_status = status_after;
        self.settings.upsert(tenant_id, tenant_id, settings);

        let mut tagged = Vec::with_capacity(signals.len());
        for mut signal in signals {
            signal.auto_action_taken = action;
            self.signals
                .upsert(tenant_id, signal.id, signal.clone());
            tagged.push(signal);
        }

        GovernorReport {
            signals: tagged,
            status_before,
            status_after,
            action,
        }
    }

    /// Signal history for a tenant, newest first.
    pub fn signal_history(&self, tenant_id: TenantId, limit: usize) -> Vec<DriftSignal> {
        let mut signals = self.signals.list(tenant_id);
        signals.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        signals.truncate(limit);
        signals
    }

    /// Marks a persisted signal as reviewed by an operator.
    pub fn acknowledge(
        &self,
        tenant_id: TenantId,
        signal_id: DriftSignalId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<DriftSignal> {
        let mut signal = self
            .signals
            .get(tenant_id, &signal_id)
            .ok_or_else(DomainError::not_found)?;
        signal.acknowledge(actor, now);
        self.signals.upsert(tenant_id, signal_id, signal.clone());
        Ok(signal)
    }

    /// Explicit admin reset, the only path out of DISABLED.
    ///
    /// Only ACTIVE and LIMITED are valid targets; `ml_enabled` follows the
    /// target status and the fallback audit fields are cleared.
    pub fn reset(&self, tenant_id: TenantId, status: MlStatus) -> DomainResult<TenantMlSettings> {
        if status == MlStatus::Disabled {
            return Err(DomainError::validation(
                "reset target must be ACTIVE or LIMITED",
            ));
        }

        let mut settings = self.settings_for(tenant_id);
        tracing::info!(
            %tenant_id,
            status_before = ?settings.ml_status,
            status_after = ?status,
            "ml status reset by admin"
        );
        settings.ml_status = status;
        settings.ml_enabled = status == MlStatus::Active;
        settings.last_fallback_reason = None;
        settings.last_fallback_at = None;
        self.settings.upsert(tenant_id, tenant_id, settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconwarden_domain::DriftType;
    use reconwarden_store::InMemoryTenantStore;
    use serde_json::json;

    fn governor() -> (
        AutoResponseGovernor,
        Arc<InMemoryTenantStore<TenantId, TenantMlSettings>>,
        Arc<InMemoryTenantStore<DriftSignalId, DriftSignal>>,
    ) {
        let settings: Arc<InMemoryTenantStore<TenantId, TenantMlSettings>> =
            Arc::new(InMemoryTenantStore::new());
        let signals: Arc<InMemoryTenantStore<DriftSignalId, DriftSignal>> =
            Arc::new(InMemoryTenantStore::new());
        (
            AutoResponseGovernor::new(settings.clone(), signals.clone()),
            settings,
            signals,
        )
    }

    fn signal(tenant_id: TenantId, severity: Severity, metric: &str) -> DriftSignal {
        DriftSignal {
            id: DriftSignalId::new(),
            tenant_id,
            model_version: "heuristic-v1".to_string(),
            drift_type: DriftType::OutcomeShift,
            severity,
            metric: metric.to_string(),
            baseline_value: 0.9,
            current_value: 0.7,
            delta: -0.2,
            details: json!({}),
            auto_action_taken: AutoAction::None,
            detected_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
        }
    }

    #[test]
    fn critical_signal_pulls_the_kill_switch() {
        let (governor, _, signal_store) = governor();
        let tenant_id = TenantId::new();
        let now = Utc::now();

        let report = governor.apply(
            tenant_id,
            vec![
                signal(tenant_id, Severity::Medium, "incorrect_rate"),
                signal(tenant_id, Severity::Critical, "accuracy"),
            ],
            now,
        );

        assert_eq!(report.status_before, MlStatus::Active);
        assert_eq!(report.status_after, MlStatus::Disabled);
        assert_eq!(report.action, AutoAction::KillSwitch);

        let settings = governor.settings_for(tenant_id);
        assert!(!settings.ml_enabled);
        assert_eq!(settings.last_fallback_reason.as_deref(), Some("accuracy"));
        assert_eq!(settings.last_fallback_at, Some(now));

        let persisted = signal_store.list(tenant_id);
        assert_eq!(persisted.len(), 2);
        assert!(persisted
            .iter()
            .all(|s| s.auto_action_taken == AutoAction::KillSwitch));
    }

    #[test]
    fn high_severity_limits_without_disabling() {
        let (governor, _, _) = governor();
        let tenant_id = TenantId::new();

        let report = governor.apply(
            tenant_id,
            vec![signal(tenant_id, Severity::High, "expected_calibration_error")],
            Utc::now(),
        );

        assert_eq!(report.status_after, MlStatus::Limited);
        assert_eq!(report.action, AutoAction::Limit);
        assert!(governor.settings_for(tenant_id).ml_enabled);
    }

    #[test]
    fn medium_severity_warns_but_keeps_status() {
        let (governor, _, signal_store) = governor();
        let tenant_id = TenantId::new();

        let report = governor.apply(
            tenant_id,
            vec![signal(tenant_id, Severity::Medium, "guardrail_block_rate")],
            Utc::now(),
        );

        assert_eq!(report.status_after, MlStatus::Active);
        assert_eq!(report.action, AutoAction::Warn);
        assert_eq!(signal_store.list(tenant_id).len(), 1);
    }

    #[test]
    fn empty_batch_changes_nothing_and_persists_nothing() {
        let (governor, settings_store, signal_store) = governor();
        let tenant_id = TenantId::new();

        let report = governor.apply(tenant_id, vec![], Utc::now());

        assert_eq!(report.status_after, MlStatus::Active);
        assert_eq!(report.action, AutoAction::None);
        assert!(settings_store.get(tenant_id, &tenant_id).is_none());
        assert!(signal_store.list(tenant_id).is_empty());
    }

    #[test]
    fn disabled_is_absorbing_until_admin_reset() {
        let (governor, _, _) = governor();
        let tenant_id = TenantId::new();
        let now = Utc::now();

        governor.apply(tenant_id, vec![signal(tenant_id, Severity::Critical, "accuracy")], now);
        // A later healthy-looking high signal must not re-enable anything.
        let report = governor.apply(
            tenant_id,
            vec![signal(tenant_id, Severity::High, "incorrect_rate")],
            now,
        );
        assert_eq!(report.status_before, MlStatus::Disabled);
        assert_eq!(report.status_after, MlStatus::Disabled);

        let settings = governor.reset(tenant_id, MlStatus::Active).unwrap();
        assert_eq!(settings.ml_status, MlStatus::Active);
        assert!(settings.ml_enabled);
        assert_eq!(settings.last_fallback_reason, None);
        assert_eq!(settings.last_fallback_at, None);
    }

    #[test]
    fn reset_to_limited_keeps_ml_disabled_for_auto_confirm() {
        let (governor, _, _) = governor();
        let tenant_id = TenantId::new();

        let settings = governor.reset(tenant_id, MlStatus::Limited).unwrap();
        assert_eq!(settings.ml_status, MlStatus::Limited);
        assert!(!settings.ml_enabled);
    }

    #[test]
    fn reset_to_disabled_is_rejected() {
        let (governor, _, _) = governor();
        let err = governor.reset(TenantId::new(), MlStatus::Disabled).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn acknowledge_stamps_actor_and_time() {
        let (governor, _, _) = governor();
        let tenant_id = TenantId::new();
        let now = Utc::now();
        let actor = UserId::new();

        let report = governor.apply(
            tenant_id,
            vec![signal(tenant_id, Severity::Medium, "incorrect_rate")],
            now,
        );
        let id = report.signals[0].id;

        let acked = governor.acknowledge(tenant_id, id, actor, now).unwrap();
        assert_eq!(acked.acknowledged_at, Some(now));
        assert_eq!(acked.acknowledged_by, Some(actor));
    }

    #[test]
    fn acknowledging_an_unknown_signal_is_not_found() {
        let (governor, _, _) = governor();
        let err = governor
            .acknowledge(TenantId::new(), DriftSignalId::new(), UserId::new(), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn signal_history_is_newest_first_and_capped() {
        let (governor, _, _) = governor();
        let tenant_id = TenantId::new();
        let now = Utc::now();

        for i in 0..5 {
            let mut s = signal(tenant_id, Severity::Medium, "incorrect_rate");
            s.detected_at = now - chrono::Duration::minutes(i);
            governor.apply(tenant_id, vec![s], now);
        }

        let history = governor.signal_history(tenant_id, 3);
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].detected_at >= w[1].detected_at));
    }
}

//! Calibration reporting.
//!
//! Read-only aggregation of historical outcomes into empirical success-rate
//! statistics; no state transitions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;
use reconwarden_domain::{OutcomeId, OutcomeKind, SuggestionOutcome};
use reconwarden_store::TenantStore;

/// Window of most-recent outcomes the reporter tallies.
pub const RECENT_OUTCOME_LIMIT: usize = 100;

/// Externally maintained per-tenant calibration aggregate, keyed by model
/// version. This core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStatsRecord {
    pub model_version: String,
    pub sample_count: u64,
    pub expected_calibration_error: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub total: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub timed_out: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub calibration_stats: Option<CalibrationStatsRecord>,
    pub recent_outcomes: OutcomeTally,
    /// `100 × confirmed / total`; `0.0` (not NaN) for an empty window.
    pub empirical_success_rate: f64,
}

pub struct CalibrationReporter {
    outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
    calibration_stats: Arc<dyn TenantStore<String, CalibrationStatsRecord>>,
}

impl CalibrationReporter {
    pub fn new(
        outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
        calibration_stats: Arc<dyn TenantStore<String, CalibrationStatsRecord>>,
    ) -> Self {
        Self {
            outcomes,
            calibration_stats,
        }
    }

    pub fn report(&self, tenant_id: TenantId, model_version: &str) -> CalibrationReport {
        let calibration_stats = self
            .calibration_stats
            .get(tenant_id, &model_version.to_string());

        let mut outcomes = self.outcomes.list(tenant_id);
        outcomes.sort_by(|a, b| b.decided_at.cmp(&a.decided_at));
        outcomes.truncate(RECENT_OUTCOME_LIMIT);

        let mut tally = OutcomeTally::default();
        for outcome in &outcomes {
            tally.total += 1;
            match outcome.outcome {
                OutcomeKind::ConfirmedManual | OutcomeKind::AutoConfirmed => tally.confirmed += 1,
                OutcomeKind::Rejected => tally.rejected += 1,
                OutcomeKind::TimedOut => tally.timed_out += 1,
            }
        }

        let empirical_success_rate = if tally.total == 0 {
            0.0
        } else {
            100.0 * tally.confirmed as f64 / tally.total as f64
        };

        CalibrationReport {
            calibration_stats,
            recent_outcomes: tally,
            empirical_success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconwarden_core::UserId;
    use reconwarden_domain::{
        AmountBand, AmountMatch, DateMatch, ExceptionId, FinalResult, MatchRationale, SuggestionId,
        TextMatch,
    };
    use reconwarden_store::InMemoryTenantStore;

    fn outcome(tenant_id: TenantId, kind: OutcomeKind, decided_at: DateTime<Utc>) -> SuggestionOutcome {
        SuggestionOutcome {
            id: OutcomeId::new(),
            tenant_id,
            suggestion_id: SuggestionId::new(),
            exception_id: ExceptionId::new(),
            outcome: kind,
            confidence_at_time: 70,
            final_result: if kind == OutcomeKind::Rejected {
                FinalResult::Incorrect
            } else {
                FinalResult::Correct
            },
            rationale_snapshot: MatchRationale {
                amount: AmountMatch {
                    diff_ratio: 0.01,
                    band: AmountBand::Exact,
                    score: 40,
                },
                text: TextMatch::None,
                date: DateMatch { day_diff: 1, score: 15 },
            },
            decided_by: UserId::new(),
            decided_at,
        }
    }

    fn reporter_with(
        outcomes: Vec<SuggestionOutcome>,
        tenant_id: TenantId,
    ) -> CalibrationReporter {
        let store: Arc<InMemoryTenantStore<OutcomeId, SuggestionOutcome>> =
            Arc::new(InMemoryTenantStore::new());
        for o in outcomes {
            store.upsert(tenant_id, o.id, o);
        }
        CalibrationReporter::new(store, Arc::new(InMemoryTenantStore::new()))
    }

    #[test]
    fn success_rate_is_confirmed_over_total() {
        let tenant_id = TenantId::new();
        let now = Utc::now();
        let rows = vec![
            outcome(tenant_id, OutcomeKind::ConfirmedManual, now),
            outcome(tenant_id, OutcomeKind::AutoConfirmed, now),
            outcome(tenant_id, OutcomeKind::Rejected, now),
            outcome(tenant_id, OutcomeKind::TimedOut, now),
        ];
        let report = reporter_with(rows, tenant_id).report(tenant_id, "heuristic-v1");

        assert_eq!(report.recent_outcomes.total, 4);
        assert_eq!(report.recent_outcomes.confirmed, 2);
        assert_eq!(report.recent_outcomes.rejected, 1);
        assert_eq!(report.recent_outcomes.timed_out, 1);
        assert!((report.empirical_success_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_reports_zero_not_nan() {
        let tenant_id = TenantId::new();
        let report = reporter_with(vec![], tenant_id).report(tenant_id, "heuristic-v1");
        assert_eq!(report.recent_outcomes.total, 0);
        assert_eq!(report.empirical_success_rate, 0.0);
    }

    #[test]
    fn tally_is_capped_to_the_recent_window() {
        let tenant_id = TenantId::new();
        let now = Utc::now();
        let rows = (0..(RECENT_OUTCOME_LIMIT + 20))
            .map(|i| {
                outcome(
                    tenant_id,
                    OutcomeKind::ConfirmedManual,
                    now - chrono::Duration::minutes(i as i64),
                )
            })
            .collect();
        let report = reporter_with(rows, tenant_id).report(tenant_id, "heuristic-v1");
        assert_eq!(report.recent_outcomes.total, RECENT_OUTCOME_LIMIT);
    }
}

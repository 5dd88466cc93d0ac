use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::{TenantId, UserId};

use crate::entity_id;
use crate::exception::ExceptionId;
use crate::rationale::MatchRationale;
use crate::suggestion::SuggestionId;

entity_id! {
    /// Identifier of a suggestion outcome record.
    OutcomeId
}

/// How a suggestion was disposed of.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    ConfirmedManual,
    AutoConfirmed,
    Rejected,
    TimedOut,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalResult {
    Correct,
    Incorrect,
}

/// Append-only audit record of a suggestion disposition.
///
/// The sole input to drift detection and calibration reporting; never mutated
/// or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOutcome {
    pub id: OutcomeId,
    pub tenant_id: TenantId,
    pub suggestion_id: SuggestionId,
    pub exception_id: ExceptionId,
    pub outcome: OutcomeKind,
    /// Confidence the suggestion carried when the decision was made, in [0, 100].
    pub confidence_at_time: u8,
    pub final_result: FinalResult,
    pub rationale_snapshot: MatchRationale,
    pub decided_by: UserId,
    pub decided_at: DateTime<Utc>,
}

impl SuggestionOutcome {
    /// Predicted confidence rescaled to [0, 1] for calibration math.
    pub fn predicted_probability(&self) -> f64 {
        f64::from(self.confidence_at_time) / 100.0
    }

    pub fn was_correct(&self) -> bool {
        self.final_result == FinalResult::Correct
    }
}

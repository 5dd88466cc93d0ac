use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::entity_id;

entity_id! {
    /// Identifier of a guardrail event.
    GuardrailEventId
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardrailAction {
    Allow,
    Block,
    Review,
}

/// One entry of the external guardrail log, consumed read-only by the
/// automation-risk drift signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailEvent {
    pub id: GuardrailEventId,
    pub tenant_id: TenantId,
    pub action: GuardrailAction,
    pub rule: String,
    pub occurred_at: DateTime<Utc>,
}

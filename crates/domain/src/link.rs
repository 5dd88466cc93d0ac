use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::bank::BankTransactionId;
use crate::entity_id;
use crate::invoice::InvoiceId;
use crate::suggestion::Suggestion;

entity_id! {
    /// Identifier of a reconciliation link.
    ReconciliationLinkId
}

entity_id! {
    /// Identifier of a settlement allocation.
    SettlementAllocationId
}

/// Immutable audit record created when a suggestion is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationLink {
    pub id: ReconciliationLinkId,
    pub tenant_id: TenantId,
    pub bank_transaction_id: Option<BankTransactionId>,
    pub invoice_id: Option<InvoiceId>,
    pub matched_amount_minor: i64,
    pub confidence: u8,
    pub match_type: String,
    pub match_source: String,
    pub created_at: DateTime<Utc>,
}

impl ReconciliationLink {
    pub const MATCH_TYPE_SUGGESTED: &'static str = "suggested";
    pub const MATCH_SOURCE_EXCEPTION_SUGGESTION: &'static str = "exception_suggestion";

    /// Build the link a confirmed suggestion produces.
    pub fn from_suggestion(suggestion: &Suggestion, now: DateTime<Utc>) -> Self {
        Self {
            id: ReconciliationLinkId::new(),
            tenant_id: suggestion.tenant_id,
            bank_transaction_id: suggestion.bank_transaction_id,
            invoice_id: suggestion.invoice_id,
            matched_amount_minor: suggestion.suggested_amount_minor,
            confidence: suggestion.confidence,
            match_type: Self::MATCH_TYPE_SUGGESTED.to_string(),
            match_source: Self::MATCH_SOURCE_EXCEPTION_SUGGESTION.to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationKind {
    Principal,
}

/// Allocation of a confirmed amount to one invoice.
///
/// Secondary write: created best-effort alongside a [`ReconciliationLink`]. A
/// missing allocation is repairable after the fact by re-deriving it from the
/// link, which is the authoritative record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAllocation {
    pub id: SettlementAllocationId,
    pub tenant_id: TenantId,
    pub reconciliation_link_id: ReconciliationLinkId,
    pub invoice_id: InvoiceId,
    pub amount_minor: i64,
    pub kind: AllocationKind,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::bank::BankTransactionId;
use crate::entity_id;
use crate::exception::ExceptionId;
use crate::invoice::InvoiceId;
use crate::rationale::MatchRationale;

entity_id! {
    /// Identifier of a generated match suggestion.
    SuggestionId
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionType {
    /// One bank transaction settles one invoice.
    BankToInvoice,
    /// One bank transaction settles several invoices.
    BankSplitToInvoices,
    /// An overdue invoice expects an incoming bank transaction.
    InvoiceExpectBank,
}

/// A proposed match for one open exception.
///
/// Derived state: regenerated wholesale on every generation pass and consumed
/// exactly once by confirm/reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub tenant_id: TenantId,
    pub exception_id: ExceptionId,
    pub bank_transaction_id: Option<BankTransactionId>,
    pub invoice_id: Option<InvoiceId>,
    pub suggestion_type: SuggestionType,
    /// Confidence score in [0, 100].
    pub confidence: u8,
    pub suggested_amount_minor: i64,
    pub currency: String,
    pub rationale: MatchRationale,
    pub created_at: DateTime<Utc>,
}

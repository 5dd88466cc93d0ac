use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::entity_id;

entity_id! {
    /// Identifier of an ingested bank transaction.
    BankTransactionId
}

/// An ingested bank statement line. Immutable once ingested.
///
/// `matched_amount_minor` is derived from the external match-state view and
/// supplied alongside the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: BankTransactionId,
    pub tenant_id: TenantId,
    /// Signed amount in minor units (negative for outgoing).
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub reference: Option<String>,
    pub transaction_date: NaiveDate,
    pub matched_amount_minor: i64,
}

impl BankTransaction {
    /// Amount still available for matching on an incoming transaction.
    pub fn available_minor(&self) -> i64 {
        self.amount_minor - self.matched_amount_minor
    }

    /// Unmatched remainder regardless of sign (partial-match handling).
    pub fn remaining_minor(&self) -> i64 {
        self.amount_minor.abs() - self.matched_amount_minor
    }

    pub fn is_fully_matched(&self) -> bool {
        self.matched_amount_minor >= self.amount_minor.abs()
    }
}

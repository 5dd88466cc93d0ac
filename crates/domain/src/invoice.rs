use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use reconwarden_core::TenantId;

use crate::entity_id;

entity_id! {
    /// Identifier of an accounts-receivable invoice.
    InvoiceId
}

/// An outstanding invoice as seen by the candidate repository.
///
/// `paid_amount_settled_minor` is derived from settlement allocations owned by
/// the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub invoice_number: String,
    pub customer_name: String,
    pub total_amount_minor: i64,
    pub paid_amount_settled_minor: i64,
    pub due_date: NaiveDate,
    pub issue_date: NaiveDate,
}

impl Invoice {
    pub fn outstanding_minor(&self) -> i64 {
        self.total_amount_minor - self.paid_amount_settled_minor
    }
}

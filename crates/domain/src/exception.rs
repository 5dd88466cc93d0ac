use serde::{Deserialize, Serialize};

use reconwarden_core::{EntityId, TenantId};

use crate::entity_id;

entity_id! {
    /// Identifier of a reconciliation exception.
    ExceptionId
}

/// Kind of unresolved reconciliation discrepancy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionType {
    /// A bank transaction with no matched invoice.
    OrphanBankTxn,
    /// An invoice past due with no incoming payment matched.
    ArOverdue,
    /// A partially matched bank transaction that stopped progressing.
    PartialMatchStuck,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionStatus {
    Open,
    Resolved,
}

/// An unresolved reconciliation discrepancy awaiting a suggested fix.
///
/// Created by the upstream reconciliation scan; resolved by the suggestion
/// lifecycle on confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub id: ExceptionId,
    pub tenant_id: TenantId,
    pub exception_type: ExceptionType,
    /// The bank transaction or invoice this exception points at, depending on
    /// `exception_type`.
    pub ref_id: EntityId,
    pub status: ExceptionStatus,
}

impl Exception {
    pub fn is_resolved(&self) -> bool {
        self.status == ExceptionStatus::Resolved
    }

    pub fn resolve(&mut self) {
        self.status = ExceptionStatus::Resolved;
    }
}

//! Suggestion lifecycle: confirm and reject.
//!
//! Both terminal dispositions consume the suggestion and append exactly one
//! outcome record, the ground truth the drift monitor runs on.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use reconwarden_core::{DomainError, DomainResult, TenantId, UserId};
use reconwarden_domain::{
    AllocationKind, Exception, ExceptionId, FinalResult, OutcomeId, OutcomeKind,
    ReconciliationLink, ReconciliationLinkId, SettlementAllocation, SettlementAllocationId,
    Suggestion, SuggestionId, SuggestionOutcome,
};
use reconwarden_store::{AllocationSink, TenantStore};

/// Result of a successful confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmReceipt {
    pub link: ReconciliationLink,
    pub exception_resolved: bool,
}

pub struct LifecycleManager {
    suggestions: Arc<dyn TenantStore<SuggestionId, Suggestion>>,
    exceptions: Arc<dyn TenantStore<ExceptionId, Exception>>,
    links: Arc<dyn TenantStore<ReconciliationLinkId, ReconciliationLink>>,
    outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
    allocations: Arc<dyn AllocationSink>,
}

impl LifecycleManager {
    pub fn new(
        suggestions: Arc<dyn TenantStore<SuggestionId, Suggestion>>,
        exceptions: Arc<dyn TenantStore<ExceptionId, Exception>>,
        links: Arc<dyn TenantStore<ReconciliationLinkId, ReconciliationLink>>,
        outcomes: Arc<dyn TenantStore<OutcomeId, SuggestionOutcome>>,
        allocations: Arc<dyn AllocationSink>,
    ) -> Self {
        Self {
            suggestions,
            exceptions,
            links,
            outcomes,
            allocations,
        }
    }

    /// Confirm a suggestion: create the reconciliation link, best-effort the
    /// settlement allocation, record the outcome, resolve the exception and
    /// consume the suggestion.
    ///
    /// Confirmation by a human is treated as ground truth at decision time
    /// (`final_result = CORRECT`).
    pub fn confirm(
        &self,
        tenant_id: TenantId,
        suggestion_id: SuggestionId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<ConfirmReceipt> {
        let suggestion = self
            .suggestions
            .get(tenant_id, &suggestion_id)
            .ok_or(DomainError::NotFound)?;

        let mut exception = self
            .exceptions
            .get(tenant_id, &suggestion.exception_id)
            .ok_or_else(|| DomainError::conflict("exception missing for suggestion"))?;
        if exception.is_resolved() {
            return Err(DomainError::conflict("exception already resolved"));
        }

        // Consume-once guard: a concurrent confirm that lost the race observes
        // NotFound here instead of double-writing.
        let suggestion = self
            .suggestions
            .remove(tenant_id, &suggestion_id)
            .ok_or(DomainError::NotFound)?;

        let link = ReconciliationLink::from_suggestion(&suggestion, now);
        self.links.upsert(tenant_id, link.id, link.clone());

        // Second saga step, deliberately non-atomic: the link above is the
        // authoritative record and a missing allocation can be re-derived from
        // it by the repair job.
        if let Some(invoice_id) = suggestion.invoice_id {
            let allocation = SettlementAllocation {
                id: SettlementAllocationId::new(),
                tenant_id,
                reconciliation_link_id: link.id,
                invoice_id,
                amount_minor: suggestion.suggested_amount_minor,
                kind: AllocationKind::Principal,
                created_at: now,
            };
            if let Err(e) = self.allocations.record(tenant_id, allocation) {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    reconciliation_link_id = %link.id,
                    error = %e,
                    "settlement allocation write failed, continuing (repairable from link)"
                );
            }
        }

        self.record_outcome(
            &suggestion,
            OutcomeKind::ConfirmedManual,
            FinalResult::Correct,
            actor,
            now,
        );

        exception.resolve();
        self.exceptions.upsert(tenant_id, exception.id, exception);

        Ok(ConfirmReceipt {
            link,
            exception_resolved: true,
        })
    }

    /// Reject a suggestion: record the outcome and consume the suggestion.
    /// The exception stays open for regeneration or manual handling.
    pub fn reject(
        &self,
        tenant_id: TenantId,
        suggestion_id: SuggestionId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let suggestion = self
            .suggestions
            .remove(tenant_id, &suggestion_id)
            .ok_or(DomainError::NotFound)?;

        self.record_outcome(
            &suggestion,
            OutcomeKind::Rejected,
            FinalResult::Incorrect,
            actor,
            now,
        );
        Ok(())
    }

    fn record_outcome(
        &self,
        suggestion: &Suggestion,
        outcome: OutcomeKind,
        final_result: FinalResult,
        actor: UserId,
        now: DateTime<Utc>,
    ) {
        let record = SuggestionOutcome {
            id: OutcomeId::new(),
            tenant_id: suggestion.tenant_id,
            suggestion_id: suggestion.id,
            exception_id: suggestion.exception_id,
            outcome,
            confidence_at_time: suggestion.confidence,
            final_result,
            rationale_snapshot: suggestion.rationale,
            decided_by: actor,
            decided_at: now,
        };
        self.outcomes
            .upsert(suggestion.tenant_id, record.id, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconwarden_domain::{
        AmountBand, AmountMatch, DateMatch, ExceptionStatus, ExceptionType, MatchRationale,
        SuggestionType, TextMatch,
    };
    use reconwarden_store::{InMemoryAllocationSink, InMemoryTenantStore, StoreError};

    struct Fixture {
        tenant_id: TenantId,
        suggestions: Arc<InMemoryTenantStore<SuggestionId, Suggestion>>,
        exceptions: Arc<InMemoryTenantStore<ExceptionId, Exception>>,
        links: Arc<InMemoryTenantStore<ReconciliationLinkId, ReconciliationLink>>,
        outcomes: Arc<InMemoryTenantStore<OutcomeId, SuggestionOutcome>>,
        allocations: Arc<InMemoryAllocationSink>,
        manager: LifecycleManager,
    }

    impl Fixture {
        fn new() -> Self {
            let suggestions = Arc::new(InMemoryTenantStore::new());
            let exceptions = Arc::new(InMemoryTenantStore::new());
            let links = Arc::new(InMemoryTenantStore::new());
            let outcomes = Arc::new(InMemoryTenantStore::new());
            let allocations = Arc::new(InMemoryAllocationSink::new());
            let manager = LifecycleManager::new(
                suggestions.clone(),
                exceptions.clone(),
                links.clone(),
                outcomes.clone(),
                allocations.clone(),
            );
            Self {
                tenant_id: TenantId::new(),
                suggestions,
                exceptions,
                links,
                outcomes,
                allocations,
                manager,
            }
        }

        fn seed(&self, exception_status: ExceptionStatus) -> Suggestion {
            let exception = Exception {
                id: ExceptionId::new(),
                tenant_id: self.tenant_id,
                exception_type: ExceptionType::OrphanBankTxn,
                ref_id: reconwarden_core::EntityId::new(),
                status: exception_status,
            };
            self.exceptions
                .upsert(self.tenant_id, exception.id, exception.clone());

            let suggestion = Suggestion {
                id: SuggestionId::new(),
                tenant_id: self.tenant_id,
                exception_id: exception.id,
                bank_transaction_id: None,
                invoice_id: Some(reconwarden_domain::InvoiceId::new()),
                suggestion_type: SuggestionType::BankToInvoice,
                confidence: 85,
                suggested_amount_minor: 125_00,
                currency: "EUR".to_string(),
                rationale: MatchRationale {
                    amount: AmountMatch {
                        diff_ratio: 0.0,
                        band: AmountBand::Exact,
                        score: 40,
                    },
                    text: TextMatch::InvoiceNumber { score: 30 },
                    date: DateMatch { day_diff: 0, score: 15 },
                },
                created_at: Utc::now(),
            };
            self.suggestions
                .upsert(self.tenant_id, suggestion.id, suggestion.clone());
            suggestion
        }
    }

    #[test]
    fn confirm_creates_link_allocation_outcome_and_resolves_exception() {
        let f = Fixture::new();
        let suggestion = f.seed(ExceptionStatus::Open);
        let actor = UserId::new();

        let receipt = f
            .manager
            .confirm(f.tenant_id, suggestion.id, actor, Utc::now())
            .unwrap();

        assert_eq!(receipt.link.matched_amount_minor, 125_00);
        assert_eq!(receipt.link.confidence, 85);
        assert_eq!(receipt.link.match_source, "exception_suggestion");
        assert!(receipt.exception_resolved);

        assert_eq!(f.links.list(f.tenant_id).len(), 1);
        assert_eq!(f.allocations.list(f.tenant_id).len(), 1);
        assert!(f.suggestions.get(f.tenant_id, &suggestion.id).is_none());

        let outcomes = f.outcomes.list(f.tenant_id);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].outcome, OutcomeKind::ConfirmedManual);
        assert_eq!(outcomes[0].final_result, FinalResult::Correct);
        assert_eq!(outcomes[0].confidence_at_time, 85);
        assert_eq!(outcomes[0].decided_by, actor);

        let exception = f
            .exceptions
            .get(f.tenant_id, &suggestion.exception_id)
            .unwrap();
        assert!(exception.is_resolved());
    }

    #[test]
    fn confirm_on_resolved_exception_is_a_conflict_and_writes_nothing() {
        let f = Fixture::new();
        let suggestion = f.seed(ExceptionStatus::Resolved);

        let err = f
            .manager
            .confirm(f.tenant_id, suggestion.id, UserId::new(), Utc::now())
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(f.links.list(f.tenant_id).is_empty());
        assert!(f.outcomes.list(f.tenant_id).is_empty());
    }

    #[test]
    fn second_confirm_observes_not_found() {
        let f = Fixture::new();
        let suggestion = f.seed(ExceptionStatus::Open);

        f.manager
            .confirm(f.tenant_id, suggestion.id, UserId::new(), Utc::now())
            .unwrap();
        let err = f
            .manager
            .confirm(f.tenant_id, suggestion.id, UserId::new(), Utc::now())
            .unwrap_err();

        assert_eq!(err, DomainError::NotFound);
        assert_eq!(f.links.list(f.tenant_id).len(), 1);
        assert_eq!(f.outcomes.list(f.tenant_id).len(), 1);
    }

    #[test]
    fn reject_records_outcome_and_leaves_exception_open() {
        let f = Fixture::new();
        let suggestion = f.seed(ExceptionStatus::Open);

        f.manager
            .reject(f.tenant_id, suggestion.id, UserId::new(), Utc::now())
            .unwrap();

        assert!(f.suggestions.get(f.tenant_id, &suggestion.id).is_none());
        let outcomes = f.outcomes.list(f.tenant_id);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].outcome, OutcomeKind::Rejected);
        assert_eq!(outcomes[0].final_result, FinalResult::Incorrect);

        let exception = f
            .exceptions
            .get(f.tenant_id, &suggestion.exception_id)
            .unwrap();
        assert!(!exception.is_resolved());
    }

    struct FailingSink;

    impl AllocationSink for FailingSink {
        fn record(
            &self,
            _tenant_id: TenantId,
            _allocation: SettlementAllocation,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn allocation_failure_does_not_roll_back_the_link() {
        let f = Fixture::new();
        let suggestion = f.seed(ExceptionStatus::Open);
        let manager = LifecycleManager::new(
            f.suggestions.clone(),
            f.exceptions.clone(),
            f.links.clone(),
            f.outcomes.clone(),
            Arc::new(FailingSink),
        );

        let receipt = manager
            .confirm(f.tenant_id, suggestion.id, UserId::new(), Utc::now())
            .unwrap();

        assert_eq!(f.links.list(f.tenant_id).len(), 1);
        assert_eq!(f.outcomes.list(f.tenant_id).len(), 1);
        assert!(receipt.exception_resolved);
    }
}

//! Suggestion generation.
//!
//! One generic coarse-filter-then-score pass serves all three exception types;
//! only the pivot side and the candidate pool differ per branch.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use reconwarden_core::{DomainError, DomainResult, TenantId};
use reconwarden_domain::{
    BankTransaction, BankTransactionId, Exception, ExceptionId, ExceptionType, Invoice, InvoiceId,
    MatchRationale, MlStatus, Suggestion, SuggestionId, SuggestionType, TenantMlSettings,
};
use reconwarden_store::TenantStore;

use crate::scorer::{ScoreInput, score, SCORE_ADMISSION_THRESHOLD};

/// Candidate pools are capped at the most recent rows to bound query cost.
pub const CANDIDATE_POOL_CAP: usize = 50;

/// At most this many suggestions survive a generation pass.
pub const MAX_SUGGESTIONS: usize = 5;

/// Coarse pre-filter tolerance, as a fraction of the pivot amount. Candidates
/// further than twice this tolerance away are dropped before scoring.
pub const COARSE_TOLERANCE_RATIO: f64 = 0.05;

/// One scorable (bank side, invoice side) pair assembled by a branch builder.
struct Candidate {
    bank_transaction_id: Option<BankTransactionId>,
    invoice_id: Option<InvoiceId>,
    suggestion_type: SuggestionType,
    currency: String,
    suggested_amount_minor: i64,
    bank_amount_minor: i64,
    invoice_outstanding_minor: i64,
    bank_description: String,
    invoice_number: String,
    customer_name: String,
    bank_date: NaiveDate,
    invoice_due_date: NaiveDate,
    recency: NaiveDate,
}

/// Orchestrates candidate repositories and the confidence scorer to produce
/// ranked suggestions for one exception.
pub struct SuggestionEngine {
    exceptions: Arc<dyn TenantStore<ExceptionId, Exception>>,
    bank_txns: Arc<dyn TenantStore<BankTransactionId, BankTransaction>>,
    invoices: Arc<dyn TenantStore<InvoiceId, Invoice>>,
    suggestions: Arc<dyn TenantStore<SuggestionId, Suggestion>>,
    settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
}

impl SuggestionEngine {
    pub fn new(
        exceptions: Arc<dyn TenantStore<ExceptionId, Exception>>,
        bank_txns: Arc<dyn TenantStore<BankTransactionId, BankTransaction>>,
        invoices: Arc<dyn TenantStore<InvoiceId, Invoice>>,
        suggestions: Arc<dyn TenantStore<SuggestionId, Suggestion>>,
        settings: Arc<dyn TenantStore<TenantId, TenantMlSettings>>,
    ) -> Self {
        Self {
            exceptions,
            bank_txns,
            invoices,
            suggestions,
            settings,
        }
    }

    /// Regenerate suggestions for one open exception.
    ///
    /// Destructive-then-insert: any previously persisted suggestions for this
    /// exception are removed first, so at most one generation pass's output
    /// exists at any time.
    pub fn generate(
        &self,
        tenant_id: TenantId,
        exception_id: ExceptionId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Suggestion>> {
        let exception = self
            .exceptions
            .get(tenant_id, &exception_id)
            .ok_or(DomainError::NotFound)?;

        if exception.is_resolved() {
            return Err(DomainError::conflict("exception already resolved"));
        }

        self.delete_suggestions_for(tenant_id, exception_id);

        let settings = self
            .settings
            .get(tenant_id, &tenant_id)
            .unwrap_or_else(|| TenantMlSettings::default_for(tenant_id));
        if settings.ml_status == MlStatus::Disabled {
            tracing::info!(
                tenant_id = %tenant_id,
                exception_id = %exception_id,
                reason = settings.last_fallback_reason.as_deref().unwrap_or("admin"),
                "ml disabled for tenant, skipping suggestion generation"
            );
            return Ok(Vec::new());
        }

        let (pivot_amount_minor, candidates) = match exception.exception_type {
            ExceptionType::OrphanBankTxn => self.orphan_candidates(tenant_id, &exception)?,
            ExceptionType::ArOverdue => self.overdue_candidates(tenant_id, &exception)?,
            ExceptionType::PartialMatchStuck => self.partial_candidates(tenant_id, &exception)?,
        };

        let scored = find_and_score_candidates(pivot_amount_minor, candidates);

        let mut out = Vec::with_capacity(scored.len());
        for (candidate, confidence, rationale) in scored {
            let suggestion = Suggestion {
                id: SuggestionId::new(),
                tenant_id,
                exception_id,
                bank_transaction_id: candidate.bank_transaction_id,
                invoice_id: candidate.invoice_id,
                suggestion_type: candidate.suggestion_type,
                confidence,
                suggested_amount_minor: candidate.suggested_amount_minor,
                currency: candidate.currency,
                rationale,
                created_at: now,
            };
            self.suggestions
                .upsert(tenant_id, suggestion.id, suggestion.clone());
            out.push(suggestion);
        }

        tracing::debug!(
            tenant_id = %tenant_id,
            exception_id = %exception_id,
            count = out.len(),
            "generated suggestions"
        );
        Ok(out)
    }

    fn delete_suggestions_for(&self, tenant_id: TenantId, exception_id: ExceptionId) {
        for existing in self.suggestions.list(tenant_id) {
            if existing.exception_id == exception_id {
                self.suggestions.remove(tenant_id, &existing.id);
            }
        }
    }

    /// Pivot: the orphan bank transaction. Pool: invoices still outstanding.
    fn orphan_candidates(
        &self,
        tenant_id: TenantId,
        exception: &Exception,
    ) -> DomainResult<(i64, Vec<Candidate>)> {
        let bank = self
            .bank_txns
            .get(tenant_id, &BankTransactionId(exception.ref_id))
            .ok_or(DomainError::NotFound)?;

        let candidates = invoice_candidates_for(
            &bank,
            bank.amount_minor,
            SuggestionType::BankToInvoice,
            self.open_invoices(tenant_id),
        );
        Ok((bank.amount_minor, candidates))
    }

    /// Pivot: the overdue invoice. Pool: positive, not fully matched bank
    /// transactions, scored against their still-available amount.
    fn overdue_candidates(
        &self,
        tenant_id: TenantId,
        exception: &Exception,
    ) -> DomainResult<(i64, Vec<Candidate>)> {
        let invoice = self
            .invoices
            .get(tenant_id, &InvoiceId(exception.ref_id))
            .ok_or(DomainError::NotFound)?;
        let outstanding = invoice.outstanding_minor();

        let mut pool: Vec<BankTransaction> = self
            .bank_txns
            .list(tenant_id)
            .into_iter()
            .filter(|b| b.amount_minor > 0 && !b.is_fully_matched())
            .collect();
        pool.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        pool.truncate(CANDIDATE_POOL_CAP);

        let candidates = pool
            .into_iter()
            .map(|bank| {
                let available = bank.available_minor();
                Candidate {
                    bank_transaction_id: Some(bank.id),
                    invoice_id: Some(invoice.id),
                    suggestion_type: SuggestionType::InvoiceExpectBank,
                    currency: bank.currency.clone(),
                    suggested_amount_minor: available.min(outstanding),
                    bank_amount_minor: available,
                    invoice_outstanding_minor: outstanding,
                    bank_description: bank.description,
                    invoice_number: invoice.invoice_number.clone(),
                    customer_name: invoice.customer_name.clone(),
                    bank_date: bank.transaction_date,
                    invoice_due_date: invoice.due_date,
                    recency: bank.transaction_date,
                }
            })
            .collect();

        Ok((outstanding, candidates))
    }

    /// Pivot: the stuck partially-matched bank transaction, scored by its
    /// unmatched remainder.
    fn partial_candidates(
        &self,
        tenant_id: TenantId,
        exception: &Exception,
    ) -> DomainResult<(i64, Vec<Candidate>)> {
        let bank = self
            .bank_txns
            .get(tenant_id, &BankTransactionId(exception.ref_id))
            .ok_or(DomainError::NotFound)?;
        let remaining = bank.remaining_minor();
        if remaining <= 0 {
            return Ok((remaining, Vec::new()));
        }

        let candidates = invoice_candidates_for(
            &bank,
            remaining,
            SuggestionType::BankToInvoice,
            self.open_invoices(tenant_id),
        );
        Ok((remaining, candidates))
    }

    fn open_invoices(&self, tenant_id: TenantId) -> Vec<Invoice> {
        let mut pool: Vec<Invoice> = self
            .invoices
            .list(tenant_id)
            .into_iter()
            .filter(|i| i.outstanding_minor() > 0)
            .collect();
        pool.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        pool.truncate(CANDIDATE_POOL_CAP);
        pool
    }
}

fn invoice_candidates_for(
    bank: &BankTransaction,
    bank_amount_minor: i64,
    suggestion_type: SuggestionType,
    pool: Vec<Invoice>,
) -> Vec<Candidate> {
    pool.into_iter()
        .map(|invoice| {
            let outstanding = invoice.outstanding_minor();
            Candidate {
                bank_transaction_id: Some(bank.id),
                invoice_id: Some(invoice.id),
                suggestion_type,
                currency: bank.currency.clone(),
                suggested_amount_minor: bank_amount_minor.min(outstanding),
                bank_amount_minor,
                invoice_outstanding_minor: outstanding,
                bank_description: bank.description.clone(),
                invoice_number: invoice.invoice_number,
                customer_name: invoice.customer_name,
                bank_date: bank.transaction_date,
                invoice_due_date: invoice.due_date,
                recency: invoice.issue_date,
            }
        })
        .collect()
}

/// Coarse-to-fine candidate selection shared by all exception types.
///
/// The cheap amount filter bounds the candidate set before the scoring pass;
/// survivors are scored, admitted at the threshold, and ranked by score with a
/// most-recent-first tiebreak so regeneration is deterministic.
fn find_and_score_candidates(
    pivot_amount_minor: i64,
    candidates: Vec<Candidate>,
) -> Vec<(Candidate, u8, MatchRationale)> {
    let coarse_bound = 2.0 * COARSE_TOLERANCE_RATIO * pivot_amount_minor.abs() as f64;

    let mut scored: Vec<(Candidate, u8, MatchRationale)> = candidates
        .into_iter()
        .filter(|c| {
            (c.bank_amount_minor - c.invoice_outstanding_minor).abs() as f64 <= coarse_bound
        })
        .filter_map(|c| {
            let input = ScoreInput {
                bank_amount_minor: c.bank_amount_minor,
                invoice_outstanding_minor: c.invoice_outstanding_minor,
                bank_description: &c.bank_description,
                invoice_number: &c.invoice_number,
                customer_name: &c.customer_name,
                bank_date: c.bank_date,
                invoice_due_date: c.invoice_due_date,
            };
            let (total, rationale) = score(&input);
            (total >= SCORE_ADMISSION_THRESHOLD).then_some((c, total, rationale))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.recency.cmp(&a.0.recency)));
    scored.truncate(MAX_SUGGESTIONS);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconwarden_store::InMemoryTenantStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        tenant_id: TenantId,
        exceptions: Arc<InMemoryTenantStore<ExceptionId, Exception>>,
        bank_txns: Arc<InMemoryTenantStore<BankTransactionId, BankTransaction>>,
        invoices: Arc<InMemoryTenantStore<InvoiceId, Invoice>>,
        suggestions: Arc<InMemoryTenantStore<SuggestionId, Suggestion>>,
        settings: Arc<InMemoryTenantStore<TenantId, TenantMlSettings>>,
        engine: SuggestionEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let exceptions = Arc::new(InMemoryTenantStore::new());
            let bank_txns = Arc::new(InMemoryTenantStore::new());
            let invoices = Arc::new(InMemoryTenantStore::new());
            let suggestions = Arc::new(InMemoryTenantStore::new());
            let settings = Arc::new(InMemoryTenantStore::new());
            let engine = SuggestionEngine::new(
                exceptions.clone(),
                bank_txns.clone(),
                invoices.clone(),
                suggestions.clone(),
                settings.clone(),
            );
            Self {
                tenant_id: TenantId::new(),
                exceptions,
                bank_txns,
                invoices,
                suggestions,
                settings,
                engine,
            }
        }

        fn add_bank_txn(&self, amount_minor: i64, matched_minor: i64, description: &str) -> BankTransaction {
            let txn = BankTransaction {
                id: BankTransactionId::new(),
                tenant_id: self.tenant_id,
                amount_minor,
                currency: "EUR".to_string(),
                description: description.to_string(),
                reference: None,
                transaction_date: date(2026, 3, 10),
                matched_amount_minor: matched_minor,
            };
            self.bank_txns.upsert(self.tenant_id, txn.id, txn.clone());
            txn
        }

        fn add_invoice(
            &self,
            number: &str,
            customer: &str,
            total_minor: i64,
            paid_minor: i64,
            due: NaiveDate,
        ) -> Invoice {
            let invoice = Invoice {
                id: InvoiceId::new(),
                tenant_id: self.tenant_id,
                invoice_number: number.to_string(),
                customer_name: customer.to_string(),
                total_amount_minor: total_minor,
                paid_amount_settled_minor: paid_minor,
                due_date: due,
                issue_date: due - chrono::Duration::days(30),
            };
            self.invoices.upsert(self.tenant_id, invoice.id, invoice.clone());
            invoice
        }

        fn add_exception(&self, exception_type: ExceptionType, ref_id: reconwarden_core::EntityId) -> Exception {
            let exception = Exception {
                id: ExceptionId::new(),
                tenant_id: self.tenant_id,
                exception_type,
                ref_id,
                status: reconwarden_domain::ExceptionStatus::Open,
            };
            self.exceptions.upsert(self.tenant_id, exception.id, exception.clone());
            exception
        }
    }

    #[test]
    fn orphan_bank_txn_ranks_exact_match_first() {
        let f = Fixture::new();
        let bank = f.add_bank_txn(125_00, 0, "SEPA INV-2041 Acme GmbH");
        let exact = f.add_invoice("INV-2041", "Acme GmbH", 125_00, 0, date(2026, 3, 10));
        let close = f.add_invoice("INV-2099", "Other Co", 127_00, 0, date(2026, 3, 20));
        let exception = f.add_exception(ExceptionType::OrphanBankTxn, bank.id.0);

        let out = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();

        assert!(!out.is_empty());
        assert_eq!(out[0].invoice_id, Some(exact.id));
        assert_eq!(out[0].confidence, 85);
        assert!(out.iter().all(|s| s.confidence >= SCORE_ADMISSION_THRESHOLD));
        assert!(out.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        // Close-but-not-exact candidate still surfaces below the exact match.
        assert!(out.iter().any(|s| s.invoice_id == Some(close.id)));
    }

    #[test]
    fn wildly_off_amounts_are_dropped_by_the_coarse_filter() {
        let f = Fixture::new();
        let bank = f.add_bank_txn(100_00, 0, "INV-5 Acme");
        f.add_invoice("INV-5", "Acme", 300_00, 0, date(2026, 3, 10));
        let exception = f.add_exception(ExceptionType::OrphanBankTxn, bank.id.0);

        let out = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn generate_is_idempotent_and_destructive() {
        let f = Fixture::new();
        let bank = f.add_bank_txn(125_00, 0, "SEPA INV-2041 Acme GmbH");
        f.add_invoice("INV-2041", "Acme GmbH", 125_00, 0, date(2026, 3, 10));
        let exception = f.add_exception(ExceptionType::OrphanBankTxn, bank.id.0);

        let first = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();
        let second = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();

        let ranked = |v: &[Suggestion]| {
            v.iter()
                .map(|s| (s.invoice_id, s.confidence))
                .collect::<Vec<_>>()
        };
        assert_eq!(ranked(&first), ranked(&second));

        // Only the latest pass survives in the store.
        let stored = f.suggestions.list(f.tenant_id);
        assert_eq!(stored.len(), second.len());
    }

    #[test]
    fn ar_overdue_scores_available_bank_amounts() {
        let f = Fixture::new();
        let invoice = f.add_invoice("INV-88", "Nordwind AB", 200_00, 0, date(2026, 3, 10));
        // 250 received, 50 already matched elsewhere: 200 available.
        f.add_bank_txn(250_00, 50_00, "payment nordwind ab INV-88");
        f.add_bank_txn(-90_00, 0, "outgoing fee");
        let exception = f.add_exception(ExceptionType::ArOverdue, invoice.id.0);

        let out = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::InvoiceExpectBank);
        assert_eq!(out[0].suggested_amount_minor, 200_00);
        assert_eq!(out[0].confidence, 85);
    }

    #[test]
    fn partial_match_scores_against_the_remainder() {
        let f = Fixture::new();
        let bank = f.add_bank_txn(500_00, 380_00, "collective INV-301 transfer");
        let target = f.add_invoice("INV-301", "Beta Ltd", 120_00, 0, date(2026, 3, 11));
        let exception = f.add_exception(ExceptionType::PartialMatchStuck, bank.id.0);

        let out = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].invoice_id, Some(target.id));
        assert_eq!(out[0].suggested_amount_minor, 120_00);
    }

    #[test]
    fn unknown_exception_is_not_found() {
        let f = Fixture::new();
        let err = f
            .engine
            .generate(f.tenant_id, ExceptionId::new(), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn disabled_tenant_generates_nothing() {
        let f = Fixture::new();
        let bank = f.add_bank_txn(125_00, 0, "SEPA INV-2041 Acme GmbH");
        f.add_invoice("INV-2041", "Acme GmbH", 125_00, 0, date(2026, 3, 10));
        let exception = f.add_exception(ExceptionType::OrphanBankTxn, bank.id.0);

        let mut settings = TenantMlSettings::default_for(f.tenant_id);
        settings.ml_status = MlStatus::Disabled;
        settings.ml_enabled = false;
        f.settings.upsert(f.tenant_id, f.tenant_id, settings);

        let out = f
            .engine
            .generate(f.tenant_id, exception.id, Utc::now())
            .unwrap();
        assert!(out.is_empty());
    }
}

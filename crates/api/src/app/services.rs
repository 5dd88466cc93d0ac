//! Store and service wiring.
//!
//! Stores are the in-memory implementations; swapping in the relational
//! implementations is a wiring change here, not a handler change. The
//! concrete store handles stay public so integration tests can seed data
//! behind the same router production uses.

use std::sync::Arc;

use reconwarden_core::TenantId;
use reconwarden_domain::{
    BankTransaction, BankTransactionId, DriftSignal, DriftSignalId, Exception, ExceptionId,
    GuardrailEvent, GuardrailEventId, Invoice, InvoiceId, OutcomeId, ReconciliationLink,
    ReconciliationLinkId, Suggestion, SuggestionId, SuggestionOutcome, TenantMlSettings,
};
use reconwarden_drift::{AutoResponseGovernor, DriftDetector};
use reconwarden_store::{InMemoryAllocationSink, InMemoryTenantStore};
use reconwarden_suggest::{
    CalibrationReporter, CalibrationStatsRecord, LifecycleManager, SuggestionEngine,
};

pub struct AppServices {
    pub exceptions: Arc<InMemoryTenantStore<ExceptionId, Exception>>,
    pub bank_txns: Arc<InMemoryTenantStore<BankTransactionId, BankTransaction>>,
    pub invoices: Arc<InMemoryTenantStore<InvoiceId, Invoice>>,
    pub suggestions: Arc<InMemoryTenantStore<SuggestionId, Suggestion>>,
    pub links: Arc<InMemoryTenantStore<ReconciliationLinkId, ReconciliationLink>>,
    pub outcomes: Arc<InMemoryTenantStore<OutcomeId, SuggestionOutcome>>,
    pub guardrails: Arc<InMemoryTenantStore<GuardrailEventId, GuardrailEvent>>,
    pub settings: Arc<InMemoryTenantStore<TenantId, TenantMlSettings>>,
    pub signals: Arc<InMemoryTenantStore<DriftSignalId, DriftSignal>>,
    pub calibration_stats: Arc<InMemoryTenantStore<String, CalibrationStatsRecord>>,
    pub allocations: Arc<InMemoryAllocationSink>,

    pub engine: SuggestionEngine,
    pub lifecycle: LifecycleManager,
    pub calibration: CalibrationReporter,
    pub detector: DriftDetector,
    pub governor: AutoResponseGovernor,
}

pub fn build_services() -> AppServices {
    let exceptions = Arc::new(InMemoryTenantStore::new());
    let bank_txns = Arc::new(InMemoryTenantStore::new());
    let invoices = Arc::new(InMemoryTenantStore::new());
    let suggestions = Arc::new(InMemoryTenantStore::new());
    let links = Arc::new(InMemoryTenantStore::new());
    let outcomes = Arc::new(InMemoryTenantStore::new());
    let guardrails = Arc::new(InMemoryTenantStore::new());
    let settings = Arc::new(InMemoryTenantStore::new());
    let signals = Arc::new(InMemoryTenantStore::new());
    let calibration_stats = Arc::new(InMemoryTenantStore::new());
    let allocations = Arc::new(InMemoryAllocationSink::new());

    let engine = SuggestionEngine::new(
        exceptions.clone(),
        bank_txns.clone(),
        invoices.clone(),
        suggestions.clone(),
        settings.clone(),
    );
    let lifecycle = LifecycleManager::new(
        suggestions.clone(),
        exceptions.clone(),
        links.clone(),
        outcomes.clone(),
        allocations.clone(),
    );
    let calibration = CalibrationReporter::new(outcomes.clone(), calibration_stats.clone());
    let detector = DriftDetector::new(outcomes.clone(), guardrails.clone(), settings.clone());
    let governor = AutoResponseGovernor::new(settings.clone(), signals.clone());

    AppServices {
        exceptions,
        bank_txns,
        invoices,
        suggestions,
        links,
        outcomes,
        guardrails,
        settings,
        signals,
        calibration_stats,
        allocations,
        engine,
        lifecycle,
        calibration,
        detector,
        governor,
    }
}

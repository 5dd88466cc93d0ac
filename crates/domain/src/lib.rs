//! `reconwarden-domain` — reconciliation decision-support entities.
//!
//! Pure data model shared by the suggestion engine and the drift monitor.
//! Monetary amounts are minor units (cents); ratios are computed in `f64`.

pub mod bank;
pub mod drift;
pub mod exception;
pub mod guardrail;
pub mod invoice;
pub mod link;
pub mod outcome;
pub mod rationale;
pub mod settings;
pub mod suggestion;

pub use bank::{BankTransaction, BankTransactionId};
pub use drift::{AutoAction, DriftSignal, DriftSignalId, DriftType, Severity};
pub use exception::{Exception, ExceptionId, ExceptionStatus, ExceptionType};
pub use guardrail::{GuardrailAction, GuardrailEvent, GuardrailEventId};
pub use invoice::{Invoice, InvoiceId};
pub use link::{
    AllocationKind, ReconciliationLink, ReconciliationLinkId, SettlementAllocation,
    SettlementAllocationId,
};
pub use outcome::{FinalResult, OutcomeId, OutcomeKind, SuggestionOutcome};
pub use rationale::{AmountBand, AmountMatch, DateMatch, MatchRationale, TextMatch};
pub use settings::{MlStatus, TenantMlSettings, DEFAULT_MODEL_VERSION};
pub use suggestion::{Suggestion, SuggestionId, SuggestionType};

/// Per-entity identifier newtype over [`reconwarden_core::EntityId`].
macro_rules! entity_id {
    ($(#[$doc:meta])* $t:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(pub reconwarden_core::EntityId);

        impl $t {
            pub fn new() -> Self {
                Self(reconwarden_core::EntityId::new())
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl core::str::FromStr for $t {
            type Err = reconwarden_core::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

pub(crate) use entity_id;

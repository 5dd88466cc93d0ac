//! Best-effort settlement allocation write.
//!
//! The allocation is the second step of the confirm saga: the reconciliation
//! link is the authoritative record, and a failed allocation write is repaired
//! out-of-band by re-deriving it from the link. The sink therefore returns a
//! fallible result the caller is allowed to log-and-continue on.

use std::sync::RwLock;

use thiserror::Error;

use reconwarden_core::TenantId;
use reconwarden_domain::SettlementAllocation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Write seam for settlement allocations.
pub trait AllocationSink: Send + Sync {
    fn record(&self, tenant_id: TenantId, allocation: SettlementAllocation)
    -> Result<(), StoreError>;
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAllocationSink {
    inner: RwLock<Vec<(TenantId, SettlementAllocation)>>,
}

impl InMemoryAllocationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<SettlementAllocation> {
        self.inner
            .read()
            .map(|rows| {
                rows.iter()
                    .filter(|(t, _)| *t == tenant_id)
                    .map(|(_, a)| a.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl AllocationSink for InMemoryAllocationSink {
    fn record(
        &self,
        tenant_id: TenantId,
        allocation: SettlementAllocation,
    ) -> Result<(), StoreError> {
        let mut rows = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("allocation sink poisoned".to_string()))?;
        rows.push((tenant_id, allocation));
        Ok(())
    }
}

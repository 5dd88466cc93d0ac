//! `reconwarden-store` — tenant-isolated persistence boundary.
//!
//! The external relational store is reached through simple filtered CRUD; this
//! crate abstracts that as [`TenantStore`] and ships an in-memory
//! implementation for dev/test wiring.

pub mod allocation;
pub mod tenant_store;

pub use allocation::{AllocationSink, InMemoryAllocationSink, StoreError};
pub use tenant_store::{InMemoryTenantStore, TenantStore};

// crates/chainbench-store-sqlite/src/lib.rs
// ============================================================================
// Module: Chain-Bench SQLite Store Library
// Description: SQLite implementation of the benchmark run store.
// Purpose: Expose the durable run store and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! This crate persists benchmark runs into `SQLite` with WAL journaling and
//! reconstructs them losslessly: the working/failing partition, per-kind
//! ranks, and primary metrics survive a round trip through the store.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRunStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;

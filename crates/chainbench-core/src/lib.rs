// crates/chainbench-core/src/lib.rs
// ============================================================================
// Module: Chain-Bench Core Library
// Description: Public API surface for the Chain-Bench core.
// Purpose: Expose the benchmark data model, capability interfaces, and runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Chain-Bench core implements benchmark orchestration, ranking, composite
//! scoring, and historical trend analysis for fleets of blockchain RPC nodes.
//! It is backend-agnostic: network probing and persistence integrate through
//! explicit interfaces ([`Prober`], [`RunStore`]) rather than embedding a
//! specific RPC client or database.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::HistoryRows;
pub use interfaces::NodeStatusRow;
pub use interfaces::ProbeError;
pub use interfaces::Prober;
pub use interfaces::RankRow;
pub use interfaces::RunStore;
pub use interfaces::StoreError;
pub use runtime::BenchmarkRunner;
pub use runtime::CancelToken;
pub use runtime::Consistency;
pub use runtime::Executor;
pub use runtime::HistoryReport;
pub use runtime::ProbeRequest;
pub use runtime::RankingConfig;
pub use runtime::ReachabilityPolicy;
pub use runtime::RunnerOptions;
pub use runtime::Scheduler;
pub use runtime::SchedulerMode;
pub use runtime::ScoreTable;
pub use runtime::TrendDirection;
pub use runtime::TrendSummary;
pub use runtime::UptimeSummary;
pub use runtime::aggregate_run;
pub use runtime::analyze_history;

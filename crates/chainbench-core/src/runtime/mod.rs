// crates/chainbench-core/src/runtime/mod.rs
// ============================================================================
// Module: Chain-Bench Runtime
// Description: Probe execution, scheduling, ranking, and trend analysis.
// Purpose: Turn prober capabilities into ranked, scored, analyzable runs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is the deterministic middle of the system: the [`Executor`]
//! normalizes individual probe calls into outcomes, the [`Scheduler`] fans a
//! pass out across nodes, the ranking module folds per-kind outcome lists
//! into ranked and scored records, and the history module derives uptime,
//! trends, and consistency from stored rows. None of it performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod cancel;
mod executor;
mod history;
mod ranking;
mod runner;
mod scheduler;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelToken;
pub use executor::Executor;
pub use executor::ProbeRequest;
pub use history::Consistency;
pub use history::HistoryReport;
pub use history::TrendDirection;
pub use history::TrendSummary;
pub use history::UptimeSummary;
pub use history::analyze_history;
pub use ranking::RankingConfig;
pub use ranking::ReachabilityPolicy;
pub use ranking::ScoreTable;
pub use ranking::aggregate_run;
pub use runner::BenchmarkRunner;
pub use runner::RunnerOptions;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerMode;

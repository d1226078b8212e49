// crates/chainbench-core/src/core/mod.rs
// ============================================================================
// Module: Chain-Bench Core Data Model
// Description: Node identity, probe budgets, measurements, and run records.
// Purpose: Define the canonical types shared by runtime, probes, and stores.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! The core data model captures one benchmark run end to end: node identity,
//! the retry/timeout budget applied to every probe, the tagged measurement
//! payload of each probe kind, the per-node aggregate record, and the run
//! envelope that the store persists and reconstructs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod budget;
pub mod node;
pub mod probe;
pub mod record;
pub mod run;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use budget::ProbeBudget;
pub use node::NodeUrl;
pub use probe::ConfigSample;
pub use probe::LatencySample;
pub use probe::PointSample;
pub use probe::ProbeKind;
pub use probe::ProbeMeasurement;
pub use probe::ProbeOutcome;
pub use probe::StalenessSample;
pub use probe::ThroughputSample;
pub use probe::round2;
pub use record::NodeRecord;
pub use record::ProbeReport;
pub use run::BenchmarkRun;
pub use run::RunParameters;

// crates/chainbench-core/src/runtime/runner.rs
// ============================================================================
// Module: Chain-Bench Runner
// Description: Drives one complete benchmark run across the node fleet.
// Purpose: Sequence probe passes, then aggregate into an immutable run.
// Dependencies: crate::{core, interfaces, runtime}, time
// ============================================================================

//! ## Overview
//! The runner owns the pass order and nothing else: one scheduler pass per
//! probe kind, in a fixed order, then one aggregation. It holds no storage;
//! the caller persists the assembled [`BenchmarkRun`] through a `RunStore`.
//! Cancellation mid-run still yields a complete, reportable run in which the
//! skipped probes appear as failed outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

use crate::core::BenchmarkRun;
use crate::core::NodeUrl;
use crate::core::ProbeOutcome;
use crate::core::RunParameters;
use crate::interfaces::Prober;
use crate::runtime::cancel::CancelToken;
use crate::runtime::executor::ProbeRequest;
use crate::runtime::ranking::RankingConfig;
use crate::runtime::ranking::aggregate_run;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::scheduler::SchedulerMode;

/// Default account whose history backs the history throughput probe.
const DEFAULT_HISTORY_ACCOUNT: &str = "thecrazygm";
/// Default author of the point-query content target.
const DEFAULT_CALL_AUTHOR: &str = "thecrazygm";
/// Default permlink of the point-query content target.
const DEFAULT_CALL_PERMLINK: &str = "still-lazy";
/// Default number of repeated-latency samples.
const DEFAULT_LATENCY_SAMPLES: u32 = 5;

// ============================================================================
// SECTION: Runner Options
// ============================================================================

/// Probe targets and identification strings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Account whose history backs the history throughput probe.
    pub history_account: String,
    /// Author of the point-query content target.
    pub call_author: String,
    /// Permlink of the point-query content target.
    pub call_permlink: String,
    /// Number of repeated-latency samples per node.
    pub latency_samples: u32,
    /// Version of the RPC client, recorded in run parameters.
    pub client_version: String,
    /// Version of the benchmark tool, recorded in run parameters.
    pub script_version: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            history_account: DEFAULT_HISTORY_ACCOUNT.to_owned(),
            call_author: DEFAULT_CALL_AUTHOR.to_owned(),
            call_permlink: DEFAULT_CALL_PERMLINK.to_owned(),
            latency_samples: DEFAULT_LATENCY_SAMPLES,
            client_version: String::new(),
            script_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

// ============================================================================
// SECTION: Benchmark Runner
// ============================================================================

/// Drives all probe passes for one run and assembles the result envelope.
#[derive(Debug)]
pub struct BenchmarkRunner<P> {
    /// Scheduler dispatching each pass across the fleet.
    scheduler: Scheduler<P>,
    /// Probe targets and identification strings.
    options: RunnerOptions,
    /// Partition policy and scoring constants.
    ranking: RankingConfig,
}

impl<P: Prober + Sync> BenchmarkRunner<P> {
    /// Creates a runner over a scheduler.
    #[must_use]
    pub const fn new(
        scheduler: Scheduler<P>,
        options: RunnerOptions,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            scheduler,
            options,
            ranking,
        }
    }

    /// Runs every probe kind across the fleet and aggregates the outcomes.
    ///
    /// Passes execute in a fixed order so runs are comparable across time.
    /// Every observed node lands in exactly one of the run's working records
    /// or its failing map.
    #[must_use]
    pub fn run(&self, nodes: &[NodeUrl], cancel: &CancelToken) -> BenchmarkRun {
        let start_time = OffsetDateTime::now_utc();
        let mut outcomes: Vec<ProbeOutcome> = Vec::new();
        for request in self.requests() {
            outcomes.extend(self.scheduler.run_pass(nodes, &request, cancel));
        }
        let end_time = OffsetDateTime::now_utc();
        let (records, failing) = aggregate_run(&outcomes, &self.ranking);
        BenchmarkRun {
            run_id: None,
            timestamp: end_time,
            start_time,
            end_time,
            parameters: self.parameters(),
            records,
            failing,
        }
    }

    /// Builds the fixed-order probe request sequence for one run.
    fn requests(&self) -> [ProbeRequest; 6] {
        [
            ProbeRequest::Config,
            ProbeRequest::Blocks,
            ProbeRequest::History {
                account: self.options.history_account.clone(),
            },
            ProbeRequest::Call {
                author: self.options.call_author.clone(),
                permlink: self.options.call_permlink.clone(),
            },
            ProbeRequest::Latency {
                samples: self.options.latency_samples,
            },
            ProbeRequest::Staleness,
        ]
    }

    /// Snapshot of the parameters that shaped this run.
    fn parameters(&self) -> RunParameters {
        RunParameters {
            budget: *self.scheduler.executor().budget(),
            threaded: self.scheduler.mode() == SchedulerMode::Threaded,
            history_account: self.options.history_account.clone(),
            call_author: self.options.call_author.clone(),
            call_permlink: self.options.call_permlink.clone(),
            client_version: self.options.client_version.clone(),
            script_version: self.options.script_version.clone(),
        }
    }
}

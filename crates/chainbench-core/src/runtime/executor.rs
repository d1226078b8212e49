// crates/chainbench-core/src/runtime/executor.rs
// ============================================================================
// Module: Chain-Bench Executor
// Description: Normalizes single probe invocations into probe outcomes.
// Purpose: Wrap prober calls with cancellation, timing, and error capture.
// Dependencies: crate::{core, interfaces}, crate::runtime::cancel
// ============================================================================

//! ## Overview
//! The executor is the only place probe errors are converted into data. It
//! checks the cancellation token before starting, times the call, and folds
//! both `Ok` and `Err` into a [`ProbeOutcome`]; it never returns `Err`
//! itself, so an all-failing pass is still a reportable pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use crate::core::NodeUrl;
use crate::core::ProbeBudget;
use crate::core::ProbeKind;
use crate::core::ProbeOutcome;
use crate::core::round2;
use crate::interfaces::Prober;
use crate::runtime::cancel::CancelToken;

/// Error message recorded when a probe is skipped due to cancellation.
const INTERRUPTED: &str = "interrupted";

// ============================================================================
// SECTION: Probe Request
// ============================================================================

/// One probe to execute, with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeRequest {
    /// Status/config retrieval.
    Config,
    /// Consecutive block throughput.
    Blocks,
    /// Account history throughput.
    History {
        /// Account whose history is paged.
        account: String,
    },
    /// Single point-query latency.
    Call {
        /// Author of the content target.
        author: String,
        /// Permlink of the content target.
        permlink: String,
    },
    /// Repeated lightweight query latency.
    Latency {
        /// Number of back-to-back queries to issue.
        samples: u32,
    },
    /// Head-of-chain staleness.
    Staleness,
}

impl ProbeRequest {
    /// Returns the probe kind this request executes.
    #[must_use]
    pub const fn kind(&self) -> ProbeKind {
        match self {
            Self::Config => ProbeKind::Config,
            Self::Blocks => ProbeKind::Blocks,
            Self::History { .. } => ProbeKind::History,
            Self::Call { .. } => ProbeKind::Call,
            Self::Latency { .. } => ProbeKind::Latency,
            Self::Staleness => ProbeKind::Staleness,
        }
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes single probes against single nodes and normalizes the results.
#[derive(Debug)]
pub struct Executor<P> {
    /// Capability performing the actual measurements.
    prober: P,
    /// Budget applied to every probe this executor runs.
    budget: ProbeBudget,
}

impl<P: Prober> Executor<P> {
    /// Creates an executor over a prober with a fixed per-pass budget.
    #[must_use]
    pub const fn new(prober: P, budget: ProbeBudget) -> Self {
        Self { prober, budget }
    }

    /// Returns the budget applied to every probe this executor runs.
    #[must_use]
    pub const fn budget(&self) -> &ProbeBudget {
        &self.budget
    }

    /// Executes one probe against one node.
    ///
    /// Checks the cancellation token before starting; a cancelled probe is
    /// recorded as a failed outcome with the interruption message and zero
    /// duration. Prober errors become failed outcomes, never `Err`.
    #[must_use]
    pub fn execute(
        &self,
        node: &NodeUrl,
        request: &ProbeRequest,
        cancel: &CancelToken,
    ) -> ProbeOutcome {
        let kind = request.kind();
        if cancel.is_cancelled() {
            return ProbeOutcome::failure(node.clone(), kind, INTERRUPTED, 0.0);
        }
        let started = Instant::now();
        let result = match request {
            ProbeRequest::Config => self
                .prober
                .config(node, &self.budget)
                .map(Into::into),
            ProbeRequest::Blocks => self
                .prober
                .block_throughput(node, &self.budget)
                .map(Into::into),
            ProbeRequest::History { account } => self
                .prober
                .history_throughput(node, &self.budget, account)
                .map(Into::into),
            ProbeRequest::Call { author, permlink } => self
                .prober
                .call_latency(node, &self.budget, author, permlink)
                .map(Into::into),
            ProbeRequest::Latency { samples } => self
                .prober
                .repeated_latency(node, &self.budget, *samples)
                .map(Into::into),
            ProbeRequest::Staleness => self
                .prober
                .staleness(node, &self.budget)
                .map(Into::into),
        };
        let total_duration = round2(started.elapsed().as_secs_f64());
        match result {
            Ok(measurement) => {
                ProbeOutcome::success(node.clone(), kind, measurement, total_duration)
            }
            Err(error) => {
                ProbeOutcome::failure(node.clone(), kind, error.to_string(), total_duration)
            }
        }
    }
}

// crates/chainbench-core/src/core/budget.rs
// ============================================================================
// Module: Chain-Bench Probe Budget
// Description: Retry, timeout, and time-box bounds applied to probe invocations.
// Purpose: Bound every network-facing probe with caller-supplied limits.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The budget is passed by the caller into every probe invocation and is
//! never mutated by the core. Retry and timeout enforcement is the prober's
//! responsibility; the core treats retry exhaustion as a single failed
//! outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Probe Budget
// ============================================================================

/// Default number of connection retries.
const DEFAULT_CONNECT_RETRIES: u32 = 3;
/// Default number of per-call retries.
const DEFAULT_CALL_RETRIES: u32 = 3;
/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default time box for throughput loops in milliseconds.
const DEFAULT_TIME_BOX_MS: u64 = 30_000;

/// Retry/timeout/time-box parameters bounding one probe invocation.
///
/// # Invariants
/// - `timeout_ms` applies to each RPC call; `time_box_ms` bounds throughput
///   loops as a whole.
/// - A non-positive (zero) time box degenerates to "run the loop zero
///   times", which is a successful outcome with a count of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeBudget {
    /// Number of connection retries before a connect failure is reported.
    pub connect_retries: u32,
    /// Number of retries for each individual RPC call.
    pub call_retries: u32,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Time box for throughput loops in milliseconds.
    pub time_box_ms: u64,
}

impl Default for ProbeBudget {
    fn default() -> Self {
        Self {
            connect_retries: DEFAULT_CONNECT_RETRIES,
            call_retries: DEFAULT_CALL_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            time_box_ms: DEFAULT_TIME_BOX_MS,
        }
    }
}

impl ProbeBudget {
    /// Returns the per-call timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the throughput time box as a [`Duration`].
    #[must_use]
    pub const fn time_box(&self) -> Duration {
        Duration::from_millis(self.time_box_ms)
    }
}

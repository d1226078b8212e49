// crates/chainbench-core/src/runtime/cancel.rs
// ============================================================================
// Module: Chain-Bench Cancellation
// Description: Cooperative cancellation token threaded through a pass.
// Purpose: Replace ambient interrupt state with an explicit per-pass token.
// Dependencies: std::sync
// ============================================================================

//! ## Overview
//! A cancellation token is created per orchestration pass and passed
//! explicitly from the runner through the scheduler to the executor. The
//! executor observes it at a single designated suspension point before each
//! probe; in-flight probes are never aborted forcibly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Cancel Token
// ============================================================================

/// Cooperative cancellation flag shared across scheduler workers.
///
/// # Invariants
/// - Once cancelled, the token never reverts; a token is not reused across
///   passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Shared cancellation flag; set once, never cleared.
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread, including a
    /// signal handler context.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// crates/chainbench-core/src/runtime/scheduler.rs
// ============================================================================
// Module: Chain-Bench Scheduler
// Description: Fans one probe pass out across the configured node fleet.
// Purpose: Produce exactly one outcome per node per pass, threaded or not.
// Dependencies: std::{sync, thread}, crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! A pass applies one probe request to every node. In threaded mode a scoped
//! worker pool of at most [`MAX_WORKERS`] threads pulls node indices from an
//! atomic counter and sends outcomes over a channel; sequential mode walks
//! the list in order. Both modes honor the same contract: exactly one
//! outcome per node, cancellation observed before each probe starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;

use crate::core::NodeUrl;
use crate::core::ProbeOutcome;
use crate::interfaces::Prober;
use crate::runtime::cancel::CancelToken;
use crate::runtime::executor::Executor;
use crate::runtime::executor::ProbeRequest;

/// Upper bound on concurrent probe workers, regardless of fleet size.
const MAX_WORKERS: usize = 32;

// ============================================================================
// SECTION: Scheduler Mode
// ============================================================================

/// How a pass is dispatched across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerMode {
    /// Scoped worker pool of `min(MAX_WORKERS, nodes.len())` threads.
    #[default]
    Threaded,
    /// One node at a time, in list order.
    Sequential,
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Dispatches one probe request across a node fleet.
#[derive(Debug)]
pub struct Scheduler<P> {
    /// Executor normalizing each probe invocation.
    executor: Executor<P>,
    /// Dispatch mode for the pass.
    mode: SchedulerMode,
}

impl<P: Prober + Sync> Scheduler<P> {
    /// Creates a scheduler over an executor.
    #[must_use]
    pub const fn new(executor: Executor<P>, mode: SchedulerMode) -> Self {
        Self { executor, mode }
    }

    /// Returns the executor driving this scheduler.
    #[must_use]
    pub const fn executor(&self) -> &Executor<P> {
        &self.executor
    }

    /// Returns the dispatch mode this scheduler uses.
    #[must_use]
    pub const fn mode(&self) -> SchedulerMode {
        self.mode
    }

    /// Runs one probe request against every node.
    ///
    /// Returns exactly one outcome per node. Threaded outcomes arrive in
    /// completion order; callers must not assume list order. An empty fleet
    /// returns an empty vector without spawning workers.
    #[must_use]
    pub fn run_pass(
        &self,
        nodes: &[NodeUrl],
        request: &ProbeRequest,
        cancel: &CancelToken,
    ) -> Vec<ProbeOutcome> {
        if nodes.is_empty() {
            return Vec::new();
        }
        match self.mode {
            SchedulerMode::Threaded => self.run_threaded(nodes, request, cancel),
            SchedulerMode::Sequential => nodes
                .iter()
                .map(|node| self.executor.execute(node, request, cancel))
                .collect(),
        }
    }

    fn run_threaded(
        &self,
        nodes: &[NodeUrl],
        request: &ProbeRequest,
        cancel: &CancelToken,
    ) -> Vec<ProbeOutcome> {
        let workers = MAX_WORKERS.min(nodes.len());
        let next_index = AtomicUsize::new(0);
        let (sender, receiver) = mpsc::channel();
        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let next_index = &next_index;
                scope.spawn(move || {
                    loop {
                        let index = next_index.fetch_add(1, Ordering::SeqCst);
                        let Some(node) = nodes.get(index) else {
                            break;
                        };
                        let outcome = self.executor.execute(node, request, cancel);
                        if sender.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);
        receiver.into_iter().collect()
    }
}

// crates/chainbench-core/tests/scheduler.rs
// ============================================================================
// Module: Scheduler and Executor Tests
// Description: Pass dispatch, outcome completeness, and cancellation.
// Purpose: Ensure one outcome per node in both modes, cancelled or not.
// Dependencies: chainbench-core
// ============================================================================

//! ## Overview
//! Exercises the one-outcome-per-node contract across threaded and
//! sequential dispatch, the empty-fleet short circuit, and the cancellation
//! path in which every skipped probe surfaces as an interrupted failure.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

/// Shared scripted prober and outcome builders.
mod common;

use std::collections::BTreeSet;

use chainbench_core::CancelToken;
use chainbench_core::Executor;
use chainbench_core::NodeUrl;
use chainbench_core::ProbeBudget;
use chainbench_core::ProbeKind;
use chainbench_core::ProbeRequest;
use chainbench_core::Scheduler;
use chainbench_core::SchedulerMode;
use common::ScriptedProber;

/// Builds a fleet of `n` distinct node URLs.
fn fleet(n: usize) -> Vec<NodeUrl> {
    (0..n).map(|index| NodeUrl::new(format!("https://node-{index}.example"))).collect()
}

/// Builds a prober scripted to succeed for every node in the fleet.
fn scripted_for(nodes: &[NodeUrl]) -> ScriptedProber {
    nodes
        .iter()
        .fold(ScriptedProber::default(), |prober, node| {
            prober.with_healthy_node(node.as_str(), 10, 0.1)
        })
}

// ============================================================================
// SECTION: Dispatch Contract
// ============================================================================

/// Verifies the threaded pass yields exactly one outcome per node.
#[test]
fn threaded_pass_covers_every_node_once() {
    let nodes = fleet(7);
    let prober = scripted_for(&nodes);
    let scheduler =
        Scheduler::new(Executor::new(prober, ProbeBudget::default()), SchedulerMode::Threaded);

    let outcomes = scheduler.run_pass(&nodes, &ProbeRequest::Blocks, &CancelToken::new());

    assert_eq!(outcomes.len(), nodes.len());
    let seen: BTreeSet<&str> = outcomes.iter().map(|outcome| outcome.node.as_str()).collect();
    assert_eq!(seen.len(), nodes.len());
    assert!(outcomes.iter().all(|outcome| outcome.successful));
    assert!(outcomes.iter().all(|outcome| outcome.probe_kind == ProbeKind::Blocks));
}

/// Verifies sequential dispatch preserves list order.
#[test]
fn sequential_pass_preserves_order() {
    let nodes = fleet(4);
    let prober = scripted_for(&nodes);
    let scheduler =
        Scheduler::new(Executor::new(prober, ProbeBudget::default()), SchedulerMode::Sequential);

    let outcomes = scheduler.run_pass(&nodes, &ProbeRequest::Config, &CancelToken::new());

    let order: Vec<&str> = outcomes.iter().map(|outcome| outcome.node.as_str()).collect();
    let expected: Vec<&str> = nodes.iter().map(NodeUrl::as_str).collect();
    assert_eq!(order, expected);
}

/// Verifies an empty fleet yields an empty pass without spawning workers.
#[test]
fn empty_fleet_yields_empty_pass() {
    let scheduler = Scheduler::new(
        Executor::new(ScriptedProber::default(), ProbeBudget::default()),
        SchedulerMode::Threaded,
    );

    let outcomes = scheduler.run_pass(&[], &ProbeRequest::Staleness, &CancelToken::new());
    assert!(outcomes.is_empty());
}

/// Verifies probe failures surface as failed outcomes, never panics or
/// missing entries.
#[test]
fn failures_surface_as_outcomes() {
    let nodes = fleet(3);
    let prober = ScriptedProber::default()
        .with_healthy_node(nodes[0].as_str(), 10, 0.1)
        .with_unreachable_node(nodes[1].as_str())
        .with_unreachable_node(nodes[2].as_str());
    let scheduler =
        Scheduler::new(Executor::new(prober, ProbeBudget::default()), SchedulerMode::Threaded);

    let outcomes = scheduler.run_pass(&nodes, &ProbeRequest::Blocks, &CancelToken::new());

    assert_eq!(outcomes.len(), 3);
    let failed: Vec<_> = outcomes.iter().filter(|outcome| !outcome.successful).collect();
    assert_eq!(failed.len(), 2);
    for outcome in failed {
        assert_eq!(outcome.error.as_deref(), Some("connect failed: connection refused"));
        assert!(outcome.measurement.is_none());
    }
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Verifies a cancelled pass still yields one outcome per node, each marked
/// interrupted.
#[test]
fn cancelled_pass_marks_every_node_interrupted() {
    let nodes = fleet(10);
    let prober = scripted_for(&nodes);
    let scheduler =
        Scheduler::new(Executor::new(prober, ProbeBudget::default()), SchedulerMode::Threaded);

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcomes = scheduler.run_pass(&nodes, &ProbeRequest::Latency { samples: 5 }, &cancel);

    assert_eq!(outcomes.len(), 10);
    for outcome in &outcomes {
        assert!(!outcome.successful);
        assert_eq!(outcome.error.as_deref(), Some("interrupted"));
        assert_eq!(outcome.total_duration, 0.0);
    }
}

/// Verifies the token is observable from other threads and never reverts.
#[test]
fn cancel_token_is_sticky_across_clones() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
    assert!(token.is_cancelled());
}

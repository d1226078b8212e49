// crates/chainbench-core/tests/history.rs
// ============================================================================
// Module: History Analysis Tests
// Description: Uptime, trend direction, and rank consistency behavior.
// Purpose: Ensure the analyzer folds stored rows into exact summaries.
// Dependencies: chainbench-core, time
// ============================================================================

//! ## Overview
//! Exercises the trend direction table over first/last ranks, the uptime
//! percentage at its exact boundaries, the failing-node override, and the
//! explicit not-applicable consistency marker.

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

use chainbench_core::Consistency;
use chainbench_core::HistoryRows;
use chainbench_core::NodeStatusRow;
use chainbench_core::NodeUrl;
use chainbench_core::ProbeKind;
use chainbench_core::RankRow;
use chainbench_core::TrendDirection;
use chainbench_core::analyze_history;
use time::Duration;
use time::OffsetDateTime;

/// Base timestamp for synthesized rows.
fn base_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(19_000)
}

/// Builds chronologically ordered rank rows for one node and kind.
fn rank_rows(url: &str, kind: ProbeKind, ranks: &[u32]) -> Vec<RankRow> {
    ranks
        .iter()
        .enumerate()
        .map(|(index, rank)| RankRow {
            node: NodeUrl::new(url),
            run_id: i64::try_from(index).unwrap() + 1,
            timestamp: base_time() + Duration::hours(i64::try_from(index).unwrap()),
            probe_kind: kind,
            ok: true,
            rank: Some(*rank),
        })
        .collect()
}

/// Builds chronologically ordered status rows for one node.
fn status_rows(url: &str, statuses: &[bool]) -> Vec<NodeStatusRow> {
    statuses
        .iter()
        .enumerate()
        .map(|(index, working)| NodeStatusRow {
            node: NodeUrl::new(url),
            run_id: i64::try_from(index).unwrap() + 1,
            timestamp: base_time() + Duration::hours(i64::try_from(index).unwrap()),
            is_working: *working,
            error: (!working).then(|| "connect failed: connection refused".to_owned()),
        })
        .collect()
}

// ============================================================================
// SECTION: Trend Direction
// ============================================================================

/// Verifies the direction table over first and last in-window ranks.
#[test]
fn trend_direction_follows_first_and_last_rank() {
    let cases: [(&[u32], TrendDirection); 4] = [
        (&[3, 3], TrendDirection::Stable),
        (&[5, 4, 2], TrendDirection::Improving),
        (&[2, 3, 5], TrendDirection::Degrading),
        (&[4], TrendDirection::InsufficientData),
    ];
    for (ranks, expected) in cases {
        let rows = HistoryRows {
            statuses: status_rows("https://a.example", &vec![true; ranks.len()]),
            ranks: rank_rows("https://a.example", ProbeKind::Blocks, ranks),
            known_nodes: vec![NodeUrl::new("https://a.example")],
        };
        let report = analyze_history(&rows);
        let summary = &report.trends[&NodeUrl::new("https://a.example")][&ProbeKind::Blocks];
        assert_eq!(summary.direction, expected, "ranks {ranks:?}");
    }
}

/// Verifies first/last/avg/change fields for a multi-run window.
#[test]
fn trend_summary_reports_exact_statistics() {
    let rows = HistoryRows {
        statuses: status_rows("https://a.example", &[true, true, true]),
        ranks: rank_rows("https://a.example", ProbeKind::Call, &[5, 3, 1]),
        known_nodes: vec![NodeUrl::new("https://a.example")],
    };
    let report = analyze_history(&rows);
    let summary = &report.trends[&NodeUrl::new("https://a.example")][&ProbeKind::Call];

    assert_eq!(summary.first_rank, Some(5));
    assert_eq!(summary.last_rank, Some(1));
    assert_eq!(summary.avg_rank, Some(3.0));
    assert_eq!(summary.change, Some(4));
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.consistency, Consistency::Stddev(2.0));
}

/// Verifies a node observed only as failing carries the failing direction
/// for every kind with no consistency value.
#[test]
fn failing_only_node_overrides_every_kind() {
    let rows = HistoryRows {
        statuses: status_rows("https://down.example", &[false, false]),
        ranks: Vec::new(),
        known_nodes: vec![NodeUrl::new("https://down.example")],
    };
    let report = analyze_history(&rows);
    let trends = &report.trends[&NodeUrl::new("https://down.example")];

    for kind in ProbeKind::ALL {
        let summary = &trends[&kind];
        assert_eq!(summary.direction, TrendDirection::Failing);
        assert_eq!(summary.consistency, Consistency::NotApplicable);
        assert_eq!(summary.observations, 0);
    }
}

// ============================================================================
// SECTION: Uptime
// ============================================================================

/// Verifies uptime hits 100% and 0% exactly at the boundaries.
#[test]
fn uptime_boundaries_are_exact() {
    let mut statuses = status_rows("https://up.example", &[true, true, true]);
    statuses.extend(status_rows("https://down.example", &[false, false]));
    let rows = HistoryRows {
        statuses,
        ranks: Vec::new(),
        known_nodes: vec![
            NodeUrl::new("https://up.example"),
            NodeUrl::new("https://down.example"),
        ],
    };
    let report = analyze_history(&rows);

    let up = &report.uptime[&NodeUrl::new("https://up.example")];
    assert_eq!(up.uptime_pct, 100.0);
    assert_eq!(up.working_runs, 3);
    assert_eq!(up.total_runs, 3);

    let down = &report.uptime[&NodeUrl::new("https://down.example")];
    assert_eq!(down.uptime_pct, 0.0);
    assert_eq!(down.working_runs, 0);
    assert_eq!(down.total_runs, 2);
}

/// Verifies uptime rounds to two decimals for fractional windows.
#[test]
fn uptime_rounds_to_two_decimals() {
    let rows = HistoryRows {
        statuses: status_rows("https://a.example", &[true, true, false]),
        ranks: Vec::new(),
        known_nodes: vec![NodeUrl::new("https://a.example")],
    };
    let report = analyze_history(&rows);
    let uptime = &report.uptime[&NodeUrl::new("https://a.example")];
    assert_eq!(uptime.uptime_pct, 66.67);
}

/// Verifies a known node with zero in-window rows still appears, at 0%.
#[test]
fn unobserved_known_node_appears_with_zero_uptime() {
    let rows = HistoryRows {
        statuses: status_rows("https://a.example", &[true]),
        ranks: Vec::new(),
        known_nodes: vec![
            NodeUrl::new("https://a.example"),
            NodeUrl::new("https://ghost.example"),
        ],
    };
    let report = analyze_history(&rows);

    let ghost = &report.uptime[&NodeUrl::new("https://ghost.example")];
    assert_eq!(ghost.uptime_pct, 0.0);
    assert_eq!(ghost.total_runs, 0);
    let trends = &report.trends[&NodeUrl::new("https://ghost.example")];
    for kind in ProbeKind::ALL {
        assert_eq!(trends[&kind].direction, TrendDirection::InsufficientData);
    }
}

// ============================================================================
// SECTION: Consistency
// ============================================================================

/// Verifies single-observation windows carry no consistency value instead
/// of a zero spread.
#[test]
fn single_observation_has_no_consistency() {
    let rows = HistoryRows {
        statuses: status_rows("https://a.example", &[true]),
        ranks: rank_rows("https://a.example", ProbeKind::Latency, &[2]),
        known_nodes: vec![NodeUrl::new("https://a.example")],
    };
    let report = analyze_history(&rows);
    let summary = &report.trends[&NodeUrl::new("https://a.example")][&ProbeKind::Latency];

    assert_eq!(summary.direction, TrendDirection::InsufficientData);
    assert_eq!(summary.consistency, Consistency::NotApplicable);
    assert_eq!(summary.first_rank, Some(2));
}

/// Verifies sample standard deviation over a known spread.
#[test]
fn consistency_reports_sample_stddev() {
    let rows = HistoryRows {
        statuses: status_rows("https://a.example", &[true, true]),
        ranks: rank_rows("https://a.example", ProbeKind::Staleness, &[1, 3]),
        known_nodes: vec![NodeUrl::new("https://a.example")],
    };
    let report = analyze_history(&rows);
    let summary = &report.trends[&NodeUrl::new("https://a.example")][&ProbeKind::Staleness];

    // mean 2, squared deviations 1 + 1, sample variance 2, stddev ~1.41
    assert_eq!(summary.consistency, Consistency::Stddev(1.41));
}

// crates/chainbench-core/src/runtime/history.rs
// ============================================================================
// Module: Chain-Bench History Analysis
// Description: Uptime, rank trend, and rank consistency over stored runs.
// Purpose: Derive per-node historical summaries from raw in-window rows.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! The analyzer is pure over [`HistoryRows`]: the store decides the window
//! (including its small-store fallback), the analyzer only folds the rows it
//! is given. Nodes the store knows but never observed in-window still appear
//! in the report with zero uptime, so a node that silently dropped out of
//! the fleet remains visible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::NodeUrl;
use crate::core::ProbeKind;
use crate::core::round2;
use crate::interfaces::HistoryRows;

// ============================================================================
// SECTION: Trend Types
// ============================================================================

/// Direction of a node's rank movement across the window for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Last in-window rank is better (smaller) than the first.
    Improving,
    /// Last in-window rank is worse (larger) than the first.
    Degrading,
    /// First and last in-window ranks are equal.
    Stable,
    /// The node was observed only as failing within the window.
    Failing,
    /// Fewer than two ranked observations within the window.
    InsufficientData,
}

/// Rank consistency across the window for one node and kind.
///
/// A failing node or one with fewer than two ranked observations carries the
/// explicit [`Consistency::NotApplicable`] marker rather than a zero spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Sample standard deviation of in-window ranks, lower is steadier.
    Stddev(f64),
    /// Not enough ranked observations to measure spread.
    NotApplicable,
}

/// Per-node, per-kind trend summary over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Direction of rank movement across the window.
    pub direction: TrendDirection,
    /// Earliest in-window rank, when the node was ranked at all.
    pub first_rank: Option<u32>,
    /// Latest in-window rank, when the node was ranked at all.
    pub last_rank: Option<u32>,
    /// Mean in-window rank, when the node was ranked at all.
    pub avg_rank: Option<f64>,
    /// `first_rank - last_rank`; positive means the node improved.
    pub change: Option<i64>,
    /// Rank spread across the window.
    pub consistency: Consistency,
    /// Number of ranked observations within the window.
    pub observations: u32,
}

impl TrendSummary {
    /// Summary for a node×kind with no usable ranked observations.
    #[must_use]
    pub const fn empty(direction: TrendDirection) -> Self {
        Self {
            direction,
            first_rank: None,
            last_rank: None,
            avg_rank: None,
            change: None,
            consistency: Consistency::NotApplicable,
            observations: 0,
        }
    }
}

/// Per-node uptime over the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UptimeSummary {
    /// Runs within the window in which the node was working.
    pub working_runs: u32,
    /// Runs within the window that observed the node at all.
    pub total_runs: u32,
    /// `working / total * 100`, rounded to 2 decimals; 0 when unobserved.
    pub uptime_pct: f64,
}

/// Historical summary across every node the store knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Per-node uptime over the window.
    pub uptime: BTreeMap<NodeUrl, UptimeSummary>,
    /// Per-node, per-kind trend summaries.
    pub trends: BTreeMap<NodeUrl, BTreeMap<ProbeKind, TrendSummary>>,
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Folds in-window rows into per-node uptime, trend, and consistency.
///
/// Every node in `rows.known_nodes` (plus any node appearing in the rows)
/// gets an entry. A node observed only as failing within the window carries
/// [`TrendDirection::Failing`] for every kind regardless of any stale rank
/// rows.
#[must_use]
pub fn analyze_history(rows: &HistoryRows) -> HistoryReport {
    let mut nodes: BTreeSet<NodeUrl> = rows.known_nodes.iter().cloned().collect();
    nodes.extend(rows.statuses.iter().map(|status| status.node.clone()));
    nodes.extend(rows.ranks.iter().map(|rank| rank.node.clone()));

    let mut report = HistoryReport::default();
    for node in nodes {
        let uptime = uptime_for(&node, rows);
        let failing_only = uptime.total_runs > 0 && uptime.working_runs == 0;
        let mut trends = BTreeMap::new();
        for kind in ProbeKind::ALL {
            let summary = if failing_only {
                TrendSummary::empty(TrendDirection::Failing)
            } else {
                trend_for(&node, kind, rows)
            };
            trends.insert(kind, summary);
        }
        report.uptime.insert(node.clone(), uptime);
        report.trends.insert(node, trends);
    }
    report
}

/// Uptime over the window for one node.
fn uptime_for(node: &NodeUrl, rows: &HistoryRows) -> UptimeSummary {
    let mut working_runs = 0u32;
    let mut total_runs = 0u32;
    for status in rows.statuses.iter().filter(|status| status.node == *node) {
        total_runs = total_runs.saturating_add(1);
        if status.is_working {
            working_runs = working_runs.saturating_add(1);
        }
    }
    let uptime_pct = if total_runs == 0 {
        0.0
    } else {
        round2(f64::from(working_runs) / f64::from(total_runs) * 100.0)
    };
    UptimeSummary {
        working_runs,
        total_runs,
        uptime_pct,
    }
}

/// Trend and consistency over the window for one node and kind.
fn trend_for(node: &NodeUrl, kind: ProbeKind, rows: &HistoryRows) -> TrendSummary {
    let ranks: Vec<u32> = rows
        .ranks
        .iter()
        .filter(|row| row.node == *node && row.probe_kind == kind && row.ok)
        .filter_map(|row| row.rank)
        .collect();
    let observations = u32::try_from(ranks.len()).unwrap_or(u32::MAX);
    let (Some(first), Some(last)) = (ranks.first().copied(), ranks.last().copied()) else {
        return TrendSummary::empty(TrendDirection::InsufficientData);
    };
    if ranks.len() < 2 {
        return TrendSummary {
            direction: TrendDirection::InsufficientData,
            first_rank: Some(first),
            last_rank: Some(last),
            avg_rank: Some(f64::from(first)),
            change: None,
            consistency: Consistency::NotApplicable,
            observations,
        };
    }
    let direction = match last.cmp(&first) {
        std::cmp::Ordering::Less => TrendDirection::Improving,
        std::cmp::Ordering::Greater => TrendDirection::Degrading,
        std::cmp::Ordering::Equal => TrendDirection::Stable,
    };
    let sum: f64 = ranks.iter().copied().map(f64::from).sum();
    let count = f64::from(observations);
    let avg = sum / count;
    TrendSummary {
        direction,
        first_rank: Some(first),
        last_rank: Some(last),
        avg_rank: Some(round2(avg)),
        change: Some(i64::from(first) - i64::from(last)),
        consistency: Consistency::Stddev(sample_stddev(&ranks, avg)),
        observations,
    }
}

/// Sample standard deviation of ranks around a precomputed mean.
fn sample_stddev(ranks: &[u32], mean: f64) -> f64 {
    let len = ranks.len();
    if len < 2 {
        return 0.0;
    }
    let squared: f64 = ranks
        .iter()
        .copied()
        .map(|rank| {
            let diff = f64::from(rank) - mean;
            diff * diff
        })
        .sum();
    let divisor = u32::try_from(len - 1).unwrap_or(u32::MAX);
    round2((squared / f64::from(divisor)).sqrt())
}

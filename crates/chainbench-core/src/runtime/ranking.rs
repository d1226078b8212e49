// crates/chainbench-core/src/runtime/ranking.rs
// ============================================================================
// Module: Chain-Bench Ranking
// Description: Outcome aggregation, per-kind ranking, and composite scoring.
// Purpose: Fold raw probe outcomes into ranked, scored node records.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Aggregation is pure and deterministic: the same outcome set always
//! produces the same records. Nodes are partitioned into working and failing
//! by an explicit reachability policy, per-kind ranks are assigned 1..K over
//! the working nodes that succeeded at that kind, and a weighted composite
//! score collapses all kinds into one number per node. Scoring constants
//! live in [`ScoreTable`] so weight, ceiling, and criticality changes are
//! configuration edits, not code edits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::NodeRecord;
use crate::core::NodeUrl;
use crate::core::ProbeKind;
use crate::core::ProbeMeasurement;
use crate::core::ProbeOutcome;
use crate::core::ProbeReport;
use crate::core::round2;

// ============================================================================
// SECTION: Reachability Policy
// ============================================================================

/// Policy deciding when a node with failed probes counts as failing.
///
/// A node with zero failed outcomes is always working. A node with at least
/// one failed outcome is failing unless the policy's success condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityPolicy {
    /// A node stays working only if its config probe succeeded.
    #[default]
    RequireConfig,
    /// A node stays working if any probe succeeded.
    AnyProbeSuccess,
}

// ============================================================================
// SECTION: Score Table
// ============================================================================

/// Default per-kind composite weights, summing to 1.0.
const DEFAULT_WEIGHTS: [(ProbeKind, f64); 6] = [
    (ProbeKind::Blocks, 0.25),
    (ProbeKind::History, 0.20),
    (ProbeKind::Call, 0.20),
    (ProbeKind::Latency, 0.15),
    (ProbeKind::Staleness, 0.15),
    (ProbeKind::Config, 0.05),
];

/// Default normalization ceilings for time-valued kinds, in seconds.
const DEFAULT_CEILINGS: [(ProbeKind, f64); 4] = [
    (ProbeKind::Config, 2.0),
    (ProbeKind::Call, 2.0),
    (ProbeKind::Latency, 1.0),
    (ProbeKind::Staleness, 30.0),
];

/// Default cap on the advertised-version bonus.
const DEFAULT_VERSION_BONUS_CAP: f64 = 5.0;

/// Default multiplier applied once when any critical kind failed.
const DEFAULT_CRITICAL_PENALTY: f64 = 0.5;

/// Composite scoring constants: weights, ceilings, criticality, and bonus cap.
///
/// # Invariants
/// - Every probe kind has a weight; weights sum to 1.0 in the default table.
/// - Count-valued kinds (blocks, history) have no ceiling; they normalize
///   against the in-run maximum instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    /// Per-kind weight applied to the normalized kind score.
    pub weights: BTreeMap<ProbeKind, f64>,
    /// Per-kind normalization ceiling for time-valued kinds, in seconds.
    pub ceilings: BTreeMap<ProbeKind, f64>,
    /// Kinds whose failure halves the final score.
    pub critical: Vec<ProbeKind>,
    /// Upper bound on the advertised-version bonus.
    pub version_bonus_cap: f64,
    /// Multiplier applied once when any critical kind failed.
    pub critical_penalty: f64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.into_iter().collect(),
            ceilings: DEFAULT_CEILINGS.into_iter().collect(),
            critical: vec![ProbeKind::Blocks, ProbeKind::History, ProbeKind::Call, ProbeKind::Latency],
            version_bonus_cap: DEFAULT_VERSION_BONUS_CAP,
            critical_penalty: DEFAULT_CRITICAL_PENALTY,
        }
    }
}

impl ScoreTable {
    /// Returns the weight for a kind, zero when absent.
    #[must_use]
    pub fn weight(&self, kind: ProbeKind) -> f64 {
        self.weights.get(&kind).copied().unwrap_or(0.0)
    }

    /// Returns the ceiling for a time-valued kind, when configured.
    #[must_use]
    pub fn ceiling(&self, kind: ProbeKind) -> Option<f64> {
        self.ceilings.get(&kind).copied()
    }

    /// Returns whether a failed probe of this kind triggers the penalty.
    #[must_use]
    pub fn is_critical(&self, kind: ProbeKind) -> bool {
        self.critical.contains(&kind)
    }
}

// ============================================================================
// SECTION: Ranking Config
// ============================================================================

/// Full aggregation configuration: partition policy plus scoring constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Policy deciding the working/failing partition.
    pub policy: ReachabilityPolicy,
    /// Composite scoring constants.
    pub score: ScoreTable,
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Folds one run's probe outcomes into scored records and a failing map.
///
/// Every node appearing in `outcomes` lands in exactly one side of the
/// partition. Records are ordered by descending composite score, ties broken
/// by ascending node URL. Per-kind ranks are contiguous over the working
/// nodes that succeeded at that kind. A run with zero working nodes returns
/// an empty record list and a fully populated failing map.
#[must_use]
pub fn aggregate_run(
    outcomes: &[ProbeOutcome],
    config: &RankingConfig,
) -> (Vec<NodeRecord>, BTreeMap<NodeUrl, String>) {
    let mut grouped: BTreeMap<NodeUrl, Vec<&ProbeOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        grouped.entry(outcome.node.clone()).or_default().push(outcome);
    }

    let mut records: BTreeMap<NodeUrl, NodeRecord> = BTreeMap::new();
    let mut failing: BTreeMap<NodeUrl, String> = BTreeMap::new();
    for (node, node_outcomes) in grouped {
        match classify(&node_outcomes, config.policy) {
            Some(error) => {
                failing.insert(node, error);
            }
            None => {
                records.insert(node.clone(), build_record(node, &node_outcomes));
            }
        }
    }

    let mut records: Vec<NodeRecord> = records.into_values().collect();
    for kind in ProbeKind::ALL {
        assign_ranks(&mut records, kind);
    }
    score_records(&mut records, &config.score);
    records.sort_by(|a, b| {
        b.composite_score
            .total_cmp(&a.composite_score)
            .then_with(|| a.node.cmp(&b.node))
    });
    (records, failing)
}

/// Returns the failing error message for a node, or `None` when it stays
/// working under the policy.
fn classify(outcomes: &[&ProbeOutcome], policy: ReachabilityPolicy) -> Option<String> {
    let first_error = ProbeKind::ALL.into_iter().find_map(|kind| {
        outcomes
            .iter()
            .find(|outcome| outcome.probe_kind == kind && !outcome.successful)
            .and_then(|outcome| outcome.error.clone())
            .filter(|message| !message.is_empty())
    })?;
    let reachable = match policy {
        ReachabilityPolicy::RequireConfig => outcomes
            .iter()
            .any(|outcome| outcome.probe_kind == ProbeKind::Config && outcome.successful),
        ReachabilityPolicy::AnyProbeSuccess => {
            outcomes.iter().any(|outcome| outcome.successful)
        }
    };
    if reachable { None } else { Some(first_error) }
}

/// Builds an unranked record from one node's outcomes.
fn build_record(node: NodeUrl, outcomes: &[&ProbeOutcome]) -> NodeRecord {
    let mut record = NodeRecord::new(node);
    for outcome in outcomes {
        if let Some(ProbeMeasurement::Config { version, .. }) = &outcome.measurement
            && outcome.successful
        {
            record.version.clone_from(version);
        }
        let report = record.report_mut(outcome.probe_kind);
        *report = ProbeReport {
            ok: outcome.successful,
            rank: None,
            total_duration: outcome.total_duration,
            measurement: outcome.measurement.clone(),
        };
    }
    record
}

/// Metric used to order one kind, lower-is-better after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RankKey {
    /// Higher count wins; duration breaks ties.
    Throughput {
        /// Iterations completed within the time box.
        count: u64,
        /// Wall-clock seconds spent in the probe.
        duration: f64,
    },
    /// Lower time wins.
    Time(f64),
}

/// Extracts the ordering key for one succeeded report of the given kind.
fn rank_key(kind: ProbeKind, report: &ProbeReport) -> Option<RankKey> {
    let measurement = report.measurement.as_ref()?;
    match (kind, measurement) {
        (ProbeKind::Blocks | ProbeKind::History, ProbeMeasurement::Throughput { count }) => {
            Some(RankKey::Throughput {
                count: *count,
                duration: report.total_duration,
            })
        }
        (ProbeKind::Config, ProbeMeasurement::Config { access_time, .. })
        | (ProbeKind::Call, ProbeMeasurement::PointLatency { access_time }) => {
            Some(RankKey::Time(*access_time))
        }
        (ProbeKind::Latency, ProbeMeasurement::RepeatedLatency { avg_latency, .. }) => {
            Some(RankKey::Time(*avg_latency))
        }
        (ProbeKind::Staleness, ProbeMeasurement::Staleness { head_delay, .. }) => {
            Some(RankKey::Time(*head_delay))
        }
        _ => None,
    }
}

/// Assigns contiguous 1..K ranks for one kind across the working records.
fn assign_ranks(records: &mut [NodeRecord], kind: ProbeKind) {
    let mut ranked: Vec<(usize, RankKey)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let report = record.report(kind)?;
            if report.ok { rank_key(kind, report).map(|key| (index, key)) } else { None }
        })
        .collect();
    ranked.sort_by(|(index_a, key_a), (index_b, key_b)| {
        let ordering = match (key_a, key_b) {
            (
                RankKey::Throughput { count: count_a, duration: duration_a },
                RankKey::Throughput { count: count_b, duration: duration_b },
            ) => count_b.cmp(count_a).then_with(|| duration_a.total_cmp(duration_b)),
            (RankKey::Time(time_a), RankKey::Time(time_b)) => time_a.total_cmp(time_b),
            // Mixed keys cannot occur within one kind.
            (RankKey::Throughput { .. }, RankKey::Time(_)) => std::cmp::Ordering::Less,
            (RankKey::Time(_), RankKey::Throughput { .. }) => std::cmp::Ordering::Greater,
        };
        ordering.then_with(|| records[*index_a].node.cmp(&records[*index_b].node))
    });
    for (position, (index, _)) in ranked.into_iter().enumerate() {
        let rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
        if let Some(record) = records.get_mut(index) {
            record.report_mut(kind).rank = Some(rank);
        }
    }
}

// ============================================================================
// SECTION: Composite Scoring
// ============================================================================

/// Computes the composite score for every working record in place.
fn score_records(records: &mut [NodeRecord], table: &ScoreTable) {
    let max_counts: BTreeMap<ProbeKind, u64> = [ProbeKind::Blocks, ProbeKind::History]
        .into_iter()
        .map(|kind| (kind, max_count(records, kind)))
        .collect();
    for record in records.iter_mut() {
        record.composite_score = composite_score(record, table, &max_counts);
    }
}

/// Largest successful count observed for a throughput kind across the run.
fn max_count(records: &[NodeRecord], kind: ProbeKind) -> u64 {
    records
        .iter()
        .filter_map(|record| {
            let report = record.report(kind)?;
            if !report.ok {
                return None;
            }
            match report.measurement {
                Some(ProbeMeasurement::Throughput { count }) => Some(count),
                _ => None,
            }
        })
        .max()
        .unwrap_or(0)
}

/// Weighted composite score for one record, penalty and bonus applied.
fn composite_score(
    record: &NodeRecord,
    table: &ScoreTable,
    max_counts: &BTreeMap<ProbeKind, u64>,
) -> f64 {
    let mut weighted = 0.0;
    let mut critical_failed = false;
    for kind in ProbeKind::ALL {
        let report = record.report(kind);
        let succeeded = report.is_some_and(|report| report.ok);
        if !succeeded && table.is_critical(kind) {
            critical_failed = true;
        }
        let normalized = report.and_then(|report| normalized_score(kind, report, table, max_counts));
        weighted += table.weight(kind) * normalized.unwrap_or(0.0);
    }
    let mut score = weighted + version_bonus(record.version.as_deref(), table.version_bonus_cap);
    if critical_failed {
        score *= table.critical_penalty;
    }
    round2(score)
}

/// Normalizes one succeeded report into a 0-100 kind score.
fn normalized_score(
    kind: ProbeKind,
    report: &ProbeReport,
    table: &ScoreTable,
    max_counts: &BTreeMap<ProbeKind, u64>,
) -> Option<f64> {
    if !report.ok {
        return None;
    }
    let key = rank_key(kind, report)?;
    match key {
        RankKey::Throughput { count, .. } => {
            let max = max_counts.get(&kind).copied().unwrap_or(0);
            if max == 0 {
                Some(0.0)
            } else {
                // Counts are bounded by the time box; f64 precision is ample.
                #[allow(clippy::cast_precision_loss, reason = "Counts stay far below 2^52.")]
                Some(count as f64 / max as f64 * 100.0)
            }
        }
        RankKey::Time(value) => {
            let ceiling = table.ceiling(kind)?;
            if ceiling <= 0.0 {
                return Some(0.0);
            }
            Some((1.0 - value / ceiling).clamp(0.0, 1.0) * 100.0)
        }
    }
}

/// Monotonic bonus from the advertised version string, capped.
///
/// Parses the leading `major.minor.patch` numeric triple; any unparseable
/// version yields zero.
fn version_bonus(version: Option<&str>, cap: f64) -> f64 {
    let Some(version) = version else {
        return 0.0;
    };
    let mut parts = version.trim().splitn(3, '.');
    let major: u64 = match parts.next().and_then(|part| numeric_prefix(part).parse().ok()) {
        Some(value) => value,
        None => return 0.0,
    };
    let minor: u64 = parts
        .next()
        .and_then(|part| numeric_prefix(part).parse().ok())
        .unwrap_or(0);
    let patch: u64 = parts
        .next()
        .and_then(|part| numeric_prefix(part).parse().ok())
        .unwrap_or(0);
    #[allow(clippy::cast_precision_loss, reason = "Version components stay far below 2^52.")]
    let bonus = major as f64 + minor as f64 * 0.1 + patch as f64 * 0.01;
    bonus.min(cap)
}

/// Returns the leading ASCII-digit prefix of a version component.
fn numeric_prefix(part: &str) -> &str {
    let end = part.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(part.len());
    &part[..end]
}

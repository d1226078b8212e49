// crates/chainbench-core/src/core/record.rs
// ============================================================================
// Module: Chain-Bench Node Records
// Description: Per-run aggregate of probe reports, ranks, and composite score.
// Purpose: Hold one fully populated record per working node per run.
// Dependencies: serde, crate::core::{node, probe}
// ============================================================================

//! ## Overview
//! A node record is built fresh for every run and never carried across runs
//! in memory; history lives only in the store. Every probe kind has a slot in
//! the record: probes that failed for an otherwise-working node leave their
//! slot at the default `ok = false` state rather than excluding the node.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::node::NodeUrl;
use crate::core::probe::ProbeKind;
use crate::core::probe::ProbeMeasurement;

// ============================================================================
// SECTION: Probe Report
// ============================================================================

/// Per-kind slot inside a node record.
///
/// # Invariants
/// - `rank` is `None` when the probe did not succeed for this node in this
///   run; unranked nodes do not occupy a rank slot.
/// - `ok == true` implies `measurement.is_some()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Whether this probe succeeded for this node in this run.
    pub ok: bool,
    /// One-based rank among working nodes that succeeded at this probe.
    pub rank: Option<u32>,
    /// Wall-clock seconds spent in the probe invocation.
    pub total_duration: f64,
    /// Kind-specific measurement, present when `ok` is true.
    pub measurement: Option<ProbeMeasurement>,
}

// ============================================================================
// SECTION: Node Record
// ============================================================================

/// Per-run aggregate for one working node.
///
/// # Invariants
/// - `reports` contains a slot for every [`ProbeKind`].
/// - `composite_score` is in descending-better polarity, opposite to ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node this record describes.
    pub node: NodeUrl,
    /// Advertised version string from the config probe, when available.
    pub version: Option<String>,
    /// One report per probe kind.
    pub reports: BTreeMap<ProbeKind, ProbeReport>,
    /// Normalized weighted composite score (0-105, higher is better).
    pub composite_score: f64,
}

impl NodeRecord {
    /// Creates an empty record with default (`ok = false`) slots for every
    /// probe kind.
    #[must_use]
    pub fn new(node: NodeUrl) -> Self {
        let reports =
            ProbeKind::ALL.into_iter().map(|kind| (kind, ProbeReport::default())).collect();
        Self {
            node,
            version: None,
            reports,
            composite_score: 0.0,
        }
    }

    /// Returns the report slot for a probe kind.
    #[must_use]
    pub fn report(&self, kind: ProbeKind) -> Option<&ProbeReport> {
        self.reports.get(&kind)
    }

    /// Returns a mutable report slot for a probe kind.
    pub fn report_mut(&mut self, kind: ProbeKind) -> &mut ProbeReport {
        self.reports.entry(kind).or_default()
    }
}

// crates/chainbench-core/src/core/node.rs
// ============================================================================
// Module: Chain-Bench Node Identity
// Description: Canonical opaque identifier for benchmarked RPC endpoints.
// Purpose: Provide a strongly typed, serializable node address with a stable string form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A node is identified by its RPC endpoint URL. The identifier is opaque to
//! the core: URL validation happens at the probing boundary, and the store
//! deduplicates nodes by this exact string form across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Node Identifier
// ============================================================================

/// RPC endpoint identifier for a benchmarked node.
///
/// # Invariants
/// - The string form is stable; two nodes are the same entity iff their
///   string forms are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeUrl(String);

impl NodeUrl {
    /// Creates a new node identifier.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for NodeUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeUrl {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

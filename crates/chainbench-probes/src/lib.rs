// crates/chainbench-probes/src/lib.rs
// ============================================================================
// Module: Chain-Bench Probes Library
// Description: HTTP JSON-RPC implementation of the probing capability.
// Purpose: Expose the network-facing prober and its configuration.
// Dependencies: crate::{prober, rpc}
// ============================================================================

//! ## Overview
//! This crate implements the core probing capability over JSON-RPC 2.0 via
//! blocking HTTP. Each probe method connects within the caller's budget,
//! issues the RPC calls its measurement requires, and returns a typed
//! sample; all network failures surface as opaque probe errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod prober;
mod rpc;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use prober::HttpProber;
pub use prober::ProberConfig;

// crates/chainbench-probes/src/prober.rs
// ============================================================================
// Module: HTTP Prober
// Description: JSON-RPC implementation of every probe kind.
// Purpose: Measure node performance over bounded blocking RPC calls.
// Dependencies: chainbench-core, serde_json, time, crate::rpc
// ============================================================================

//! ## Overview
//! Each probe method connects fresh within the caller's budget, performs the
//! RPC calls its measurement requires, and returns a typed sample. Timing is
//! wall-clock around the RPC call itself, rounded to two decimals. Throughput
//! loops stop at the first error but keep the accumulated count; a
//! non-positive time box means zero iterations and a successful zero count.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;
use std::time::Instant;

use chainbench_core::ConfigSample;
use chainbench_core::LatencySample;
use chainbench_core::NodeUrl;
use chainbench_core::PointSample;
use chainbench_core::ProbeBudget;
use chainbench_core::ProbeError;
use chainbench_core::Prober;
use chainbench_core::StalenessSample;
use chainbench_core::ThroughputSample;
use chainbench_core::round2;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::well_known::Iso8601;

use crate::rpc::RpcClient;

/// Account history page size per RPC call.
const HISTORY_BATCH: u64 = 100;
/// Pause between repeated-latency samples.
const LATENCY_PAUSE: Duration = Duration::from_millis(100);

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP prober.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProberConfig {
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("chainbench/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

// ============================================================================
// SECTION: Prober Implementation
// ============================================================================

/// JSON-RPC prober over blocking HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpProber {
    /// Prober configuration.
    config: ProberConfig,
}

impl HttpProber {
    /// Creates a prober with the given configuration.
    #[must_use]
    pub const fn new(config: ProberConfig) -> Self {
        Self { config }
    }

    /// Connects to a node within the budget.
    fn connect(&self, node: &NodeUrl, budget: &ProbeBudget) -> Result<RpcClient, ProbeError> {
        RpcClient::connect(node, budget, &self.config.user_agent)
    }
}

impl Prober for HttpProber {
    fn config(&self, node: &NodeUrl, budget: &ProbeBudget) -> Result<ConfigSample, ProbeError> {
        let client = self.connect(node, budget)?;
        let started = Instant::now();
        client.call("condenser_api.get_config", json!([]))?;
        let access_time = round2(started.elapsed().as_secs_f64());
        // Version lookup is best-effort; older nodes lack database_api.
        let version = client
            .call("database_api.get_version", json!({}))
            .ok()
            .as_ref()
            .and_then(|result| result.get("blockchain_version"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(ConfigSample {
            version,
            access_time,
        })
    }

    fn block_throughput(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
    ) -> Result<ThroughputSample, ProbeError> {
        let client = self.connect(node, budget)?;
        let properties = client.call("condenser_api.get_dynamic_global_properties", json!([]))?;
        let head = read_u64(&properties, "head_block_number")?;
        let start = head.saturating_mul(3) / 4;
        let deadline = Instant::now() + budget.time_box();
        let mut count: u64 = 0;
        while Instant::now() < deadline {
            let block_num = start.saturating_add(count);
            match client.call_unretried("condenser_api.get_block", json!([block_num])) {
                Ok(block) if !block.is_null() => count += 1,
                _ => break,
            }
        }
        Ok(ThroughputSample {
            count,
        })
    }

    fn history_throughput(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        account: &str,
    ) -> Result<ThroughputSample, ProbeError> {
        let client = self.connect(node, budget)?;
        let deadline = Instant::now() + budget.time_box();
        let mut count: u64 = 0;
        // -1 asks for the most recent page; afterwards page backwards from
        // the lowest index seen.
        let mut start: i64 = -1;
        while Instant::now() < deadline {
            let params = json!([account, start, HISTORY_BATCH]);
            let Ok(page) = client.call_unretried("condenser_api.get_account_history", params)
            else {
                break;
            };
            let Some(entries) = page.as_array() else {
                break;
            };
            if entries.is_empty() {
                break;
            }
            count = count.saturating_add(u64::try_from(entries.len()).unwrap_or(u64::MAX));
            let lowest = entries
                .iter()
                .filter_map(|entry| entry.get(0).and_then(Value::as_i64))
                .min();
            match lowest {
                Some(index) if index > 0 => start = index - 1,
                _ => break,
            }
        }
        // A node that cannot serve the first page at all is a call failure,
        // not a zero-throughput success.
        if count == 0 && budget.time_box_ms > 0 {
            client.call("condenser_api.get_account_history", json!([account, -1, 1]))?;
        }
        Ok(ThroughputSample {
            count,
        })
    }

    fn call_latency(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        author: &str,
        permlink: &str,
    ) -> Result<PointSample, ProbeError> {
        let client = self.connect(node, budget)?;

        let started = Instant::now();
        let content = client.call("condenser_api.get_content", json!([author, permlink]));
        if content.as_ref().is_ok_and(has_author) {
            return Ok(PointSample {
                access_time: round2(started.elapsed().as_secs_f64()),
            });
        }

        let started = Instant::now();
        let discussions = client.call(
            "condenser_api.get_discussions_by_blog",
            json!([{ "tag": author, "limit": 1 }]),
        );
        if discussions.as_ref().is_ok_and(|result| {
            result.as_array().is_some_and(|posts| !posts.is_empty())
        }) {
            return Ok(PointSample {
                access_time: round2(started.elapsed().as_secs_f64()),
            });
        }

        let started = Instant::now();
        client.call("condenser_api.get_dynamic_global_properties", json!([]))?;
        Ok(PointSample {
            access_time: round2(started.elapsed().as_secs_f64()),
        })
    }

    fn repeated_latency(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        samples: u32,
    ) -> Result<LatencySample, ProbeError> {
        let client = self.connect(node, budget)?;
        let mut latencies: Vec<f64> = Vec::with_capacity(usize::try_from(samples).unwrap_or(0));
        for taken in 0..samples {
            let started = Instant::now();
            if client
                .call_unretried("condenser_api.get_dynamic_global_properties", json!([]))
                .is_ok()
            {
                latencies.push(started.elapsed().as_secs_f64());
            }
            if taken + 1 < samples {
                thread::sleep(LATENCY_PAUSE);
            }
        }
        if latencies.is_empty() {
            return Err(ProbeError::Call("all latency samples failed".to_owned()));
        }
        let min = latencies.iter().copied().fold(f64::INFINITY, f64::min);
        let max = latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = latencies.iter().sum();
        let samples_taken = u32::try_from(latencies.len()).unwrap_or(u32::MAX);
        Ok(LatencySample {
            min_latency: round2(min),
            max_latency: round2(max),
            avg_latency: round2(sum / f64::from(samples_taken)),
            samples_taken,
        })
    }

    fn staleness(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
    ) -> Result<StalenessSample, ProbeError> {
        let client = self.connect(node, budget)?;
        let properties = client.call("condenser_api.get_dynamic_global_properties", json!([]))?;
        let head = read_u64(&properties, "head_block_number")?;
        let irreversible = read_u64(&properties, "last_irreversible_block_num")?;
        let head_time = properties
            .get("time")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::Semantic("missing head time".to_owned()))?;
        let parsed = PrimitiveDateTime::parse(head_time, &Iso8601::DEFAULT)
            .map_err(|_| ProbeError::Semantic("unparseable head time".to_owned()))?
            .assume_utc();
        let head_delay = (OffsetDateTime::now_utc() - parsed).as_seconds_f64();
        let head_lag = i64::try_from(head)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(irreversible).unwrap_or(i64::MAX));
        Ok(StalenessSample {
            head_delay: round2(head_delay),
            head_lag,
        })
    }
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Reads a required unsigned integer field from an RPC payload.
fn read_u64(payload: &Value, field: &str) -> Result<u64, ProbeError> {
    payload
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| ProbeError::Semantic(format!("missing {field}")))
}

/// Returns whether a content payload names a real author.
fn has_author(content: &Value) -> bool {
    content
        .get("author")
        .and_then(Value::as_str)
        .is_some_and(|author| !author.is_empty())
}

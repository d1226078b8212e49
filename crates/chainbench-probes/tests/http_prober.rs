// crates/chainbench-probes/tests/http_prober.rs
// ============================================================================
// Module: HTTP Prober Tests
// Description: Probe behavior against a scripted local JSON-RPC server.
// Purpose: Validate measurement semantics, fallbacks, and error mapping.
// Dependencies: chainbench-probes, chainbench-core, tiny_http
// ============================================================================

//! ## Overview
//! Runs each probe against a local server that answers JSON-RPC requests
//! from a per-method script, covering the config version lookup, the
//! time-box degeneracy, the point-query fallback chain, staleness parsing,
//! and RPC error mapping.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::thread;

use chainbench_core::NodeUrl;
use chainbench_core::ProbeBudget;
use chainbench_core::ProbeError;
use chainbench_core::Prober;
use chainbench_probes::HttpProber;
use chainbench_probes::ProberConfig;
use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Spawns a local JSON-RPC server answering `max_requests` requests through
/// the per-method script, then exiting.
fn spawn_rpc_server(
    max_requests: usize,
    script: impl Fn(&str) -> Value + Send + 'static,
) -> (NodeUrl, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let node = NodeUrl::new(format!("http://{addr}"));

    let handle = thread::spawn(move || {
        for _ in 0..max_requests {
            let Ok(mut request) = server.recv() else {
                break;
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let method = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|payload| {
                    payload.get("method").and_then(Value::as_str).map(str::to_owned)
                })
                .unwrap_or_default();
            let reply = script(&method);
            let response = Response::from_string(reply.to_string());
            let _ = request.respond(response);
        }
    });

    (node, handle)
}

/// Wraps a result payload in a JSON-RPC success envelope.
fn rpc_ok(result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "result": result, "id": 1 })
}

/// Builds a JSON-RPC error envelope with a message.
fn rpc_err(message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "error": { "code": -32_000, "message": message }, "id": 1 })
}

/// Budget with single attempts so request counts are deterministic.
fn single_attempt_budget() -> ProbeBudget {
    ProbeBudget {
        connect_retries: 1,
        call_retries: 1,
        timeout_ms: 5_000,
        time_box_ms: 5_000,
    }
}

// ============================================================================
// SECTION: Config Probe
// ============================================================================

/// Verifies the config probe times the fetch and picks up the advertised
/// version.
#[test]
fn config_probe_reports_version_and_timing() {
    let (node, handle) = spawn_rpc_server(2, |method| match method {
        "condenser_api.get_config" => rpc_ok(json!({ "IS_TEST_NET": false })),
        "database_api.get_version" => rpc_ok(json!({ "blockchain_version": "1.27.6" })),
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.config(&node, &single_attempt_budget()).unwrap();

    assert_eq!(sample.version.as_deref(), Some("1.27.6"));
    assert!(sample.access_time >= 0.0);
    handle.join().unwrap();
}

/// Verifies a failing version lookup degrades to `None` instead of failing
/// the probe.
#[test]
fn config_probe_tolerates_missing_version() {
    let (node, handle) = spawn_rpc_server(2, |method| match method {
        "condenser_api.get_config" => rpc_ok(json!({})),
        _ => rpc_err("method not found"),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.config(&node, &single_attempt_budget()).unwrap();

    assert_eq!(sample.version, None);
    handle.join().unwrap();
}

/// Verifies an RPC error envelope surfaces as a call failure with the
/// server's message.
#[test]
fn rpc_error_envelope_maps_to_call_error() {
    let (node, handle) = spawn_rpc_server(1, |_| rpc_err("flood limit exceeded"));

    let prober = HttpProber::new(ProberConfig::default());
    let error = prober.config(&node, &single_attempt_budget()).unwrap_err();

    assert!(matches!(error, ProbeError::Call(_)));
    assert!(error.to_string().contains("flood limit exceeded"));
    handle.join().unwrap();
}

/// Verifies an invalid node URL fails at connect time.
#[test]
fn invalid_url_fails_to_connect() {
    let prober = HttpProber::new(ProberConfig::default());
    let error = prober
        .config(&NodeUrl::new("not a url"), &single_attempt_budget())
        .unwrap_err();
    assert!(matches!(error, ProbeError::Connect(_)));
}

// ============================================================================
// SECTION: Throughput Probes
// ============================================================================

/// Verifies a zero time box yields a successful zero count after resolving
/// the head.
#[test]
fn block_probe_with_zero_time_box_counts_nothing() {
    let (node, handle) = spawn_rpc_server(1, |method| match method {
        "condenser_api.get_dynamic_global_properties" => rpc_ok(json!({
            "head_block_number": 80_000_000,
            "last_irreversible_block_num": 79_999_980,
            "time": "2026-08-23T12:00:00",
        })),
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let budget = ProbeBudget {
        time_box_ms: 0,
        ..single_attempt_budget()
    };
    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.block_throughput(&node, &budget).unwrap();

    assert_eq!(sample.count, 0);
    handle.join().unwrap();
}

/// Verifies the block loop counts fetched blocks and stops at the first
/// error while keeping the accumulated count.
#[test]
fn block_probe_counts_until_first_error() {
    let (node, handle) = spawn_rpc_server(4, |method| match method {
        "condenser_api.get_dynamic_global_properties" => rpc_ok(json!({
            "head_block_number": 1_000,
        })),
        "condenser_api.get_block" => {
            use std::sync::atomic::AtomicU32;
            use std::sync::atomic::Ordering;
            static SERVED: AtomicU32 = AtomicU32::new(0);
            if SERVED.fetch_add(1, Ordering::SeqCst) < 2 {
                rpc_ok(json!({ "block_id": "00bc614e" }))
            } else {
                rpc_err("block unavailable")
            }
        }
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.block_throughput(&node, &single_attempt_budget()).unwrap();

    assert_eq!(sample.count, 2);
    handle.join().unwrap();
}

/// Verifies history paging counts operations across batches.
#[test]
fn history_probe_counts_operations_across_pages() {
    let (node, handle) = spawn_rpc_server(2, |method| match method {
        "condenser_api.get_account_history" => {
            use std::sync::atomic::AtomicU32;
            use std::sync::atomic::Ordering;
            static SERVED: AtomicU32 = AtomicU32::new(0);
            if SERVED.fetch_add(1, Ordering::SeqCst) == 0 {
                rpc_ok(json!([[5, {}], [6, {}], [7, {}]]))
            } else {
                rpc_ok(json!([]))
            }
        }
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober
        .history_throughput(&node, &single_attempt_budget(), "thecrazygm")
        .unwrap();

    // First page has 3 operations starting at index 5; paging continues
    // from index 4 and the empty page ends the loop.
    assert_eq!(sample.count, 3);
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Latency Probes
// ============================================================================

/// Verifies the point query falls back to the author's blog when the target
/// content is missing.
#[test]
fn call_probe_falls_back_to_blog_listing() {
    let (node, handle) = spawn_rpc_server(2, |method| match method {
        "condenser_api.get_content" => rpc_ok(json!({ "author": "", "permlink": "" })),
        "condenser_api.get_discussions_by_blog" => {
            rpc_ok(json!([{ "author": "thecrazygm", "permlink": "still-lazy" }]))
        }
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober
        .call_latency(&node, &single_attempt_budget(), "thecrazygm", "gone")
        .unwrap();

    assert!(sample.access_time >= 0.0);
    handle.join().unwrap();
}

/// Verifies repeated latency reports statistics over successful samples.
#[test]
fn latency_probe_reports_statistics() {
    let (node, handle) = spawn_rpc_server(3, |method| match method {
        "condenser_api.get_dynamic_global_properties" => rpc_ok(json!({
            "head_block_number": 1_000,
        })),
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.repeated_latency(&node, &single_attempt_budget(), 3).unwrap();

    assert_eq!(sample.samples_taken, 3);
    assert!(sample.min_latency <= sample.avg_latency);
    assert!(sample.avg_latency <= sample.max_latency);
    handle.join().unwrap();
}

/// Verifies a probe whose every sample fails reports an error instead of an
/// empty statistic.
#[test]
fn latency_probe_fails_with_zero_successes() {
    let (node, handle) = spawn_rpc_server(2, |_| rpc_err("throttled"));

    let prober = HttpProber::new(ProberConfig::default());
    let error = prober
        .repeated_latency(&node, &single_attempt_budget(), 2)
        .unwrap_err();

    assert!(matches!(error, ProbeError::Call(_)));
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Staleness Probe
// ============================================================================

/// Verifies staleness derives head lag and parses the head timestamp.
#[test]
fn staleness_probe_derives_delay_and_lag() {
    let (node, handle) = spawn_rpc_server(1, |method| match method {
        "condenser_api.get_dynamic_global_properties" => rpc_ok(json!({
            "head_block_number": 80_000_000,
            "last_irreversible_block_num": 79_999_980,
            "time": "2020-01-01T00:00:00",
        })),
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let sample = prober.staleness(&node, &single_attempt_budget()).unwrap();

    assert_eq!(sample.head_lag, 20);
    // The scripted head time is far in the past, so the delay is large.
    assert!(sample.head_delay > 1_000_000.0);
    handle.join().unwrap();
}

/// Verifies an unparseable head time is a semantic failure.
#[test]
fn staleness_probe_rejects_bad_head_time() {
    let (node, handle) = spawn_rpc_server(1, |method| match method {
        "condenser_api.get_dynamic_global_properties" => rpc_ok(json!({
            "head_block_number": 100,
            "last_irreversible_block_num": 90,
            "time": "yesterday",
        })),
        other => rpc_err(&format!("unexpected method {other}")),
    });

    let prober = HttpProber::new(ProberConfig::default());
    let error = prober.staleness(&node, &single_attempt_budget()).unwrap_err();

    assert!(matches!(error, ProbeError::Semantic(_)));
    handle.join().unwrap();
}

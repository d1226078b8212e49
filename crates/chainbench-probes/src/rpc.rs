// crates/chainbench-probes/src/rpc.rs
// ============================================================================
// Module: JSON-RPC Transport
// Description: Blocking JSON-RPC 2.0 client over HTTP POST.
// Purpose: Provide bounded, retried RPC calls with opaque error strings.
// Dependencies: chainbench-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! One client is built per probe invocation so the caller's timeout budget
//! applies to every request it makes. Calls are retried up to the budget's
//! call-retry count; a JSON-RPC error object in an otherwise valid response
//! counts as a failed attempt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use chainbench_core::NodeUrl;
use chainbench_core::ProbeBudget;
use chainbench_core::ProbeError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use serde_json::json;
use url::Url;

// ============================================================================
// SECTION: RPC Client
// ============================================================================

/// Blocking JSON-RPC 2.0 client bound to one node for one probe invocation.
pub struct RpcClient {
    /// HTTP client carrying the budget's per-call timeout.
    client: Client,
    /// Parsed endpoint URL.
    endpoint: Url,
    /// Per-call retry count from the budget.
    call_retries: u32,
}

impl RpcClient {
    /// Connects to a node within the budget.
    ///
    /// Client construction is retried up to the budget's connect-retry count.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Connect`] when the URL is invalid or the client
    /// cannot be built.
    pub fn connect(
        node: &NodeUrl,
        budget: &ProbeBudget,
        user_agent: &str,
    ) -> Result<Self, ProbeError> {
        let endpoint = Url::parse(node.as_str())
            .map_err(|_| ProbeError::Connect("invalid node url".to_owned()))?;
        let attempts = budget.connect_retries.max(1);
        let mut last_error = String::new();
        for _ in 0..attempts {
            match Client::builder()
                .timeout(budget.timeout())
                .user_agent(user_agent.to_owned())
                .redirect(Policy::none())
                .build()
            {
                Ok(client) => {
                    return Ok(Self {
                        client,
                        endpoint: endpoint.clone(),
                        call_retries: budget.call_retries,
                    });
                }
                Err(error) => last_error = error.to_string(),
            }
        }
        Err(ProbeError::Connect(last_error))
    }

    /// Issues one JSON-RPC call with retries and returns its `result` field.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Call`] when every attempt fails, including
    /// attempts that received a JSON-RPC error object.
    pub fn call(&self, method: &str, params: Value) -> Result<Value, ProbeError> {
        let attempts = self.call_retries.max(1);
        let mut last_error = String::new();
        for _ in 0..attempts {
            match self.call_once(method, &params) {
                Ok(result) => return Ok(result),
                Err(message) => last_error = message,
            }
        }
        Err(ProbeError::Call(format!("{method}: {last_error}")))
    }

    /// Issues one JSON-RPC call without retries.
    ///
    /// Throughput loops use this directly so a failing node cannot burn the
    /// time box on retries.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Call`] when the request or the response fails.
    pub fn call_unretried(&self, method: &str, params: Value) -> Result<Value, ProbeError> {
        self.call_once(method, &params)
            .map_err(|message| ProbeError::Call(format!("{method}: {message}")))
    }

    /// One request/response cycle, with the error as a plain message.
    fn call_once(&self, method: &str, params: &Value) -> Result<Value, String> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .map_err(|_| "request failed".to_owned())?;
        if !response.status().is_success() {
            return Err(format!("http status {}", response.status().as_u16()));
        }
        let payload: Value =
            response.json().map_err(|_| "invalid json response".to_owned())?;
        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("rpc error");
            return Err(message.to_owned());
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| "missing result field".to_owned())
    }
}

//! Fallback JSON-RPC client.

use crate::config::RpcConfig;
use crate::error::{Error, Result};
use crate::rpc::Rpc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    #[allow(dead_code)]
    id: Option<u64>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client that tries a fixed, ordered list of endpoints.
///
/// Each call walks the list from the front; the first endpoint returning a
/// non-error `result` wins and later endpoints are never contacted. There is
/// no per-endpoint retry beyond the HTTP timeout - endpoints are independent
/// and stateless for read calls, so moving on is cheaper than backing off.
pub struct RpcClient {
    endpoints: Vec<String>,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint list is empty or the HTTP client
    /// fails to build.
    pub fn new(config: &RpcConfig) -> Result<Self> {
        Self::with_endpoints(
            config.endpoints.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client from an explicit endpoint list and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint list is empty or the HTTP client
    /// fails to build.
    pub fn with_endpoints(endpoints: Vec<String>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::Config(
                "RPC client requires at least one endpoint".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoints,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// The configured endpoint list, in preference order.
    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Probe chain reachability via `eth_blockNumber`.
    ///
    /// Returns the head block number. This is a health check only; it plays
    /// no part in verification proper.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RpcExhausted`] if every endpoint fails.
    pub async fn probe(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", Vec::new()).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| Error::Format("eth_blockNumber returned a non-string".to_string()))?;
        u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
            .map_err(|e| Error::Format(format!("invalid block number {hex_str}: {e}")))
    }

    /// Issue one request against one endpoint.
    async fn attempt(&self, endpoint: &str, request: &JsonRpcRequest<'_>) -> Result<Value> {
        let response = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::VerificationUnavailable(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::VerificationUnavailable(format!(
                "{endpoint}: HTTP {status}"
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| Error::VerificationUnavailable(format!("{endpoint}: bad body: {e}")))?;

        if let Some(err) = body.error {
            return Err(Error::VerificationUnavailable(format!(
                "{endpoint}: RPC error {}: {}",
                err.code, err.message
            )));
        }

        body.result.ok_or_else(|| {
            Error::VerificationUnavailable(format!("{endpoint}: response carried no result"))
        })
    }
}

impl Rpc for RpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: &params,
        };

        let mut last_error = String::from("no endpoints attempted");
        for endpoint in &self.endpoints {
            debug!(endpoint, method, "attempting RPC call");
            match self.attempt(endpoint, &request).await {
                Ok(result) => {
                    debug!(endpoint, method, "RPC call succeeded");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(endpoint, method, error = %e, "RPC endpoint failed, trying next");
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::RpcExhausted {
            last_error,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Spawn a one-shot HTTP server returning a fixed response, and return
    /// its URL. The listener serves connections until the test ends.
    async fn spawn_endpoint(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn client(endpoints: Vec<String>) -> RpcClient {
        RpcClient::with_endpoints(endpoints, Duration::from_secs(2)).expect("client")
    }

    const OK_BODY: &str = r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#;
    const RPC_ERR_BODY: &str =
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"boom"}}"#;

    #[tokio::test]
    async fn test_first_endpoint_wins() {
        let e1 = spawn_endpoint("200 OK", OK_BODY).await;
        let e2 = spawn_endpoint("200 OK", RPC_ERR_BODY).await;
        let client = client(vec![e1, e2]);

        let result = client
            .call("eth_blockNumber", Vec::new())
            .await
            .expect("first endpoint answers");
        assert_eq!(result, serde_json::json!("0x2a"));
    }

    #[tokio::test]
    async fn test_fallback_past_http_errors() {
        let e1 = spawn_endpoint("500 Internal Server Error", "").await;
        let e2 = spawn_endpoint("502 Bad Gateway", "").await;
        let e3 = spawn_endpoint("200 OK", OK_BODY).await;
        let client = client(vec![e1, e2, e3]);

        let result = client
            .call("eth_blockNumber", Vec::new())
            .await
            .expect("third endpoint answers");
        assert_eq!(result, serde_json::json!("0x2a"));
    }

    #[tokio::test]
    async fn test_fallback_past_rpc_error_field() {
        let e1 = spawn_endpoint("200 OK", RPC_ERR_BODY).await;
        let e2 = spawn_endpoint("200 OK", OK_BODY).await;
        let client = client(vec![e1, e2]);

        let result = client
            .call("eth_call", Vec::new())
            .await
            .expect("second endpoint answers");
        assert_eq!(result, serde_json::json!("0x2a"));
    }

    #[tokio::test]
    async fn test_all_endpoints_failing_exhausts() {
        let e1 = spawn_endpoint("500 Internal Server Error", "").await;
        let e2 = spawn_endpoint("200 OK", RPC_ERR_BODY).await;
        let client = client(vec![e1, e2]);

        let err = client
            .call("eth_blockNumber", Vec::new())
            .await
            .expect_err("all endpoints fail");
        match err {
            Error::RpcExhausted { last_error } => {
                // Last error comes from the final endpoint in the list.
                assert!(last_error.contains("boom"), "got: {last_error}");
            }
            other => panic!("expected RpcExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_skipped() {
        // Port 9 (discard) is almost certainly closed.
        let dead = "http://127.0.0.1:9".to_string();
        let live = spawn_endpoint("200 OK", OK_BODY).await;
        let client = client(vec![dead, live]);

        let result = client
            .call("eth_blockNumber", Vec::new())
            .await
            .expect("live endpoint answers");
        assert_eq!(result, serde_json::json!("0x2a"));
    }

    #[tokio::test]
    async fn test_probe_parses_block_number() {
        let live = spawn_endpoint("200 OK", OK_BODY).await;
        let client = client(vec![live]);
        assert_eq!(client.probe().await.expect("probe"), 42);
    }

    #[test]
    fn test_empty_endpoint_list_rejected() {
        let result = RpcClient::with_endpoints(Vec::new(), Duration::from_secs(1));
        assert!(result.is_err());
    }
}

// src/tool/http.rs
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use super::types::{ToolArgs, ToolError, ToolResponse};
use super::ToolClient;
use crate::config::ClientConfig;

/// Code reported when the tool itself flags its result with `isError`.
pub const TOOL_RESULT_ERROR_CODE: i64 = -32000;

#[derive(Serialize)]
struct CallParams<'a> {
    name: &'a str,
    arguments: &'a ToolArgs,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: CallParams<'a>,
    id: i64,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<ToolResponse>,
    #[serde(default)]
    error: Option<RpcError>,
}

// Error bodies seen from the endpoint and from forwarding proxies.
#[derive(Deserialize)]
struct HttpErrorBody {
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-RPC 2.0 `tools/call` over HTTP with bearer authorization.
pub struct HttpToolClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpToolClient {
    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coupon-feed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> ToolError {
        let details = serde_json::from_str::<HttpErrorBody>(body)
            .ok()
            .and_then(|b| b.details.or(b.error))
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        ToolError::Transport(details)
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn invoke(&self, tool: &str, args: &ToolArgs) -> Result<ToolResponse, ToolError> {
        if self.api_key.trim().is_empty() {
            return Err(ToolError::Config(
                "No API key configured. Set MCD_MCP_TOKEN or api_key in the config file."
                    .to_string(),
            ));
        }

        let req = RpcRequest {
            jsonrpc: "2.0",
            method: "tools/call",
            params: CallParams {
                name: tool,
                arguments: args,
            },
            id: chrono::Utc::now().timestamp_millis(),
        };

        let t0 = Instant::now();
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "tool", error = ?e, tool, "tool http error");
                ToolError::Transport(e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("reading response body: {e}")))?;
        histogram!("tool_invoke_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(target: "tool", tool, status = status.as_u16(), bytes = body.len(), "tool call returned");

        if !status.is_success() {
            counter!("tool_http_status_errors_total").increment(1);
            return Err(Self::http_error(status, &body));
        }

        let rpc: RpcResponse =
            serde_json::from_str(&body).map_err(|e| ToolError::Decode(e.to_string()))?;
        if let Some(err) = rpc.error {
            return Err(ToolError::Protocol {
                code: err.code,
                message: err.message,
            });
        }
        let result = rpc.result.ok_or_else(|| {
            ToolError::Decode("response carried neither result nor error".to_string())
        })?;
        if result.is_error {
            return Err(ToolError::Protocol {
                code: TOOL_RESULT_ERROR_CODE,
                message: result.joined_text(),
            });
        }
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_details_then_error_then_status() {
        let s = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(
            HttpToolClient::http_error(s, r#"{"error":"x","details":"upstream down"}"#),
            ToolError::Transport("upstream down".into())
        );
        assert_eq!(
            HttpToolClient::http_error(s, r#"{"error":"Missing Authorization header"}"#),
            ToolError::Transport("Missing Authorization header".into())
        );
        assert_eq!(
            HttpToolClient::http_error(s, "<html>bad gateway</html>"),
            ToolError::Transport("Request failed with status 502".into())
        );
    }

    #[test]
    fn request_envelope_shape() {
        let mut args = ToolArgs::new();
        args.insert("city".into(), serde_json::json!("上海"));
        let req = RpcRequest {
            jsonrpc: "2.0",
            method: "tools/call",
            params: CallParams {
                name: "my-coupons",
                arguments: &args,
            },
            id: 7,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["method"], "tools/call");
        assert_eq!(v["params"]["name"], "my-coupons");
        assert_eq!(v["params"]["arguments"]["city"], "上海");
        assert_eq!(v["id"], 7);
    }
}

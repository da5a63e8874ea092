// src/tool/types.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Argument mapping passed to a tool. `serde_json::Map` keeps keys sorted,
/// so its JSON form is canonical.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// One piece of tool output. Only `text` fragments are consumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentFragment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentFragment {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(s.into()),
        }
    }
}

/// Successful result of a `tools/call`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResponse {
    #[serde(default)]
    pub content: Vec<ContentFragment>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn from_text(s: impl Into<String>) -> Self {
        Self {
            content: vec![ContentFragment::text(s)],
            is_error: false,
        }
    }

    /// All text fragments, in order, joined by line breaks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Invocation-level failures. Extraction never produces one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No credential configured; no request was attempted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure, timeout, or a non-success HTTP status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC error payload, or a tool result flagged `isError`.
    #[error("MCP Error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// The body was not a JSON-RPC response envelope.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ToolError {
    /// Short machine-readable kind for logs and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Config(_) => "config",
            ToolError::Transport(_) => "transport",
            ToolError::Protocol { .. } => "protocol",
            ToolError::Decode(_) => "decode",
        }
    }
}

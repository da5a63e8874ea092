// src/tool/mock.rs
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{ToolArgs, ToolError, ToolResponse};
use super::ToolClient;

type Scripted = Result<ToolResponse, ToolError>;

/// Deterministic in-process tool client for tests and local runs.
///
/// Queued results are served first, then the fallback (if any). Every call is
/// recorded so callers can assert on invocation counts.
#[derive(Default)]
pub struct ScriptedToolClient {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    calls: Mutex<Vec<(String, ToolArgs)>>,
}

impl ScriptedToolClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        let c = Self::new();
        c.set_fallback(Ok(ToolResponse::from_text(text)));
        c
    }

    pub fn push(&self, result: Scripted) {
        self.queue.lock().expect("script mutex poisoned").push_back(result);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Ok(ToolResponse::from_text(text)));
    }

    pub fn set_fallback(&self, result: Scripted) {
        *self.fallback.lock().expect("script mutex poisoned") = Some(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex poisoned").len()
    }

    pub fn calls(&self) -> Vec<(String, ToolArgs)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl ToolClient for ScriptedToolClient {
    async fn invoke(&self, tool: &str, args: &ToolArgs) -> Result<ToolResponse, ToolError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((tool.to_string(), args.clone()));

        if let Some(next) = self.queue.lock().expect("script mutex poisoned").pop_front() {
            return next;
        }
        self.fallback
            .lock()
            .expect("script mutex poisoned")
            .clone()
            .unwrap_or_else(|| Err(ToolError::Transport("no scripted response left".into())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_then_fallback_then_exhausted() {
        let c = ScriptedToolClient::new();
        c.push_text("first");
        c.set_fallback(Ok(ToolResponse::from_text("rest")));
        let args = ToolArgs::new();

        assert_eq!(c.invoke("t", &args).await.unwrap().joined_text(), "first");
        assert_eq!(c.invoke("t", &args).await.unwrap().joined_text(), "rest");
        assert_eq!(c.call_count(), 2);

        let empty = ScriptedToolClient::new();
        assert!(matches!(
            empty.invoke("t", &args).await,
            Err(ToolError::Transport(_))
        ));
    }
}

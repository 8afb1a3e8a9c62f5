//! Provider trait: the model completion hook.
//!
//! A Provider takes the full transcript and returns the model's raw text.
//! Tool invocations are *not* negotiated through the provider: they are
//! embedded in that text and extracted by the agent's parser.
//!
//! Failures must surface as `Err`, never as malformed text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;

/// Sampling options for a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: default_temperature(),
        }
    }
}

/// A tool definition rendered into the system prompt so the model knows
/// which tags it may emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (also the tag name)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input
    pub parameters: serde_json::Value,
}

/// Receiving half of a streamed completion. Each item is a text delta.
pub type CompletionStream = mpsc::Receiver<std::result::Result<String, ProviderError>>;

/// The core Provider trait.
///
/// The orchestrator awaits `complete()` (or drains `stream()`) once per
/// iteration without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the transcript and get the complete response text.
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> std::result::Result<String, ProviderError>;

    /// Send the transcript and get a stream of text deltas.
    ///
    /// Default implementation calls `complete()` and yields the result as a
    /// single chunk.
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> std::result::Result<CompletionStream, ProviderError> {
        let text = self.complete(messages, options).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Provider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> std::result::Result<String, ProviderError> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    #[test]
    fn completion_options_defaults() {
        let options = CompletionOptions::default();
        assert!((options.temperature - 0.2).abs() < f32::EPSILON);
        assert!(options.max_tokens.is_none());
    }

    #[tokio::test]
    async fn default_stream_yields_single_chunk() {
        let provider = Echo;
        let mut rx = provider
            .stream(&[Message::user("hello")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().unwrap(), "hello");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "read_file".into(),
            description: "Read a file".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "path": { "type": "string" } },
                "required": ["path"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("read_file"));
        assert!(json.contains("path"));
    }
}

//! DecisionEngine trait: the abstraction over the language model.
//!
//! Given the turn's history and the tool catalog, an engine proposes the
//! next action: either one or more tool invocations, or a final answer.
//! Answers may arrive as a stream of text fragments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::message::{Message, MessageToolCall};

/// Everything the engine needs to propose the next action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// The tool catalog the model may choose from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    /// Used by the model to decide when to invoke the tool
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete (non-streaming) proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Assistant message; non-empty `tool_calls` means "invoke these"
    pub message: Message,

    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}


/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming proposal.
///
/// Text fragments arrive in order; tool invocations are only complete once
/// the stream reports `done`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Receiving half of a streamed proposal.
pub type DecisionStream = mpsc::Receiver<Result<StreamChunk, EngineError>>;

/// The decision procedure consulted by the agent loop.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Propose the next action in one piece.
    async fn decide(&self, request: DecisionRequest) -> Result<Decision, EngineError>;

    /// Propose the next action as an ordered stream of chunks.
    ///
    /// Default implementation calls `decide()` and wraps the result as a
    /// single terminal chunk.
    async fn stream(&self, request: DecisionRequest) -> Result<DecisionStream, EngineError> {
        let decision = self.decide(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let content = Some(decision.message.content).filter(|c| !c.is_empty());
        let _ = tx
            .send(Ok(StreamChunk {
                content,
                tool_calls: decision.message.tool_calls,
                done: true,
                usage: decision.usage,
            }))
            .await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine;

    #[async_trait]
    impl DecisionEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn decide(&self, _request: DecisionRequest) -> Result<Decision, EngineError> {
            Ok(Decision {
                message: Message::assistant("All done."),
                usage: None,
                model: "fixed-1".into(),
            })
        }
    }

    fn request() -> DecisionRequest {
        DecisionRequest {
            model: "fixed-1".into(),
            messages: vec![Message::user("hi")],
            temperature: 0.0,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_decision() {
        let mut rx = FixedEngine.stream(request()).await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.content.as_deref(), Some("All done."));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "divide".into(),
            description: "Divides two numbers.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "a": { "type": "number" }, "b": { "type": "number" } },
                "required": ["a", "b"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("divide"));
        assert!(json.contains("required"));
    }
}

//! Events a turn emits while it runs.
//!
//! The shell consumes these in arrival order: `chunk` text is printed as
//! it comes, tool activity is logged, and `error` is narrated in-line.

use jarvis_core::engine::Usage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// A fragment of the answer text.
    Chunk { content: String },

    /// The loop is about to invoke a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// A tool returned its observation.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The turn finished.
    Done {
        usage: Option<Usage>,
        iterations: usize,
        tool_calls_made: usize,
    },

    /// The decision engine failed; the turn is over.
    Error { message: String },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

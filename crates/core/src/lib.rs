//! # Jarvis Core
//!
//! Domain types, traits, and error definitions for the Jarvis assistant.
//! Everything else in the workspace depends inward on this crate.
//!
//! - [`Tool`] / [`ToolRegistry`]: the fixed catalog of callable operations
//! - [`DecisionEngine`]: the model that chooses tools or answers
//! - [`Session`]: the explicit session context every tool receives
//! - [`TodoStore`]: durable storage for the to-do list

pub mod engine;
pub mod error;
pub mod message;
pub mod session;
pub mod todo;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use engine::{
    Decision, DecisionEngine, DecisionRequest, DecisionStream, StreamChunk, ToolDefinition, Usage,
};
pub use error::{EngineError, Error, PersistenceError, RegistryError, Result, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use session::{Completion, LoadReport, Session, SessionMemory, DEFAULT_ASSISTANT_NAME};
pub use todo::{TodoItem, TodoStore};
pub use tool::{
    FnTool, ParamKind, Tool, ToolArgs, ToolCall, ToolFn, ToolParameter, ToolRegistry, ToolResult,
};

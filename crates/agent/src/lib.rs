//! The agent loop: the part of Jarvis that turns one utterance into an
//! answer.
//!
//! Each turn follows a **decide → act → observe** cycle:
//!
//! 1. Frame the turn with a system prompt and the user's utterance
//! 2. Ask the decision engine what to do, streaming any text it produces
//! 3. If it requests tools: run them through the registry, append the
//!    observations, and go back to step 2
//! 4. If it answers in plain text: the turn is over
//!
//! A configurable bound on engine queries keeps a confused engine from
//! looping forever.

pub mod error;
pub mod loop_runner;
pub mod prompt;
pub mod stream_event;

pub use error::AgentError;
pub use loop_runner::{AgentLoop, AgentTurn, DEFAULT_MAX_ITERATIONS, LoopState, ToolStep};
pub use stream_event::AgentStreamEvent;

use jarvis_core::error::EngineError;
use thiserror::Error;

/// Why a turn ended without an answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

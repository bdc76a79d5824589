//! Decision engine implementations for Jarvis.
//!
//! All engines implement the `jarvis_core::DecisionEngine` trait.
//! `build_from_config` selects one based on configuration.

pub mod openai_compat;
pub mod router;
pub mod sse;

pub use openai_compat::OpenAiCompatEngine;
pub use router::build_from_config;
pub use sse::SseDecoder;

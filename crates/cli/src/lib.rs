//! Jarvis: the interactive terminal front end.
//!
//! The binary wires configuration, the decision engine, the tool registry
//! and the to-do store together, then hands control to
//! [`InteractiveShell`].

pub mod shell;

pub use shell::InteractiveShell;

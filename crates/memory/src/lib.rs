//! To-do store implementations for Jarvis.

pub mod file_backend;
pub mod in_memory;
pub mod noop;

pub use file_backend::FileTodoStore;
pub use in_memory::InMemoryTodoStore;
pub use noop::NoopTodoStore;

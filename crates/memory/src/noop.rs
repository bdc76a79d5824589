//! No-op store: disables to-do persistence entirely.

use jarvis_core::error::PersistenceError;
use jarvis_core::todo::{TodoItem, TodoStore};

/// A store that saves nothing and never has anything to load.
pub struct NoopTodoStore;

impl TodoStore for NoopTodoStore {
    fn name(&self) -> &str {
        "none"
    }

    fn save(&self, _items: &[TodoItem]) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<TodoItem>>, PersistenceError> {
        Ok(None)
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

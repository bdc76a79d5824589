//! In-memory store: useful for testing and ephemeral sessions.

use jarvis_core::error::PersistenceError;
use jarvis_core::todo::{TodoItem, TodoStore};
use std::sync::{PoisonError, RwLock};

/// Keeps the last saved list in process memory.
#[derive(Default)]
pub struct InMemoryTodoStore {
    saved: RwLock<Option<Vec<TodoItem>>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `items`, as if saved by a previous run.
    pub fn with_items(items: Vec<TodoItem>) -> Self {
        Self {
            saved: RwLock::new(Some(items)),
        }
    }

    /// Snapshot of what is currently saved.
    pub fn snapshot(&self) -> Option<Vec<TodoItem>> {
        self.saved.read().map(|s| s.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PersistenceError {
    PersistenceError::Unavailable("in-memory store lock poisoned".into())
}

impl TodoStore for InMemoryTodoStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn save(&self, items: &[TodoItem]) -> Result<(), PersistenceError> {
        *self.saved.write().map_err(poisoned)? = Some(items.to_vec());
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<TodoItem>>, PersistenceError> {
        Ok(self.saved.read().map_err(poisoned)?.clone())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        *self.saved.write().map_err(poisoned)? = None;
        Ok(())
    }
}

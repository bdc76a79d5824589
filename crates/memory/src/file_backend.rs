//! File-backed to-do store: a single pretty-printed JSON array.
//!
//! Storage location defaults to `todo_list.json` in the working directory.
//! The whole list is rewritten on every save; the file is human-readable and
//! compatible with lists saved by earlier versions of the assistant.

use jarvis_core::error::PersistenceError;
use jarvis_core::todo::{TodoItem, TodoStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A to-do store persisted as one JSON file.
pub struct FileTodoStore {
    path: PathBuf,
}

impl FileTodoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &'static str, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            action,
            path: self.path.clone(),
            source,
        }
    }
}

impl TodoStore for FileTodoStore {
    fn name(&self) -> &str {
        "file"
    }

    fn save(&self, items: &[TodoItem]) -> Result<(), PersistenceError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| self.io_error("create directory for", e))?;
        }

        let content = serde_json::to_string_pretty(items).map_err(PersistenceError::Serialize)?;
        std::fs::write(&self.path, content).map_err(|e| self.io_error("write", e))?;

        debug!(path = %self.path.display(), count = items.len(), "To-do file written");
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<TodoItem>>, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", e)),
        };

        let items: Vec<TodoItem> =
            serde_json::from_str(&content).map_err(|source| PersistenceError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(items))
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }
}

//! Session context: the assistant's mutable state for one process lifetime.
//!
//! A single `Session` is created at startup and lent `&mut` to every tool
//! invocation. To-do mutations flush through the attached [`TodoStore`]
//! right away, so disk never lags memory by more than one operation.
//! Persistence failures are logged and reported; memory stays authoritative.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PersistenceError, ToolError};
use crate::todo::{TodoItem, TodoStore, format_minute};

/// Name the assistant answers to until told otherwise.
pub const DEFAULT_ASSISTANT_NAME: &str = "Jarvis";

/// The plain data remembered during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMemory {
    pub assistant_name: String,
    pub todos: Vec<TodoItem>,
    pub preferences: HashMap<String, String>,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self {
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            todos: Vec::new(),
            preferences: HashMap::new(),
        }
    }
}

/// Result of marking an item done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Completed(TodoItem),
    AlreadyCompleted(TodoItem),
}

/// Outcome of reading the store back into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    Loaded(usize),
    NothingSaved,
    Failed(String),
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(n) => write!(f, "Loaded {n} items from your saved to-do list."),
            Self::NothingSaved => write!(f, "No saved to-do list found."),
            Self::Failed(reason) => write!(f, "Error loading to-do list: {reason}"),
        }
    }
}

/// Explicit session context handed to tools.
pub struct Session {
    memory: SessionMemory,
    store: Arc<dyn TodoStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self {
            memory: SessionMemory::default(),
            store,
        }
    }

    /// Override the default assistant name (from configuration).
    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.memory.assistant_name = name.into();
        self
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    // ── Identity ─────────────────────────────────────────────────────────

    pub fn assistant_name(&self) -> &str {
        &self.memory.assistant_name
    }

    pub fn set_assistant_name(&mut self, name: &str) -> Result<(), ToolError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ToolError::rejected("The assistant name cannot be empty."));
        }
        self.memory.assistant_name = name.to_string();
        Ok(())
    }

    // ── To-do list ───────────────────────────────────────────────────────

    pub fn todos(&self) -> &[TodoItem] {
        &self.memory.todos
    }

    /// Append a new open item and persist.
    pub fn add_todo(&mut self, task: &str) -> Result<&TodoItem, ToolError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ToolError::rejected("The task description cannot be empty."));
        }
        self.memory.todos.push(TodoItem::new(task));
        self.persist();
        let len = self.memory.todos.len();
        Ok(&self.memory.todos[len - 1])
    }

    /// Render the list with 1-based positions and a completion glyph.
    pub fn render_todos(&self) -> String {
        if self.memory.todos.is_empty() {
            return "Your to-do list is empty!".to_string();
        }
        let mut out = String::from("Your To-Do List:\n");
        for (i, item) in self.memory.todos.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} {} (added: {})\n",
                i + 1,
                item.glyph(),
                item.task,
                format_minute(&item.added)
            ));
        }
        out
    }

    pub fn complete_todo(&mut self, index: i64) -> Result<Completion, ToolError> {
        let pos = self.position(index)?;
        let item = &mut self.memory.todos[pos];
        if !item.complete() {
            return Ok(Completion::AlreadyCompleted(item.clone()));
        }
        let snapshot = item.clone();
        self.persist();
        Ok(Completion::Completed(snapshot))
    }

    pub fn delete_todo(&mut self, index: i64) -> Result<TodoItem, ToolError> {
        let pos = self.position(index)?;
        let removed = self.memory.todos.remove(pos);
        self.persist();
        Ok(removed)
    }

    /// Empty the list and drop the persisted copy. Returns how many items
    /// were removed.
    ///
    /// If the saved copy cannot be removed an empty list is written over it
    /// instead. The error is returned only when neither works, in which case
    /// the stale copy would come back on the next load. Memory is cleared
    /// either way.
    pub fn clear_todos(&mut self) -> Result<usize, PersistenceError> {
        let count = self.memory.todos.len();
        self.memory.todos.clear();
        if let Err(e) = self.store.remove() {
            warn!(store = self.store.name(), error = %e, "Failed to remove saved to-do list");
            if let Err(save_err) = self.save_todos() {
                warn!(store = self.store.name(), error = %save_err, "Failed to overwrite saved to-do list");
                return Err(e);
            }
        }
        Ok(count)
    }

    /// Write the current list to the store.
    pub fn save_todos(&self) -> Result<(), PersistenceError> {
        self.store.save(&self.memory.todos)?;
        debug!(store = self.store.name(), count = self.memory.todos.len(), "To-do list saved");
        Ok(())
    }

    /// Replace the in-memory list with whatever the store holds.
    pub fn load_todos(&mut self) -> LoadReport {
        match self.store.load() {
            Ok(Some(items)) => {
                let count = items.len();
                self.memory.todos = items;
                debug!(store = self.store.name(), count, "To-do list loaded");
                LoadReport::Loaded(count)
            }
            Ok(None) => LoadReport::NothingSaved,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "Failed to load to-do list");
                LoadReport::Failed(e.to_string())
            }
        }
    }

    /// Translate a user-facing 1-based index, rejecting anything out of range.
    fn position(&self, index: i64) -> Result<usize, ToolError> {
        let len = self.memory.todos.len();
        if index < 1 || index as u64 > len as u64 {
            return Err(ToolError::IndexOutOfRange { index, len });
        }
        Ok((index - 1) as usize)
    }

    fn persist(&self) {
        if let Err(e) = self.save_todos() {
            warn!(store = self.store.name(), error = %e, "Error saving to-do list");
        }
    }

    // ── Preferences ──────────────────────────────────────────────────────

    pub fn set_preference(&mut self, key: &str, value: &str) {
        self.memory
            .preferences
            .insert(key.trim().to_string(), value.to_string());
    }

    pub fn preference(&self, key: &str) -> Option<&str> {
        self.memory.preferences.get(key.trim()).map(String::as_str)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("memory", &self.memory)
            .field("store", &self.store.name())
            .finish()
    }
}

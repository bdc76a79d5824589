//! Memory and personalization tools: the assistant's name, the to-do list,
//! and user preferences. All state lives in the [`Session`].

use jarvis_core::error::{RegistryError, ToolError};
use jarvis_core::session::{Completion, Session};
use jarvis_core::todo::format_minute;
use jarvis_core::tool::{FnTool, ToolArgs, ToolParameter, ToolRegistry};

fn item_number() -> Vec<ToolParameter> {
    vec![ToolParameter::integer(
        "item_number",
        "1-based position in the to-do list",
    )]
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    let tools = [
        FnTool::new(
            "remember_name",
            "Remembers the assistant's name for this session.",
            vec![ToolParameter::string("name", "The new name")],
            remember_name,
        ),
        FnTool::new(
            "get_remembered_name",
            "Retrieves the name the user wants to call the assistant.",
            vec![],
            get_remembered_name,
        ),
        FnTool::new(
            "add_todo_item",
            "Adds an item to the to-do list.",
            vec![ToolParameter::string("task", "What needs doing")],
            add_todo_item,
        ),
        FnTool::new(
            "show_todo_list",
            "Shows all items in the to-do list.",
            vec![],
            show_todo_list,
        ),
        FnTool::new(
            "complete_todo_item",
            "Marks a to-do item as completed.",
            item_number(),
            complete_todo_item,
        ),
        FnTool::new(
            "delete_todo_item",
            "Deletes an item from the to-do list.",
            item_number(),
            delete_todo_item,
        ),
        FnTool::new(
            "clear_todo_list",
            "Clears all items from the to-do list.",
            vec![],
            clear_todo_list,
        ),
        FnTool::new(
            "save_todo_list_tool",
            "Saves the to-do list to a file (manually triggered).",
            vec![],
            save_todo_list,
        ),
        FnTool::new(
            "load_todo_list_tool",
            "Loads the to-do list from a file (manually triggered).",
            vec![],
            load_todo_list,
        ),
        FnTool::new(
            "remember_preference",
            "Remembers a user preference for this session.",
            vec![
                ToolParameter::string("key", "What the preference is about"),
                ToolParameter::string("value", "The preferred value"),
            ],
            remember_preference,
        ),
        FnTool::new(
            "get_preference",
            "Retrieves a remembered user preference.",
            vec![ToolParameter::string("key", "What the preference is about")],
            get_preference,
        ),
    ];
    for tool in tools {
        registry.register(Box::new(tool))?;
    }
    Ok(())
}

fn remember_name(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    session.set_assistant_name(args.string("name")?)?;
    Ok(format!(
        "I'll remember that my name is {} for this session.",
        session.assistant_name()
    ))
}

fn get_remembered_name(session: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(format!(
        "You asked me to remember that my name is {}.",
        session.assistant_name()
    ))
}

fn add_todo_item(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let task = session.add_todo(args.string("task")?)?.task.clone();
    Ok(format!(
        "Added '{task}' to your to-do list. You now have {} items.",
        session.todos().len()
    ))
}

fn show_todo_list(session: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(session.render_todos())
}

fn complete_todo_item(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    match session.complete_todo(args.integer("item_number")?)? {
        Completion::Completed(item) => Ok(format!(
            "Marked '{}' as completed at {}.",
            item.task,
            item.completed_at.as_ref().map(format_minute).unwrap_or_default()
        )),
        Completion::AlreadyCompleted(item) => Ok(format!(
            "'{}' was already completed at {}.",
            item.task,
            item.completed_at.as_ref().map(format_minute).unwrap_or_default()
        )),
    }
}

fn delete_todo_item(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let removed = session.delete_todo(args.integer("item_number")?)?;
    Ok(format!("Removed '{}' from your to-do list.", removed.task))
}

fn clear_todo_list(session: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    session
        .clear_todos()
        .map(|count| format!("Cleared all {count} items from your to-do list."))
        .map_err(|e| {
            ToolError::rejected(format!(
                "Cleared your to-do list, but the saved copy could not be removed: {e}"
            ))
        })
}

fn save_todo_list(session: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    session
        .save_todos()
        .map(|()| "To-do list saved to file.".to_string())
        .map_err(|e| ToolError::rejected(format!("Error saving to-do list: {e}")))
}

fn load_todo_list(session: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(session.load_todos().to_string())
}

fn remember_preference(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let (key, value) = (args.string("key")?, args.string("value")?);
    session.set_preference(key, value);
    Ok(format!("I'll remember that you prefer {key} = {value}."))
}

fn get_preference(session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let key = args.string("key")?;
    Ok(match session.preference(key) {
        Some(value) => format!("You prefer {key} = {value}."),
        None => format!("I don't remember any preference for {key}."),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::tool::ToolCall;
    use jarvis_memory::{FileTodoStore, InMemoryTodoStore};
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        registry: ToolRegistry,
        session: Session,
    }

    impl Harness {
        fn new(session: Session) -> Self {
            let mut registry = ToolRegistry::new();
            register(&mut registry).unwrap();
            Self { registry, session }
        }

        async fn call(&mut self, name: &str, args: serde_json::Value) -> (bool, String) {
            let call = ToolCall {
                id: "t".into(),
                name: name.into(),
                arguments: args,
            };
            let r = self.registry.execute(&call, &mut self.session).await;
            (r.success, r.output)
        }
    }

    #[tokio::test]
    async fn name_roundtrip() {
        let mut h = Harness::new(Session::new(Arc::new(InMemoryTodoStore::new())));
        let (_, out) = h.call("get_remembered_name", json!({})).await;
        assert_eq!(out, "You asked me to remember that my name is Jarvis.");
        h.call("remember_name", json!({"name": "Friday"})).await;
        assert_eq!(h.session.assistant_name(), "Friday");
    }

    #[tokio::test]
    async fn buy_milk() {
        let mut h = Harness::new(Session::new(Arc::new(InMemoryTodoStore::new())));
        let (ok, out) = h.call("add_todo_item", json!({"task": "buy milk"})).await;
        assert!(ok);
        assert_eq!(out, "Added 'buy milk' to your to-do list. You now have 1 items.");

        let (_, list) = h.call("show_todo_list", json!({})).await;
        assert!(list.contains("1. ☐ buy milk (added: "));
    }

    #[tokio::test]
    async fn complete_then_delete() {
        let mut h = Harness::new(Session::new(Arc::new(InMemoryTodoStore::new())));
        h.call("add_todo_item", json!({"task": "first"})).await;
        h.call("add_todo_item", json!({"task": "second"})).await;

        let (ok, out) = h.call("complete_todo_item", json!({"item_number": 2})).await;
        assert!(ok);
        assert!(out.starts_with("Marked 'second' as completed at "));

        let (_, again) = h.call("complete_todo_item", json!({"item_number": 2})).await;
        assert!(again.contains("already completed"));

        let (_, out) = h.call("delete_todo_item", json!({"item_number": 1})).await;
        assert_eq!(out, "Removed 'first' from your to-do list.");
        let (_, list) = h.call("show_todo_list", json!({})).await;
        assert!(list.contains("1. ✓ second"));
    }

    #[tokio::test]
    async fn out_of_range_is_error_observation() {
        let mut h = Harness::new(Session::new(Arc::new(InMemoryTodoStore::new())));
        h.call("add_todo_item", json!({"task": "only"})).await;
        let (ok, out) = h.call("delete_todo_item", json!({"item_number": 5})).await;
        assert!(!ok);
        assert_eq!(out, "Error: Invalid item number. Please choose between 1 and 1.");
        assert_eq!(h.session.todos().len(), 1);
    }

    #[tokio::test]
    async fn manual_save_clear_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo_list.json");
        let mut h = Harness::new(Session::new(Arc::new(FileTodoStore::new(&path))));

        h.call("add_todo_item", json!({"task": "a"})).await;
        let (_, out) = h.call("save_todo_list_tool", json!({})).await;
        assert_eq!(out, "To-do list saved to file.");
        assert!(path.exists());

        let (_, out) = h.call("clear_todo_list", json!({})).await;
        assert_eq!(out, "Cleared all 1 items from your to-do list.");
        assert!(!path.exists());

        let (_, out) = h.call("load_todo_list_tool", json!({})).await;
        assert_eq!(out, "No saved to-do list found.");
    }

    #[tokio::test]
    async fn clear_reports_saved_copy_that_cannot_be_removed() {
        // A directory where the file should be: neither removable nor writable as a file.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo_list.json");
        std::fs::create_dir(&path).unwrap();
        let mut h = Harness::new(Session::new(Arc::new(FileTodoStore::new(&path))));
        h.call("add_todo_item", json!({"task": "a"})).await;

        let (ok, out) = h.call("clear_todo_list", json!({})).await;
        assert!(!ok);
        assert!(out.contains("the saved copy could not be removed"));
        assert!(h.session.todos().is_empty());
    }

    #[tokio::test]
    async fn preferences() {
        let mut h = Harness::new(Session::new(Arc::new(InMemoryTodoStore::new())));
        let (_, out) = h.call("get_preference", json!({"key": "color"})).await;
        assert_eq!(out, "I don't remember any preference for color.");
        let (_, out) = h
            .call("remember_preference", json!({"key": "color", "value": "blue"}))
            .await;
        assert_eq!(out, "I'll remember that you prefer color = blue.");
        let (_, out) = h.call("get_preference", json!({"key": "color"})).await;
        assert_eq!(out, "You prefer color = blue.");
    }
}

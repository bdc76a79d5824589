//! Built-in tool implementations for Jarvis.
//!
//! Tools give the assistant the ability to do math, work with files,
//! inspect the host, run commands, keep a to-do list, and lighten the mood.

pub mod files;
pub mod fun;
pub mod math;
pub mod memory;
pub mod notes;
pub mod shell;
pub mod system;
pub mod timer;

use jarvis_config::AppConfig;
use jarvis_core::error::RegistryError;
use jarvis_core::tool::ToolRegistry;
use std::time::Duration;

pub use notes::NotesTool;
pub use shell::ShellTool;
pub use timer::CountdownTool;

/// Create the registry with every built-in tool, registered once.
///
/// Catalog order: math, general, files, system, process, memory, fun.
pub fn default_registry(config: &AppConfig) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    math::register(&mut registry)?;
    files::register(&mut registry)?;
    system::register(&mut registry)?;

    registry.register(Box::new(
        ShellTool::new(config.tools.allowed_commands.clone())
            .with_timeout(Duration::from_secs(config.tools.shell_timeout_secs)),
    ))?;
    registry.register(Box::new(CountdownTool::new(config.tools.max_countdown_secs)))?;
    registry.register(Box::new(NotesTool::new(&config.storage.notes_dir)))?;

    memory::register(&mut registry)?;
    fun::register(&mut registry)?;

    tracing::debug!(count = registry.len(), "Tool registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_registry_has_full_catalog() {
        let registry = default_registry(&AppConfig::default()).unwrap();
        let names = registry.names();
        assert_eq!(names.len(), 42);

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());

        for expected in [
            "add",
            "divide",
            "calculate_grade",
            "list_files",
            "organize_files_by_extension",
            "get_system_info",
            "run_shell_command",
            "countdown_timer",
            "create_notes_file",
            "add_todo_item",
            "load_todo_list_tool",
            "get_preference",
            "roll_dice",
        ] {
            assert!(registry.get(expected).is_some(), "missing {expected}");
        }
        assert!(registry.get("Add").is_none());
        assert_eq!(names[0], "add");
    }

    #[test]
    fn definitions_are_object_schemas() {
        let registry = default_registry(&AppConfig::default()).unwrap();
        for def in registry.definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(!def.description.is_empty(), "{}", def.name);
        }
    }

    #[test]
    fn catalog_uses_every_parameter_kind() {
        let registry = default_registry(&AppConfig::default()).unwrap();
        let kinds: HashSet<String> = registry
            .definitions()
            .iter()
            .filter_map(|def| def.parameters["properties"].as_object().cloned())
            .flat_map(|props| props.into_iter().map(|(_, p)| p["type"].to_string()))
            .collect();
        let expected: HashSet<String> = ["\"number\"", "\"integer\"", "\"string\"", "\"array\""]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn registering_twice_is_rejected() {
        let mut registry = default_registry(&AppConfig::default()).unwrap();
        let err = fun::register(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(ref n) if n == "tell_joke"));
    }
}

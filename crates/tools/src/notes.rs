//! Notes tool: writes text files into a dedicated notes directory.

use async_trait::async_trait;
use jarvis_core::error::ToolError;
use jarvis_core::session::Session;
use jarvis_core::tool::{Tool, ToolArgs, ToolParameter};
use std::path::PathBuf;
use tracing::debug;

pub struct NotesTool {
    dir: PathBuf,
}

impl NotesTool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A bare file name: no separators, no parent references.
    fn validate_filename(filename: &str) -> Result<(), ToolError> {
        let name = filename.trim();
        if name.is_empty() {
            return Err(ToolError::InvalidArguments("filename must not be empty".into()));
        }
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ToolError::rejected(format!(
                "Invalid notes filename '{filename}': it must not contain path separators or '..'."
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Tool for NotesTool {
    fn name(&self) -> &str {
        "create_notes_file"
    }

    fn description(&self) -> &str {
        "Creates a notes file with the given content in the notes directory."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::string("filename", "Name of the notes file, e.g. groceries.txt"),
            ToolParameter::string("content", "Text of the note"),
        ]
    }

    async fn execute(&self, _session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
        let filename = args.string("filename")?;
        let content = args.string("content")?;
        Self::validate_filename(filename)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ToolError::io("Error creating notes directory", &self.dir, e))?;

        let path = self.dir.join(filename.trim());
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::io("Error creating notes file", &path, e))?;

        debug!(path = %path.display(), "Notes file written");
        Ok(format!("Notes file created successfully at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_memory::NoopTodoStore;
    use std::sync::Arc;

    fn args(filename: &str, content: &str) -> ToolArgs {
        ToolArgs::from_json(serde_json::json!({ "filename": filename, "content": content }))
    }

    #[tokio::test]
    async fn creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes");
        let tool = NotesTool::new(&notes);
        let mut session = Session::new(Arc::new(NoopTodoStore));

        let out = tool.execute(&mut session, args("shopping.txt", "eggs")).await.unwrap();
        assert!(out.starts_with("Notes file created successfully at"));
        assert_eq!(std::fs::read_to_string(notes.join("shopping.txt")).unwrap(), "eggs");
    }

    #[tokio::test]
    async fn rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let tool = NotesTool::new(dir.path().join("notes"));
        let mut session = Session::new(Arc::new(NoopTodoStore));
        for bad in ["../evil.txt", "a/b.txt", "a\\b.txt", ".."] {
            assert!(tool.execute(&mut session, args(bad, "x")).await.is_err(), "{bad}");
        }
        assert!(!dir.path().join("notes").exists());
    }
}

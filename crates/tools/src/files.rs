//! File system automation tools.
//!
//! Paths are taken as given (relative to the working directory). Failures
//! carry the offending path and the OS error so the model can relay them.
//! All file access goes through `tokio::fs`.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use jarvis_core::error::{RegistryError, ToolError};
use jarvis_core::session::Session;
use jarvis_core::tool::{Tool, ToolArgs, ToolParameter, ToolRegistry};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// The file operations exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    List,
    Read,
    Write,
    CreateDirectory,
    Delete,
    Copy,
    Info,
    OrganizeByExtension,
}

impl FileOp {
    pub const ALL: [FileOp; 8] = [
        Self::List,
        Self::Read,
        Self::Write,
        Self::CreateDirectory,
        Self::Delete,
        Self::Copy,
        Self::Info,
        Self::OrganizeByExtension,
    ];
}

/// One file tool; the operation decides its name, parameters and body.
pub struct FileTool {
    op: FileOp,
}

impl FileTool {
    pub fn new(op: FileOp) -> Self {
        Self { op }
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    for op in FileOp::ALL {
        registry.register(Box::new(FileTool::new(op)))?;
    }
    Ok(())
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        match self.op {
            FileOp::List => "list_files",
            FileOp::Read => "read_file_content",
            FileOp::Write => "write_file_content",
            FileOp::CreateDirectory => "create_directory",
            FileOp::Delete => "delete_file_or_directory",
            FileOp::Copy => "copy_file_or_directory",
            FileOp::Info => "get_file_info",
            FileOp::OrganizeByExtension => "organize_files_by_extension",
        }
    }

    fn description(&self) -> &str {
        match self.op {
            FileOp::List => "Lists all files and directories in a given directory.",
            FileOp::Read => "Reads the content of a file.",
            FileOp::Write => "Writes content to a file, replacing anything already there.",
            FileOp::CreateDirectory => {
                "Creates a new directory (and any missing parents) at the specified path."
            }
            FileOp::Delete => "Deletes a file or directory at the specified path.",
            FileOp::Copy => "Copies a file or directory from source to destination.",
            FileOp::Info => "Gets information about a file (size, creation time, modification time).",
            FileOp::OrganizeByExtension => {
                "Organizes files in a directory into folders based on their extensions."
            }
        }
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        match self.op {
            FileOp::List => {
                vec![ToolParameter::string("directory", "Directory to list").with_default(".")]
            }
            FileOp::Read => vec![ToolParameter::string("filepath", "Path of the file to read")],
            FileOp::Write => vec![
                ToolParameter::string("filepath", "Path of the file to write"),
                ToolParameter::string("content", "Text to write"),
            ],
            FileOp::CreateDirectory => {
                vec![ToolParameter::string("directory_path", "Directory to create")]
            }
            FileOp::Delete => vec![ToolParameter::string("path", "File or directory to delete")],
            FileOp::Copy => vec![
                ToolParameter::string("source", "Path to copy from"),
                ToolParameter::string("destination", "Path to copy to"),
            ],
            FileOp::Info => vec![ToolParameter::string("filepath", "Path to inspect")],
            FileOp::OrganizeByExtension => {
                vec![ToolParameter::string("directory", "Directory to organize").with_default(".")]
            }
        }
    }

    async fn execute(&self, _session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
        match self.op {
            FileOp::List => list_files(args.string("directory")?).await,
            FileOp::Read => {
                let path = args.string("filepath")?;
                fs::read_to_string(path)
                    .await
                    .map_err(|e| ToolError::io("Failed to read file", path, e))
            }
            FileOp::Write => write_file(args.string("filepath")?, args.string("content")?).await,
            FileOp::CreateDirectory => {
                let path = args.string("directory_path")?;
                fs::create_dir_all(path)
                    .await
                    .map_err(|e| ToolError::io("Error creating directory", path, e))?;
                Ok(format!("Directory created successfully at {path}"))
            }
            FileOp::Delete => delete_path(args.string("path")?).await,
            FileOp::Copy => copy_path(args.string("source")?, args.string("destination")?).await,
            FileOp::Info => file_info(args.string("filepath")?).await,
            FileOp::OrganizeByExtension => organize_by_extension(args.string("directory")?).await,
        }
    }
}

/// Metadata, or `None` when nothing exists at `path`.
async fn metadata(path: impl AsRef<Path>) -> Option<Metadata> {
    fs::metadata(path).await.ok()
}

async fn list_files(dir: &str) -> Result<String, ToolError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ToolError::io("Failed to list directory", dir, e))?;
    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ToolError::io("Failed to list directory", dir, e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    if names.is_empty() {
        return Ok(format!("The directory {dir} is empty."));
    }
    names.sort();
    Ok(names.join("\n"))
}

async fn write_file(path: &str, content: &str) -> Result<String, ToolError> {
    fs::write(path, content)
        .await
        .map_err(|e| ToolError::io("Failed to write file", path, e))?;
    debug!(path, bytes = content.len(), "File written");
    Ok(format!("Successfully wrote to {path}"))
}

async fn delete_path(path: &str) -> Result<String, ToolError> {
    match metadata(path).await {
        Some(meta) if meta.is_file() => {
            fs::remove_file(path)
                .await
                .map_err(|e| ToolError::io("Error deleting file", path, e))?;
            Ok(format!("File deleted: {path}"))
        }
        Some(meta) if meta.is_dir() => {
            fs::remove_dir_all(path)
                .await
                .map_err(|e| ToolError::io("Error deleting directory", path, e))?;
            Ok(format!("Directory deleted: {path}"))
        }
        _ => Err(ToolError::rejected(format!("Path not found: {path}"))),
    }
}

async fn copy_path(source: &str, destination: &str) -> Result<String, ToolError> {
    match metadata(source).await {
        Some(meta) if meta.is_file() => {
            fs::copy(source, destination)
                .await
                .map_err(|e| ToolError::io("Error copying file", source, e))?;
            Ok(format!("File copied from {source} to {destination}"))
        }
        Some(meta) if meta.is_dir() => {
            if metadata(destination).await.is_some() {
                return Err(ToolError::rejected(format!(
                    "Destination already exists: {destination}"
                )));
            }
            copy_dir(Path::new(source), Path::new(destination)).await?;
            Ok(format!("Directory copied from {source} to {destination}"))
        }
        _ => Err(ToolError::rejected(format!("Source not found: {source}"))),
    }
}

/// Copy a directory tree, walking it with an explicit stack.
async fn copy_dir(src: &Path, dst: &Path) -> Result<(), ToolError> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from_dir, to_dir)) = pending.pop() {
        fs::create_dir_all(&to_dir)
            .await
            .map_err(|e| ToolError::io("Error creating directory", &to_dir, e))?;
        let mut entries = fs::read_dir(&from_dir)
            .await
            .map_err(|e| ToolError::io("Error reading directory", &from_dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ToolError::io("Error reading directory", &from_dir, e))?
        {
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| ToolError::io("Error reading directory", &from, e))?
                .is_dir();
            if is_dir {
                pending.push((from, to));
            } else {
                fs::copy(&from, &to)
                    .await
                    .map_err(|e| ToolError::io("Error copying file", &from, e))?;
            }
        }
    }
    Ok(())
}

fn format_time(time: std::io::Result<std::time::SystemTime>) -> String {
    match time {
        Ok(t) => DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => "unavailable".to_string(),
    }
}

async fn file_info(path: &str) -> Result<String, ToolError> {
    let meta = match fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::rejected(format!("File not found: {path}")));
        }
        Err(e) => return Err(ToolError::io("Error getting file info", path, e)),
    };
    Ok(format!(
        "File: {path}\nSize: {} bytes\nCreated: {}\nModified: {}",
        meta.len(),
        format_time(meta.created()),
        format_time(meta.modified()),
    ))
}

/// Folder name a file is sorted into: its extension, or `no_extension`.
fn extension_folder(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "no_extension".to_string())
}

async fn organize_by_extension(dir: &str) -> Result<String, ToolError> {
    let root = Path::new(dir);
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| ToolError::io("Error organizing files in", dir, e))?;

    // Collect first so the folders created below are not picked up.
    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(entry);
        }
    }

    for entry in &files {
        let name = entry.file_name().to_string_lossy().into_owned();
        let folder = root.join(extension_folder(&name));
        fs::create_dir_all(&folder)
            .await
            .map_err(|e| ToolError::io("Error creating directory", &folder, e))?;
        fs::rename(entry.path(), folder.join(&name))
            .await
            .map_err(|e| ToolError::io("Error moving file", entry.path(), e))?;
    }

    Ok(format!("Organized {} files by extension in {dir}", files.len()))
}

//! Workspace trait: the file-content surface tools read and mutate.
//!
//! A workspace may be a real directory tree or an in-memory path → content
//! map shipped by a remote caller. Tools only see this trait, so they never
//! assume which one they are talking to. Paths are always workspace-relative
//! with `/` separators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WorkspaceError;

/// Kind of a workspace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Final path component
    pub name: String,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Workspace-relative path
    pub path: String,
}

/// Captured output of a shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[async_trait]
pub trait Workspace: Send + Sync {
    /// Short name for logs (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Read a whole file as UTF-8 text.
    async fn read(&self, path: &str) -> Result<String, WorkspaceError>;

    /// Create or fully overwrite a file, creating parent directories.
    async fn write(&self, path: &str, content: &str) -> Result<(), WorkspaceError>;

    /// What is at `path`, if anything.
    async fn stat(&self, path: &str) -> Result<Option<EntryKind>, WorkspaceError>;

    /// List a directory, optionally recursively. Entries are sorted by path.
    ///
    /// A recursive listing does not descend into directories named in
    /// `skip_dirs`; the directory itself is still listed.
    async fn list(
        &self,
        path: &str,
        recursive: bool,
        skip_dirs: &[String],
    ) -> Result<Vec<DirEntry>, WorkspaceError>;

    /// All files under `path` (or `path` itself when it is a file), as
    /// workspace-relative paths in sorted order. Directories named in
    /// `skip_dirs` are not entered.
    async fn files_under(
        &self,
        path: &str,
        skip_dirs: &[String],
    ) -> Result<Vec<String>, WorkspaceError>;

    /// Run a shell command with the workspace root as working directory.
    ///
    /// Workspaces without a backing directory cannot run commands.
    async fn run_command(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, WorkspaceError> {
        let _ = (command, timeout);
        Err(WorkspaceError::Unsupported(format!(
            "workspace '{}' cannot run shell commands",
            self.name()
        )))
    }
}

/// Normalize a caller-supplied path to the canonical workspace-relative form:
/// `/` separators, no leading `./` or `/`, no empty or `.` segments.
///
/// Returns `None` when a `..` segment would climb above the root.
pub fn normalize_path(path: &str) -> Option<String> {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize_path("./src//main.rs").as_deref(), Some("src/main.rs"));
        assert_eq!(normalize_path("/src/lib.rs").as_deref(), Some("src/lib.rs"));
        assert_eq!(normalize_path("src\\lib.rs").as_deref(), Some("src/lib.rs"));
        assert_eq!(normalize_path(".").as_deref(), Some(""));
    }

    #[test]
    fn normalize_resolves_inner_parent_segments() {
        assert_eq!(normalize_path("src/../README.md").as_deref(), Some("README.md"));
    }

    #[test]
    fn normalize_rejects_escape() {
        assert_eq!(normalize_path("../etc/passwd"), None);
        assert_eq!(normalize_path("src/../../x"), None);
    }

    #[test]
    fn dir_entry_serializes_type_field() {
        let entry = DirEntry {
            name: "src".into(),
            kind: EntryKind::Directory,
            path: "src".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"directory\""));
    }
}

//! Local workspace: a directory tree on disk.
//!
//! Every path is resolved relative to the root and must stay inside it, both
//! lexically and after following symlinks. Writes land in a temp file next to
//! the target and are renamed into place, so a reader never sees a half-written
//! file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use steward_core::error::WorkspaceError;
use steward_core::workspace::{CommandOutput, DirEntry, EntryKind, Workspace, normalize_path};
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    /// Open a workspace rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| match e.kind() {
            ErrorKind::NotFound => WorkspaceError::NotFound(root.display().to_string()),
            _ => io_error(&root.display().to_string(), e),
        })?;
        if !canonical.is_dir() {
            return Err(WorkspaceError::NotADirectory(root.display().to_string()));
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a caller path to (workspace-relative form, absolute path).
    fn resolve(&self, path: &str) -> Result<(String, PathBuf), WorkspaceError> {
        let outside = || WorkspaceError::OutsideWorkspace(path.into());

        let candidate = Path::new(path);
        let relative = if candidate.is_absolute() {
            let stripped = candidate.strip_prefix(&self.root).map_err(|_| outside())?;
            stripped.to_string_lossy().into_owned()
        } else {
            path.to_string()
        };

        let rel = normalize_path(&relative).ok_or_else(outside)?;
        let full = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&rel)
        };

        self.ensure_contained(&full, path)?;
        Ok((rel, full))
    }

    /// Follow symlinks on the deepest existing ancestor and make sure the
    /// result is still under the root.
    fn ensure_contained(&self, full: &Path, original: &str) -> Result<(), WorkspaceError> {
        let mut probe = full;
        loop {
            if let Ok(canonical) = probe.canonicalize() {
                if canonical.starts_with(&self.root) {
                    return Ok(());
                }
                return Err(WorkspaceError::OutsideWorkspace(original.into()));
            }
            match probe.parent() {
                Some(parent) => probe = parent,
                None => return Ok(()),
            }
        }
    }

    fn relative_of(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn io_error(path: &str, err: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io {
        path: path.into(),
        reason: err.to_string(),
    }
}

fn is_skipped(entry: &walkdir::DirEntry, skip_dirs: &[String]) -> bool {
    entry.file_type().is_dir()
        && skip_dirs
            .iter()
            .any(|d| entry.file_name().to_string_lossy() == d.as_str())
}

async fn kind_at(full: &Path, rel: &str) -> Result<Option<EntryKind>, WorkspaceError> {
    match tokio::fs::metadata(full).await {
        Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
        Ok(_) => Ok(Some(EntryKind::File)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(rel, e)),
    }
}

#[async_trait]
impl Workspace for LocalWorkspace {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self, path: &str) -> Result<String, WorkspaceError> {
        let (rel, full) = self.resolve(path)?;
        match kind_at(&full, &rel).await? {
            None => Err(WorkspaceError::NotFound(rel)),
            Some(EntryKind::Directory) => Err(WorkspaceError::IsDirectory(rel)),
            Some(EntryKind::File) => tokio::fs::read_to_string(&full)
                .await
                .map_err(|e| io_error(&rel, e)),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let (rel, full) = self.resolve(path)?;
        if rel.is_empty() || kind_at(&full, &rel).await? == Some(EntryKind::Directory) {
            return Err(WorkspaceError::IsDirectory(if rel.is_empty() {
                ".".into()
            } else {
                rel
            }));
        }

        let parent = full.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_error(&rel, e))?;

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| io_error(&rel, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&rel, e));
        }

        debug!(path = %rel, bytes = content.len(), "Wrote file");
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Option<EntryKind>, WorkspaceError> {
        let (rel, full) = self.resolve(path)?;
        kind_at(&full, &rel).await
    }

    async fn list(
        &self,
        path: &str,
        recursive: bool,
        skip_dirs: &[String],
    ) -> Result<Vec<DirEntry>, WorkspaceError> {
        let (rel, full) = self.resolve(path)?;
        match kind_at(&full, &rel).await? {
            None => return Err(WorkspaceError::NotFound(rel)),
            Some(EntryKind::File) => return Err(WorkspaceError::NotADirectory(rel)),
            Some(EntryKind::Directory) => {}
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();
        let mut walker = WalkDir::new(&full)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| WorkspaceError::Io {
                path: rel.clone(),
                reason: e.to_string(),
            })?;
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                path: self.relative_of(entry.path()),
            });
            if is_skipped(&entry, skip_dirs) {
                walker.skip_current_dir();
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn files_under(
        &self,
        path: &str,
        skip_dirs: &[String],
    ) -> Result<Vec<String>, WorkspaceError> {
        let (rel, full) = self.resolve(path)?;
        match kind_at(&full, &rel).await? {
            None => return Err(WorkspaceError::NotFound(rel)),
            Some(EntryKind::File) => return Ok(vec![rel]),
            Some(EntryKind::Directory) => {}
        }

        let mut files: Vec<String> = WalkDir::new(&full)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !is_skipped(e, skip_dirs))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| self.relative_of(e.path()))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn run_command(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, WorkspaceError> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(&self.root).kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| io_error(".", e))?,
            Err(_) => {
                return Err(WorkspaceError::Timeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

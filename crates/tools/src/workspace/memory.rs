//! In-memory workspace: a path → content map.
//!
//! Used when a remote caller ships file contents with its request, and in
//! tests. Directories are implied by file paths; there are no empty
//! directories. Shell commands are not supported.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use steward_core::error::WorkspaceError;
use steward_core::workspace::{DirEntry, EntryKind, Workspace, normalize_path};
use tokio::sync::RwLock;

pub struct InMemoryWorkspace {
    files: Arc<RwLock<BTreeMap<String, String>>>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Seed the workspace. Paths that escape the root are dropped.
    pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: AsRef<str>,
        C: Into<String>,
    {
        let map = files
            .into_iter()
            .filter_map(|(path, content)| {
                normalize_path(path.as_ref())
                    .filter(|p| !p.is_empty())
                    .map(|p| (p, content.into()))
            })
            .collect();
        Self {
            files: Arc::new(RwLock::new(map)),
        }
    }

    /// Current contents, for handing back to the caller.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.files.read().await.clone()
    }
}

impl Default for InMemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(path: &str) -> Result<String, WorkspaceError> {
    normalize_path(path).ok_or_else(|| WorkspaceError::OutsideWorkspace(path.into()))
}

fn is_dir(files: &BTreeMap<String, String>, rel: &str) -> bool {
    if rel.is_empty() {
        return true;
    }
    let prefix = format!("{rel}/");
    files.keys().any(|k| k.starts_with(&prefix))
}

fn kind_of(files: &BTreeMap<String, String>, rel: &str) -> Option<EntryKind> {
    if files.contains_key(rel) {
        Some(EntryKind::File)
    } else if is_dir(files, rel) {
        Some(EntryKind::Directory)
    } else {
        None
    }
}

fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Files under the directory `rel`, as (full path, remainder) pairs.
fn children<'a>(
    files: &'a BTreeMap<String, String>,
    rel: &'a str,
) -> impl Iterator<Item = (&'a String, &'a str)> + 'a {
    files.keys().filter_map(move |key| {
        if rel.is_empty() {
            Some((key, key.as_str()))
        } else {
            key.strip_prefix(rel)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| (key, rest))
        }
    })
}

#[async_trait]
impl Workspace for InMemoryWorkspace {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, path: &str) -> Result<String, WorkspaceError> {
        let rel = resolve(path)?;
        let files = self.files.read().await;
        match files.get(&rel) {
            Some(content) => Ok(content.clone()),
            None if is_dir(&files, &rel) => Err(WorkspaceError::IsDirectory(rel)),
            None => Err(WorkspaceError::NotFound(rel)),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let rel = resolve(path)?;
        if rel.is_empty() {
            return Err(WorkspaceError::IsDirectory(".".into()));
        }
        let mut files = self.files.write().await;
        if is_dir(&files, &rel) {
            return Err(WorkspaceError::IsDirectory(rel));
        }
        // Every ancestor must be (or become) a directory
        let mut ancestor = String::new();
        for segment in rel.split('/').take(rel.split('/').count() - 1) {
            ancestor = join(&ancestor, segment);
            if files.contains_key(&ancestor) {
                return Err(WorkspaceError::NotADirectory(ancestor));
            }
        }
        files.insert(rel, content.to_string());
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Option<EntryKind>, WorkspaceError> {
        let rel = resolve(path)?;
        Ok(kind_of(&*self.files.read().await, &rel))
    }

    async fn list(
        &self,
        path: &str,
        recursive: bool,
        skip_dirs: &[String],
    ) -> Result<Vec<DirEntry>, WorkspaceError> {
        let rel = resolve(path)?;
        let files = self.files.read().await;
        match kind_of(&files, &rel) {
            None => return Err(WorkspaceError::NotFound(rel)),
            Some(EntryKind::File) => return Err(WorkspaceError::NotADirectory(rel)),
            Some(EntryKind::Directory) => {}
        }

        let mut entries: BTreeMap<String, EntryKind> = BTreeMap::new();
        for (_, rest) in children(&files, &rel) {
            let segments: Vec<&str> = rest.split('/').collect();
            let mut current = rel.clone();
            for (depth, segment) in segments.iter().enumerate() {
                current = join(&current, segment);
                let is_last = depth + 1 == segments.len();
                let kind = if is_last {
                    EntryKind::File
                } else {
                    EntryKind::Directory
                };
                entries.insert(current.clone(), kind);
                if !recursive || is_last || skip_dirs.iter().any(|d| d == segment) {
                    break;
                }
            }
        }

        Ok(entries
            .into_iter()
            .map(|(path, kind)| DirEntry {
                name: last_segment(&path).to_string(),
                kind,
                path,
            })
            .collect())
    }

    async fn files_under(
        &self,
        path: &str,
        skip_dirs: &[String],
    ) -> Result<Vec<String>, WorkspaceError> {
        let rel = resolve(path)?;
        let files = self.files.read().await;
        match kind_of(&files, &rel) {
            None => Err(WorkspaceError::NotFound(rel)),
            Some(EntryKind::File) => Ok(vec![rel]),
            Some(EntryKind::Directory) => Ok(children(&files, &rel)
                .filter(|(_, rest)| {
                    let mut dirs = rest.split('/').collect::<Vec<_>>();
                    dirs.pop();
                    !dirs.iter().any(|d| skip_dirs.iter().any(|s| s == d))
                })
                .map(|(key, _)| key.clone())
                .collect()),
        }
    }
}

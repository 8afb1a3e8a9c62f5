//! `list_directory`: entries under a directory, optionally recursive.

use serde_json::json;
use steward_core::error::ToolError;
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolInput, ToolName};
use steward_core::workspace::{EntryKind, normalize_path};

use crate::args::{optional_bool, optional_str};
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::ListDirectory.as_str().into(),
        description: "List files and directories. Set recursive to true to walk the whole \
                      tree (dependency and VCS directories are not entered)."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Workspace-relative directory; \".\" for the root" },
                "recursive": { "type": "boolean", "description": "Walk subdirectories" }
            },
            "required": ["path"]
        }),
    }
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let path = optional_str(input, "path")?.unwrap_or(".");
    let recursive = optional_bool(input, "recursive")?.unwrap_or(false);

    match ctx
        .workspace
        .stat(path)
        .await
        .map_err(|e| workspace_error(ToolName::ListDirectory, e))?
    {
        None => return Err(ToolError::PathNotFound(path.into())),
        Some(EntryKind::File) => return Err(ToolError::NotADirectory(path.into())),
        Some(EntryKind::Directory) => {}
    }

    let entries = ctx
        .workspace
        .list(path, recursive, &ctx.settings.ignored_dirs)
        .await
        .map_err(|e| workspace_error(ToolName::ListDirectory, e))?;

    let display = normalize_path(path)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".into());

    if entries.is_empty() {
        return Ok(ToolOutput::new(format!("Directory {display} is empty"))
            .with_metadata("entries", json!([])));
    }

    let text = entries
        .iter()
        .map(|e| match e.kind {
            EntryKind::Directory => format!("[dir]  {}/", e.path),
            EntryKind::File => format!("[file] {}", e.path),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let count = entries.len();
    Ok(ToolOutput::new(text)
        .with_metadata("entry_count", count)
        .with_metadata("entries", serde_json::to_value(&entries).unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorSettings;
    use crate::workspace::InMemoryWorkspace;
    use serde_json::Value;

    fn input(value: Value) -> ToolInput {
        serde_json::from_value(value).unwrap()
    }

    fn workspace() -> InMemoryWorkspace {
        InMemoryWorkspace::from_files([
            ("README.md", "# hi"),
            ("src/main.rs", "fn main() {}"),
            ("src/util/mod.rs", ""),
            ("node_modules/pkg/index.js", ""),
        ])
    }

    #[tokio::test]
    async fn flat_listing() {
        let ws = workspace();
        let settings = ExecutorSettings::default();
        let ctx = ToolContext::new(&ws, &settings, None);
        let out = run(&ctx, &input(json!({"path": "."}))).await.unwrap();
        assert!(out.text.contains("[file] README.md"));
        assert!(out.text.contains("[dir]  src/"));
        assert!(!out.text.contains("main.rs"));
        assert_eq!(out.metadata["entries"][0]["type"], json!("file"));
    }

    #[tokio::test]
    async fn recursive_listing_skips_ignored_dirs() {
        let ws = workspace();
        let settings = ExecutorSettings::default();
        let ctx = ToolContext::new(&ws, &settings, None);
        let out = run(&ctx, &input(json!({"path": ".", "recursive": "true"})))
            .await
            .unwrap();
        assert!(out.text.contains("[file] src/util/mod.rs"));
        assert!(out.text.contains("[dir]  node_modules/"));
        assert!(!out.text.contains("index.js"));
    }

    #[tokio::test]
    async fn missing_and_file_paths() {
        let ws = workspace();
        let settings = ExecutorSettings::default();
        let ctx = ToolContext::new(&ws, &settings, None);
        assert!(matches!(
            run(&ctx, &input(json!({"path": "nope"}))).await,
            Err(ToolError::PathNotFound(_))
        ));
        assert!(matches!(
            run(&ctx, &input(json!({"path": "README.md"}))).await,
            Err(ToolError::NotADirectory(_))
        ));
    }
}

//! `grep_search`: regex search over file contents.

use glob::Pattern;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::json;
use steward_core::error::{ToolError, WorkspaceError};
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolInput, ToolName};
use tracing::debug;

use crate::args::{optional_str, optional_string_list, optional_usize, required_str};
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::GrepSearch.as_str().into(),
        description: "Search file contents with a regular expression. Returns matching lines \
                      as path:line: content."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Regular expression" },
                "path": { "type": "string", "description": "Directory or file to search; defaults to \".\"" },
                "include": {
                    "type": "array", "items": { "type": "string" },
                    "description": "Only search files matching these globs (e.g. *.rs)"
                },
                "exclude": {
                    "type": "array", "items": { "type": "string" },
                    "description": "Skip files matching these globs"
                },
                "max_results": { "type": "integer", "description": "Maximum matches to return" }
            },
            "required": ["pattern", "path"]
        }),
    }
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrepMatch {
    pub path: String,
    pub line: usize,
    pub content: String,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ToolError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| ToolError::InvalidArguments(format!("invalid glob '{p}': {e}")))
        })
        .collect()
}

fn glob_matches(patterns: &[Pattern], path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    patterns
        .iter()
        .any(|p| p.matches(path) || p.matches(file_name))
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let pattern = required_str(input, "pattern")?;
    let path = optional_str(input, "path")?.unwrap_or(".");
    let include = compile_globs(&optional_string_list(input, "include")?)?;
    let exclude = compile_globs(&optional_string_list(input, "exclude")?)?;
    let max_results = optional_usize(input, "max_results")?
        .unwrap_or(ctx.settings.grep_max_results)
        .max(1);

    let regex = Regex::new(pattern).map_err(|e| ToolError::InvalidRegex(format!("{pattern}: {e}")))?;

    let files = ctx
        .workspace
        .files_under(path, &ctx.settings.ignored_dirs)
        .await
        .map_err(|e| match e {
            WorkspaceError::NotFound(_) => ToolError::PathNotFound(path.into()),
            other => workspace_error(ToolName::GrepSearch, other),
        })?;

    let mut matches: Vec<GrepMatch> = Vec::new();
    let mut truncated = false;
    let mut files_searched = 0usize;

    'files: for file in files {
        if !include.is_empty() && !glob_matches(&include, &file) {
            continue;
        }
        if glob_matches(&exclude, &file) {
            continue;
        }

        let content = match ctx.workspace.read(&file).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %file, error = %e, "Skipping unreadable file");
                continue;
            }
        };
        files_searched += 1;

        for (idx, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                if matches.len() == max_results {
                    truncated = true;
                    break 'files;
                }
                matches.push(GrepMatch {
                    path: file.clone(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
        }
    }

    let mut text = if matches.is_empty() {
        "No matches found".to_string()
    } else {
        matches
            .iter()
            .map(|m| format!("{}:{}: {}", m.path, m.line, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    };
    if truncated {
        text.push_str(&format!("\n[results capped at {max_results} matches]"));
    }

    Ok(ToolOutput::new(text)
        .with_metadata("match_count", matches.len())
        .with_metadata("files_searched", files_searched)
        .with_metadata("truncated", truncated))
}

//! `edit_file`: ordered search/replace edits on one file.
//!
//! Edits apply one after another, each against the result of the previous
//! one. Every `old_string` must match exactly once; an ambiguous match is
//! rejected rather than guessed. When an edit fails, the edits before it are
//! saved and the rest are dropped.

use serde_json::{Value, json};
use steward_core::approval::ApprovalKind;
use steward_core::error::{ToolError, WorkspaceError};
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ChangeKind, FileChange, ToolInput, ToolName};
use steward_core::workspace::normalize_path;

use crate::args::{optional_str, required_array, required_str};
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::EditFile.as_str().into(),
        description: "Apply search/replace edits to a file, in order. Each old_string must \
                      appear exactly once in the file; include enough surrounding text to make \
                      it unique. If an edit fails, the edits before it are kept."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Workspace-relative file path" },
                "edits": {
                    "type": "array",
                    "description": "Edits to apply in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "old_string": { "type": "string" },
                            "new_string": { "type": "string" }
                        },
                        "required": ["old_string", "new_string"]
                    }
                }
            },
            "required": ["path", "edits"]
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub old_string: String,
    pub new_string: String,
}

/// Result of applying a batch of edits to text.
#[derive(Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub content: String,
    pub applied: usize,
    pub skipped: usize,
    /// 1-based index of the failing edit and why it failed
    pub failure: Option<(usize, String)>,
}

/// Count occurrences of `needle`, overlapping ones included.
fn count_matches(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        count += 1;
        let start = from + pos;
        // Resume one char past the match start so overlaps are seen
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

/// Apply `edits` to `original` in order, stopping at the first failure.
pub fn apply_edits(original: &str, edits: &[Edit]) -> EditOutcome {
    let mut content = original.to_string();
    let mut applied = 0;
    let mut skipped = 0;

    for (i, edit) in edits.iter().enumerate() {
        let index = i + 1;
        if edit.old_string.is_empty() {
            return EditOutcome {
                content,
                applied,
                skipped,
                failure: Some((index, "old_string is empty".into())),
            };
        }
        if edit.old_string == edit.new_string {
            skipped += 1;
            continue;
        }

        match count_matches(&content, &edit.old_string) {
            0 => {
                return EditOutcome {
                    content,
                    applied,
                    skipped,
                    failure: Some((index, "old_string not found in file".into())),
                };
            }
            1 => {
                content = content.replacen(edit.old_string.as_str(), &edit.new_string, 1);
                applied += 1;
            }
            n => {
                return EditOutcome {
                    content,
                    applied,
                    skipped,
                    failure: Some((
                        index,
                        format!(
                            "old_string matches {n} locations; include more surrounding \
                             context so it matches exactly one"
                        ),
                    )),
                };
            }
        }
    }

    EditOutcome {
        content,
        applied,
        skipped,
        failure: None,
    }
}

fn parse_edits(input: &ToolInput) -> Result<Vec<Edit>, ToolError> {
    // A single edit may be given inline instead of as a list
    if !input.contains_key("edits") {
        if let Some(old_string) = optional_str(input, "old_string")? {
            let new_string = required_str(input, "new_string")?;
            return Ok(vec![Edit {
                old_string: old_string.into(),
                new_string: new_string.into(),
            }]);
        }
    }

    let items = required_array(input, "edits")?;
    if items.is_empty() {
        return Err(ToolError::InvalidArguments(
            "edits must contain at least one edit".into(),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let field = |key: &str| match item.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                _ => Err(ToolError::InvalidArguments(format!(
                    "edit {} is missing string field '{key}'",
                    i + 1
                ))),
            };
            Ok(Edit {
                old_string: field("old_string")?,
                new_string: field("new_string")?,
            })
        })
        .collect()
}

fn describe(edits: &[Edit]) -> String {
    edits
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "edit {}:\n--- {}\n+++ {}",
                i + 1,
                e.old_string,
                e.new_string
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let path = required_str(input, "path")?;
    let edits = parse_edits(input)?;

    let original = ctx.workspace.read(path).await.map_err(|e| match e {
        WorkspaceError::NotFound(_) => ToolError::FileNotFound(path.into()),
        other => workspace_error(ToolName::EditFile, other),
    })?;

    let outcome = apply_edits(&original, &edits);
    let total = edits.len();

    if outcome.applied > 0 {
        if ctx.settings.approve_writes {
            // Only the edits ahead of a failure are written
            let kept = outcome.failure.as_ref().map_or(total, |(index, _)| index - 1);
            ctx.approve(ApprovalKind::EditFile, path, &describe(&edits[..kept]))
                .await?;
        }
        ctx.workspace
            .write(path, &outcome.content)
            .await
            .map_err(|e| workspace_error(ToolName::EditFile, e))?;
    }

    let change = FileChange {
        path: normalize_path(path).unwrap_or_else(|| path.to_string()),
        kind: ChangeKind::Modified,
    };

    if let Some((index, reason)) = outcome.failure {
        let error = ToolError::EditFailed {
            index,
            total,
            applied: outcome.applied,
            reason,
        };
        if outcome.applied > 0 {
            return Ok(ToolOutput::partial(error, change)
                .with_metadata("applied", outcome.applied)
                .with_metadata("skipped", outcome.skipped));
        }
        return Err(error);
    }

    if outcome.applied == 0 {
        return Ok(ToolOutput::new(format!(
            "No changes made to {path}: all {total} edit(s) were no-ops"
        ))
        .with_metadata("applied", 0)
        .with_metadata("skipped", outcome.skipped));
    }

    let mut text = format!(
        "Successfully applied {} edit(s) to {path}",
        outcome.applied
    );
    if outcome.skipped > 0 {
        text.push_str(&format!(" ({} no-op edit(s) skipped)", outcome.skipped));
    }
    Ok(ToolOutput::new(text)
        .with_file_change(change)
        .with_metadata("applied", outcome.applied)
        .with_metadata("skipped", outcome.skipped))
}

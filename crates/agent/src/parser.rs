//! Tool-call parser: extracts `<tool>…</tool>` invocations from model text.
//!
//! The grammar is small and strict:
//!
//! - A tag name is a bareword (`[A-Za-z_][A-Za-z0-9_]*`) written exactly as
//!   `<name>`, with no attributes or whitespace. Names are case-sensitive.
//! - A region `<name>body</name>` whose name is a known tool is a tool call.
//!   The body is either one JSON object (strict JSON, double quotes only) or
//!   a sequence of `<param>value</param>` children. An empty body is an
//!   empty input.
//! - A known tool tag with a body that does not decode, or with no closing
//!   tag, is [`ParseIssue::Malformed`].
//! - A well-formed region with an unknown name is [`ParseIssue::UnknownTool`].
//!   Its contents are still scanned, so a call nested inside is found.
//! - Passthrough tags (e.g. `thinking`) are left alone entirely.
//!
//! Nothing else is recognized; there is no attempt to recover a call from
//! near-miss formats.

use serde_json::{Map, Value};
use steward_core::tool::{ToolCall, ToolInput, ToolName};

/// A problem found while parsing. Both kinds are model mistakes, not crashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// A known tool's tag whose body failed to decode or was never closed
    Malformed { tool: ToolName, reason: String },
    /// A well-formed `<name>…</name>` region whose name is not a tool
    UnknownTool { name: String },
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseIssue::Malformed { tool, reason } => {
                write!(f, "Malformed <{tool}> call: {reason}")
            }
            ParseIssue::UnknownTool { name } => write!(f, "Unknown tool <{name}>"),
        }
    }
}

/// Everything one parse produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Tool calls in document order
    pub calls: Vec<ToolCall>,
    /// Text outside tool-call regions, trimmed
    pub narrative: String,
    pub issues: Vec<ParseIssue>,
}

impl ParseOutcome {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ToolCallParser {
    passthrough: Vec<String>,
}

impl Default for ToolCallParser {
    fn default() -> Self {
        Self {
            passthrough: vec!["thinking".into()],
        }
    }
}

/// An opening tag `<name>` found at some offset.
struct OpenTag<'a> {
    name: &'a str,
    /// Offset of the `<`
    start: usize,
    /// Offset just past the `>`
    body_start: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Read `<ident>` at `start` (which must point at `<`).
fn read_open_tag(text: &str, start: usize) -> Option<OpenTag<'_>> {
    let bytes = text.as_bytes();
    let name_start = start + 1;
    if !bytes.get(name_start).copied().is_some_and(is_ident_start) {
        return None;
    }
    let mut end = name_start + 1;
    while bytes.get(end).copied().is_some_and(is_ident_continue) {
        end += 1;
    }
    if bytes.get(end) != Some(&b'>') {
        return None;
    }
    Some(OpenTag {
        name: &text[name_start..end],
        start,
        body_start: end + 1,
    })
}

/// Find `</name>` at or after `from`. Returns (close start, close end).
fn find_close(text: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let close = format!("</{name}>");
    text[from..]
        .find(&close)
        .map(|rel| (from + rel, from + rel + close.len()))
}

/// Strip one leading and one trailing newline from a parameter value.
fn trim_param_value(value: &str) -> &str {
    let value = value
        .strip_prefix("\r\n")
        .or_else(|| value.strip_prefix('\n'))
        .unwrap_or(value);
    value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value)
}

fn decode_params(body: &str) -> Result<ToolInput, String> {
    let mut input = Map::new();
    let mut pos = 0;

    loop {
        let rest = &body[pos..];
        let skipped = rest.len() - rest.trim_start().len();
        pos += skipped;
        if pos >= body.len() {
            break;
        }
        if !body[pos..].starts_with('<') {
            return Err("unexpected text between parameters".into());
        }
        let tag = read_open_tag(body, pos).ok_or("malformed parameter tag")?;
        let (close_start, close_end) = find_close(body, tag.name, tag.body_start)
            .ok_or_else(|| format!("parameter <{}> is not closed", tag.name))?;
        if input.contains_key(tag.name) {
            return Err(format!("duplicate parameter <{}>", tag.name));
        }
        let value = trim_param_value(&body[tag.body_start..close_start]);
        input.insert(tag.name.to_string(), Value::String(value.to_string()));
        pos = close_end;
    }

    Ok(input)
}

/// Decode a tool body into its input map.
pub fn decode_body(body: &str) -> Result<ToolInput, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err("JSON body must be an object".into()),
            Err(e) => Err(format!("invalid JSON body: {e}")),
        };
    }
    if trimmed.starts_with('<') {
        return decode_params(trimmed);
    }
    Err("body must be a JSON object or a sequence of <param>value</param> elements".into())
}

impl ToolCallParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of tags that are ignored by the parser.
    pub fn with_passthrough_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.passthrough = tags.into_iter().map(Into::into).collect();
        self
    }

    fn is_passthrough(&self, name: &str) -> bool {
        self.passthrough.iter().any(|t| t == name)
    }

    /// Parse a complete model response.
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut narrative = String::new();
        let mut pos = 0;
        let mut scan = 0;

        while let Some(rel) = text[scan..].find('<') {
            let lt = scan + rel;
            let Some(tag) = read_open_tag(text, lt) else {
                scan = lt + 1;
                continue;
            };

            if self.is_passthrough(tag.name) {
                scan = match find_close(text, tag.name, tag.body_start) {
                    Some((_, close_end)) => close_end,
                    None => tag.body_start,
                };
                continue;
            }

            match ToolName::from_name(tag.name) {
                Some(tool) => match find_close(text, tag.name, tag.body_start) {
                    Some((close_start, close_end)) => {
                        narrative.push_str(&text[pos..tag.start]);
                        match decode_body(&text[tag.body_start..close_start]) {
                            Ok(input) => outcome.calls.push(ToolCall::new(tool, input)),
                            Err(reason) => {
                                outcome.issues.push(ParseIssue::Malformed { tool, reason })
                            }
                        }
                        pos = close_end;
                        scan = close_end;
                    }
                    None => {
                        outcome.issues.push(ParseIssue::Malformed {
                            tool,
                            reason: format!("missing closing tag </{}>", tag.name),
                        });
                        scan = tag.body_start;
                    }
                },
                None => {
                    if find_close(text, tag.name, tag.body_start).is_some() {
                        outcome.issues.push(ParseIssue::UnknownTool {
                            name: tag.name.to_string(),
                        });
                    }
                    scan = tag.body_start;
                }
            }
        }

        narrative.push_str(&text[pos..]);
        outcome.narrative = narrative.trim().to_string();
        outcome
    }
}

/// Where the first complete tool-call span ends in `text`, if it can be
/// known already.
///
/// Returns `None` while any earlier tag could still change meaning once more
/// text arrives: a known tool or passthrough tag that is not yet closed, or
/// an unknown tag whose closing tag has not been seen. A span nested in a
/// closed unknown region ends at that region's closing tag.
fn find_first_complete_span(parser: &ToolCallParser, text: &str) -> Option<usize> {
    let mut scan = 0;
    let mut min_end = 0;

    while let Some(rel) = text[scan..].find('<') {
        let lt = scan + rel;
        let Some(tag) = read_open_tag(text, lt) else {
            scan = lt + 1;
            continue;
        };

        let close = find_close(text, tag.name, tag.body_start);
        if parser.is_passthrough(tag.name) {
            scan = close?.1;
            continue;
        }
        match ToolName::from_name(tag.name) {
            Some(_) => return close.map(|(_, end)| end.max(min_end)),
            None => {
                let (_, close_end) = close?;
                min_end = min_end.max(close_end);
                scan = tag.body_start;
            }
        }
    }
    None
}

/// Result of feeding one chunk to the streaming parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Keep reading
    Continue,
    /// A complete tool call has arrived; further output can be dropped
    ToolCallComplete,
}

/// Incremental front end for [`ToolCallParser`].
///
/// It only decides when to stop reading. The final result is always
/// `ToolCallParser::parse` over the text that was kept.
#[derive(Debug, Clone)]
pub struct StreamingToolCallParser {
    parser: ToolCallParser,
    buffer: String,
    complete: bool,
}

impl StreamingToolCallParser {
    pub fn new(parser: ToolCallParser) -> Self {
        Self {
            parser,
            buffer: String::new(),
            complete: false,
        }
    }

    /// Append a chunk. Once a call is complete, later chunks are ignored.
    pub fn push(&mut self, chunk: &str) -> StreamStatus {
        if self.complete {
            return StreamStatus::ToolCallComplete;
        }
        self.buffer.push_str(chunk);
        match find_first_complete_span(&self.parser, &self.buffer) {
            Some(end) => {
                self.buffer.truncate(end);
                self.complete = true;
                StreamStatus::ToolCallComplete
            }
            None => StreamStatus::Continue,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The text kept so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn into_text(self) -> String {
        self.buffer
    }

    /// Parse the kept text with the regular parser.
    pub fn finish(&self) -> ParseOutcome {
        self.parser.parse(&self.buffer)
    }
}

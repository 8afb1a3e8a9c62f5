//! Parser behavior over whole responses, the way models actually write them.

use serde_json::json;
use steward_agent::{ParseIssue, StreamStatus, StreamingToolCallParser, ToolCallParser};
use steward_core::tool::ToolName;

const MESSY_RESPONSES: &[&str] = &[
    "",
    "<",
    "<<>>",
    "</read_file>",
    "<read_file>",
    "<READ_FILE>{}</READ_FILE>",
    "<readfile>{}</readfile>",
    "<read_file >{}</read_file>",
    "```xml\n<read_file>{\"path\": \"a\"}</read_file>\n```",
    "<tool name=\"read_file\">{\"path\": \"a\"}</tool>",
    "<function_calls><invoke name=\"read_file\"/></function_calls>",
    "{\"tool\": \"read_file\", \"path\": \"a\"}",
    "<read_file><path>a</path><read_file><path>b</path></read_file></read_file>",
    "<bash_command><command>echo '<write_file>'</command><requires_approval>false</requires_approval></bash_command>",
    "<x><y><z></z></y></x>",
];

#[test]
fn only_known_tools_come_back() {
    let parser = ToolCallParser::new();
    for text in MESSY_RESPONSES {
        let outcome = parser.parse(text);
        for call in &outcome.calls {
            assert_eq!(
                ToolName::from_name(call.name.as_str()),
                Some(call.name),
                "input {text:?}"
            );
        }
        for issue in &outcome.issues {
            if let ParseIssue::UnknownTool { name } = issue {
                assert!(ToolName::from_name(name).is_none(), "input {text:?}");
            }
        }
    }
}

#[test]
fn both_body_forms_decode_the_same() {
    let parser = ToolCallParser::new();
    let pairs = [
        (
            r#"<read_file>{"path": "src/lib.rs", "offset": "10", "limit": "5"}</read_file>"#,
            "<read_file><path>src/lib.rs</path><offset>10</offset><limit>5</limit></read_file>",
        ),
        (
            r#"<grep_search>{"pattern": "fn \\w+", "path": "src", "include": "*.rs"}</grep_search>"#,
            r"<grep_search><pattern>fn \w+</pattern><path>src</path><include>*.rs</include></grep_search>",
        ),
        (
            r#"<bash_command>{"command": "cargo fmt && git diff", "requires_approval": "true"}</bash_command>"#,
            "<bash_command>\n<command>cargo fmt && git diff</command>\n<requires_approval>true</requires_approval>\n</bash_command>",
        ),
        (
            r#"<attempt_completion>{"result": "Renamed the function.\nAll call sites updated."}</attempt_completion>"#,
            "<attempt_completion><result>\nRenamed the function.\nAll call sites updated.\n</result></attempt_completion>",
        ),
    ];
    for (json_form, param_form) in pairs {
        let a = parser.parse(json_form);
        let b = parser.parse(param_form);
        assert!(a.issues.is_empty() && b.issues.is_empty(), "{json_form}");
        assert_eq!(a.calls, b.calls, "{json_form}");
        assert_eq!(a.calls.len(), 1);
    }
}

#[test]
fn content_with_markup_survives_param_form() {
    let parser = ToolCallParser::new();
    let text = "<write_file><path>index.html</path><content>\n<html><body>hi</body></html>\n</content></write_file>";
    let outcome = parser.parse(text);
    assert!(outcome.issues.is_empty());
    assert_eq!(
        outcome.calls[0].input["content"],
        json!("<html><body>hi</body></html>")
    );
}

#[test]
fn repeated_tags_each_parse_in_order() {
    let parser = ToolCallParser::new();
    let text = (1..=5)
        .map(|i| format!(r#"<read_file>{{"path": "f{i}.rs"}}</read_file>"#))
        .collect::<Vec<_>>()
        .join("\n");
    let outcome = parser.parse(&text);
    let paths: Vec<&str> = outcome
        .calls
        .iter()
        .map(|c| c.input["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["f1.rs", "f2.rs", "f3.rs", "f4.rs", "f5.rs"]);
}

#[test]
fn streaming_agrees_with_plain_parse_on_every_split() {
    let text = concat!(
        "<thinking>check the file first</thinking>\n",
        "I'll read it. ",
        r#"<read_file>{"path": "src/lib.rs"}</read_file>"#,
        " then maybe ",
        r#"<write_file>{"path": "x", "content": "y"}</write_file>"#
    );
    let plain = ToolCallParser::new().parse(text);

    for split in 0..=text.len() {
        if !text.is_char_boundary(split) {
            continue;
        }
        let mut streaming = StreamingToolCallParser::new(ToolCallParser::new());
        let mut status = streaming.push(&text[..split]);
        if status == StreamStatus::Continue {
            status = streaming.push(&text[split..]);
        }
        assert_eq!(status, StreamStatus::ToolCallComplete, "split {split}");

        let outcome = streaming.finish();
        assert_eq!(outcome, ToolCallParser::new().parse(streaming.text()));
        assert_eq!(outcome.calls, plain.calls[..1].to_vec(), "split {split}");
    }
}

//! Tool output truncation.
//!
//! Long outputs keep their beginning and end; the middle is replaced by a
//! marker line saying how much was cut.

/// Cut `output` to at most `max_chars` characters of content.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    let char_count = output.chars().count();
    if char_count <= max_chars {
        return output.to_string();
    }

    let removed = char_count - max_chars;
    let head = max_chars / 2;
    let tail = max_chars - head;
    format!(
        "{}\n\n[... output truncated: {removed} characters removed ...]\n\n{}",
        take_head(output, head),
        take_tail(output, char_count, tail)
    )
}

fn take_head(input: &str, char_count: usize) -> String {
    input.chars().take(char_count).collect()
}

fn take_tail(input: &str, total: usize, char_count: usize) -> String {
    input.chars().skip(total.saturating_sub(char_count)).collect()
}

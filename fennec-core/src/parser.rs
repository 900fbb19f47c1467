//! Input classification
//!
//! A pure total function from a raw input line to one of three outcomes:
//! empty input, a slash command, or free text with `@`-mentions extracted.

/// Result of classifying one raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// Whitespace-only input.
    Empty,
    /// `/name args` where `name` is non-empty and whitespace-free.
    Command { name: String, args: String },
    /// Anything else, with `@path` mentions in order of appearance.
    FreeText { text: String, mentions: Vec<String> },
}

/// Classify a raw input line.
///
/// A slash command is `/` immediately followed by at least one
/// non-whitespace character, after trimming surrounding whitespace.
/// The argument string starts after the first whitespace character that
/// follows the name; exactly one separator character is consumed, so
/// additional leading whitespace in the arguments is preserved.
pub fn parse(raw: &str) -> ParsedInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedInput::Empty;
    }

    if let Some(rest) = trimmed.strip_prefix('/') {
        match rest.chars().next() {
            Some(c) if !c.is_whitespace() => return parse_command(rest),
            _ => {}
        }
    }

    ParsedInput::FreeText {
        text: trimmed.to_string(),
        mentions: extract_mentions(trimmed),
    }
}

fn parse_command(rest: &str) -> ParsedInput {
    match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((idx, sep)) => {
            let name = rest[..idx].to_string();
            let args = rest[idx + sep.len_utf8()..].to_string();
            ParsedInput::Command { name, args }
        }
        None => ParsedInput::Command {
            name: rest.to_string(),
            args: String::new(),
        },
    }
}

/// Scan for `@` followed by one or more non-whitespace characters.
///
/// A lone `@`, an `@` at end of input, or `@` followed by whitespace is
/// literal text. Order of appearance is preserved.
fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '@' {
            continue;
        }
        let start = idx + c.len_utf8();
        let mut end = start;
        while let Some(&(j, nc)) = chars.peek() {
            if nc.is_whitespace() {
                break;
            }
            end = j + nc.len_utf8();
            chars.next();
        }
        if end > start {
            mentions.push(text[start..end].to_string());
        }
    }

    mentions
}

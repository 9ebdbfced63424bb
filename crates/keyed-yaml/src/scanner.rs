/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-line classification.
//!
//! A line is scanned once from left to right. Leading spaces are counted
//! until the first other character. The scan recognizes three markers:
//!
//! - `:` ends a key the first time it appears, if followed by a space or the
//!   end of the line and preceded by at least one key character;
//! - `#` starts a comment if it is at the start of the line or after a space;
//! - `-` starts a list item if it is the first non-space character and is
//!   followed by a space or the end of the line.
//!
//! Scanning stops at the comment marker, so markers inside a comment are
//! plain text.

/// The classification of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace only.
    Blank,

    /// `# comment` with nothing before it.
    Comment { indent: usize, comment: &'a str },

    /// `key: value # comment`; value and comment are optional.
    Key {
        indent: usize,
        key: &'a str,
        value: Option<&'a str>,
        comment: Option<&'a str>,
    },

    /// `- value # comment`; value and comment are optional.
    Item {
        indent: usize,
        value: Option<&'a str>,
        comment: Option<&'a str>,
    },

    /// Anything else; continues the previous value.
    Text {
        indent: usize,
        text: &'a str,
        comment: Option<&'a str>,
    },
}

impl<'a> Line<'a> {
    /// Number of leading spaces.
    pub fn indent(&self) -> usize {
        match *self {
            Line::Blank => 0,
            Line::Comment { indent, .. }
            | Line::Key { indent, .. }
            | Line::Item { indent, .. }
            | Line::Text { indent, .. } => indent,
        }
    }

    pub fn comment(&self) -> Option<&'a str> {
        match *self {
            Line::Blank => None,
            Line::Comment { comment, .. } => Some(comment),
            Line::Key { comment, .. } | Line::Item { comment, .. } | Line::Text { comment, .. } => {
                comment
            }
        }
    }
}

/// Classify one line (without its line terminator).
pub fn scan_line(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Line::Blank;
    }

    let bytes = line.as_bytes();
    let mut indent = 0;
    let mut char_found = false;
    let mut key_end = None;
    let mut hyphen = None;
    let mut comment = None;

    for (i, &byte) in bytes.iter().enumerate() {
        match byte {
            b' ' if !char_found => indent += 1,
            b'#' if is_comment_marker(bytes, i) => {
                comment = Some(i);
                break;
            }
            b'-' if !char_found && is_list_marker(bytes, i) => {
                hyphen = Some(i);
                char_found = true;
            }
            b':' if char_found
                && key_end.is_none()
                && hyphen.is_none()
                && is_key_terminator(bytes, i) =>
            {
                key_end = Some(i);
            }
            _ => char_found = true,
        }
    }

    let end = comment.unwrap_or(bytes.len());
    let comment_text = comment.map(|start| strip_leading_space(&line[start + 1..]));

    if let Some(colon) = key_end {
        return Line::Key {
            indent,
            key: line[indent..colon].trim_end(),
            value: inline_value(&line[colon + 1..end], comment.is_some()),
            comment: comment_text,
        };
    }

    if let Some(hyphen) = hyphen {
        return Line::Item {
            indent,
            value: inline_value(&line[hyphen + 1..end], comment.is_some()),
            comment: comment_text,
        };
    }

    match comment_text {
        Some(comment) if !char_found => Line::Comment { indent, comment },
        _ => Line::Text {
            indent,
            text: trim_separator(&line[indent..end], comment.is_some()),
            comment: comment_text,
        },
    }
}

fn is_comment_marker(bytes: &[u8], at: usize) -> bool {
    at == 0 || bytes[at - 1] == b' '
}

fn is_list_marker(bytes: &[u8], at: usize) -> bool {
    (at == 0 || bytes[at - 1] == b' ') && bytes.get(at + 1).is_none_or(|&next| next == b' ')
}

fn is_key_terminator(bytes: &[u8], at: usize) -> bool {
    bytes.get(at + 1).is_none_or(|&next| next == b' ')
}

fn strip_leading_space(text: &str) -> &str {
    text.strip_prefix(' ').unwrap_or(text)
}

/// Drop the single space separating the text from a following comment.
fn trim_separator(text: &str, before_comment: bool) -> &str {
    if before_comment {
        text.strip_suffix(' ').unwrap_or(text)
    } else {
        text
    }
}

fn inline_value(raw: &str, before_comment: bool) -> Option<&str> {
    let value = trim_separator(strip_leading_space(raw), before_comment);
    (!value.is_empty()).then_some(value)
}

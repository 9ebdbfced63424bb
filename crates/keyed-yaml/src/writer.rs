/*
 * writer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Serializes a unified section list back to text.
//!
//! Indentation is derived from each section's depth, two spaces per level.
//! Ancestor keys already opened by the previous section are not repeated,
//! and ancestors missing from the list get a bare `key:` header so the
//! output always re-reads into the same key paths.

use std::fmt::Write as _;

use crate::config::Config;
use crate::reader::strip_enclosing_quotes;
use crate::section::{Section, SectionRef};
use crate::value::Value;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy)]
pub struct Writer<'c> {
    config: &'c Config,
}

impl<'c> Writer<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn write(&self, sections: &[SectionRef]) -> String {
        let mut out = String::new();
        let mut previous: Vec<String> = Vec::new();

        for section in sections {
            let section = section.borrow();
            let path = section.path();
            self.write_section(&mut out, &section, &path, &previous);
            previous = path;
        }
        out
    }

    fn write_section(&self, out: &mut String, section: &Section, path: &[String], previous: &[String]) {
        let depth = path.len() - 1;

        for _ in 0..section.blank_lines_before {
            out.push('\n');
        }

        // Ancestor headers, skipping the ones the previous section opened.
        let shared = path
            .iter()
            .zip(previous)
            .take_while(|(a, b)| a == b)
            .count()
            .min(depth);
        for (level, key) in path.iter().enumerate().take(depth).skip(shared) {
            push_indent(out, level);
            let _ = writeln!(out, "{key}:");
        }

        let comments = if section.top_comments.is_empty()
            && self.config.write_default_comments_when_empty
        {
            &section.default_comments
        } else {
            &section.top_comments
        };
        for comment in comments {
            write_comment_lines(out, depth, comment);
        }

        push_indent(out, depth);
        out.push_str(section.key());
        out.push(':');

        let values = if !section.has_values()
            && self.config.write_default_when_empty
            && !section.default_values.is_empty()
        {
            &section.default_values
        } else {
            &section.values
        };

        match values.as_slice() {
            [] => out.push('\n'),
            // A multi-line side comment only fits the list form.
            [value] if !value.side_comment.as_deref().is_some_and(|c| c.contains('\n')) => {
                if let Some(text) = &value.text {
                    out.push(' ');
                    self.write_text(out, depth + 1, text);
                }
                if let Some(comment) = &value.side_comment {
                    let _ = write!(out, " # {comment}");
                }
                out.push('\n');
            }
            items => {
                out.push('\n');
                for item in items {
                    self.write_item(out, depth + 1, item);
                }
            }
        }
    }

    fn write_item(&self, out: &mut String, level: usize, item: &Value) {
        let mut comment_lines = item
            .side_comment
            .as_deref()
            .map(|comment| comment.split('\n').collect::<Vec<_>>())
            .unwrap_or_default();
        let side = comment_lines.pop();
        for line in comment_lines {
            write_comment_lines(out, level, line);
        }

        push_indent(out, level);
        out.push('-');
        if let Some(text) = &item.text {
            out.push(' ');
            self.write_text(out, level + 1, text);
        }
        if let Some(side) = side {
            let _ = write!(out, " # {side}");
        }
        out.push('\n');
    }

    /// Write a value, quoting it if a re-read would otherwise change it and
    /// putting continuation lines one level deeper.
    fn write_text(&self, out: &mut String, continuation_level: usize, text: &str) {
        let mut lines = text.split('\n');
        let first = lines.next().unwrap_or_default();
        if text.contains('\n') {
            out.push_str(first);
            for line in lines {
                out.push('\n');
                push_indent(out, continuation_level);
                out.push_str(line);
            }
        } else if self.needs_quotes(text) {
            let _ = write!(out, "\"{text}\"");
        } else {
            out.push_str(text);
        }
    }

    fn needs_quotes(&self, text: &str) -> bool {
        if !self.config.post_processing || !self.config.strip_quotes {
            return false;
        }
        text.is_empty()
            || text.starts_with('#')
            || (self.config.trim_values && text.trim().len() != text.len())
            || strip_enclosing_quotes(text).is_some()
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn write_comment_lines(out: &mut String, level: usize, comment: &str) {
    for line in comment.split('\n') {
        push_indent(out, level);
        if line.is_empty() {
            out.push_str("#\n");
        } else {
            let _ = writeln!(out, "# {line}");
        }
    }
}

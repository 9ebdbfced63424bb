/*
 * reader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Builds the loaded section tree from text.
//!
//! The reader drives [`scan_line`] over the input and turns the classified
//! lines into sections:
//!
//! - comment-only lines collect into a pending block that becomes the top
//!   comments of the next key;
//! - a key line creates a section whose parent is the nearest earlier key
//!   line indented exactly two spaces less;
//! - list items and plain text lines extend the most recent key;
//! - blank lines are counted and reproduced above the next section.
//!
//! After the scan, the post-processing pipeline configured in [`Config`]
//! runs over every section.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scanner::{Line, scan_line};
use crate::section::{Section, SectionRef, link_child};
use crate::value::Value;

/// Parser for the line-oriented format.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'c> {
    config: &'c Config,
}

impl<'c> Reader<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Parse `text` into a flat list of sections in file order.
    ///
    /// The sections are linked into a tree through their parent and
    /// children references; the list holds roots and descendants alike.
    pub fn parse(&self, text: &str) -> Result<Vec<SectionRef>> {
        let mut builder = TreeBuilder::new(self.config);
        for (index, line) in text.lines().enumerate() {
            builder.push_line(index + 1, line)?;
        }
        let sections = builder.finish();

        if self.config.post_processing {
            for section in &sections {
                post_process(&mut section.borrow_mut(), self.config);
            }
        }

        debug!(sections = sections.len(), "Parsed document");
        Ok(sections)
    }
}

/// Comment lines waiting for the key they document.
#[derive(Debug, Default)]
struct PendingComments {
    comments: Vec<String>,
    blank_lines_before: u32,
}

struct KeyLine {
    indent: usize,
    section: SectionRef,
}

struct TreeBuilder<'c> {
    config: &'c Config,
    key_lines: Vec<KeyLine>,
    pending: Option<PendingComments>,
    blank_lines: u32,
    /// Set while the latest key line had no inline value and no item or
    /// text has extended it yet.
    placeholder: bool,
}

impl<'c> TreeBuilder<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            config,
            key_lines: Vec::new(),
            pending: None,
            blank_lines: 0,
            placeholder: false,
        }
    }

    fn last_section(&self) -> Option<SectionRef> {
        self.key_lines.last().map(|line| Rc::clone(&line.section))
    }

    fn push_line(&mut self, number: usize, text: &str) -> Result<()> {
        let line = scan_line(text);
        trace!(line = number, kind = ?line, "Scanned line");

        match line {
            Line::Blank => self.blank_lines += 1,
            Line::Comment { comment, .. } => self.push_comment(comment),
            Line::Key {
                indent,
                key,
                value,
                comment,
            } => self.push_key(number, indent, key, value, comment),
            Line::Item { value, comment, .. } => self.push_item(number, value, comment)?,
            Line::Text { text, comment, .. } => self.push_text(number, text, comment)?,
        }
        Ok(())
    }

    fn push_comment(&mut self, comment: &str) {
        match &mut self.pending {
            Some(pending) => {
                pending.comments.push(comment.to_string());
                self.blank_lines = 0;
            }
            None => {
                self.pending = Some(PendingComments {
                    comments: vec![comment.to_string()],
                    blank_lines_before: mem::take(&mut self.blank_lines),
                });
            }
        }
    }

    fn push_key(
        &mut self,
        number: usize,
        indent: usize,
        key: &str,
        value: Option<&str>,
        comment: Option<&str>,
    ) {
        let pending = self.pending.take().unwrap_or_else(|| PendingComments {
            comments: Vec::new(),
            blank_lines_before: self.blank_lines,
        });
        self.blank_lines = 0;

        let mut section = Section::new(key);
        section.top_comments = pending.comments;
        section.blank_lines_before = pending.blank_lines_before;
        section.values = vec![Value {
            text: value.map(str::to_string),
            side_comment: comment.map(str::to_string),
        }];
        section.set_return_default_when_null(self.config.return_default_when_null);
        let section = Rc::new(RefCell::new(section));

        if let Some(parent) = self.resolve_parent(number, indent) {
            link_child(&parent, &section);
        }

        self.placeholder = value.is_none();
        self.key_lines.push(KeyLine { indent, section });
    }

    /// The nearest earlier key line with a smaller indentation is the
    /// parent candidate; it is the parent only if it sits exactly one level
    /// (two spaces) higher.
    fn resolve_parent(&self, number: usize, indent: usize) -> Option<SectionRef> {
        if indent == 0 {
            return None;
        }
        let candidate = self.key_lines.iter().rev().find(|line| line.indent < indent);
        match candidate {
            Some(line) if indent - line.indent == 2 => Some(Rc::clone(&line.section)),
            _ => {
                warn!(
                    line = number,
                    indent, "Irregular indentation, treating key as a root section"
                );
                None
            }
        }
    }

    fn push_item(&mut self, number: usize, value: Option<&str>, comment: Option<&str>) -> Result<()> {
        let owner = self
            .last_section()
            .ok_or(Error::IllegalList { line: number })?;
        let mut owner = owner.borrow_mut();

        if mem::take(&mut self.placeholder)
            && owner.values.len() == 1
            && owner.values[0].text.is_none()
        {
            let placeholder = owner.values.remove(0);
            if let Some(comment) = placeholder.side_comment {
                warn!(
                    line = number,
                    "Moving the comment of a list key above the key"
                );
                owner.top_comments.push(comment);
            }
        }

        let mut side_comment: Vec<String> = self
            .pending
            .take()
            .map(|pending| pending.comments)
            .unwrap_or_default();
        side_comment.extend(comment.map(str::to_string));

        owner.values.push(Value {
            text: value.map(str::to_string),
            side_comment: (!side_comment.is_empty()).then(|| side_comment.join("\n")),
        });
        Ok(())
    }

    fn push_text(&mut self, number: usize, text: &str, comment: Option<&str>) -> Result<()> {
        let owner = self
            .last_section()
            .ok_or(Error::DanglingText { line: number })?;
        let mut owner = owner.borrow_mut();
        self.placeholder = false;

        match owner.values.last_mut() {
            Some(value) => {
                match &mut value.text {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(text);
                    }
                    None => value.text = Some(text.to_string()),
                }
                if let Some(comment) = comment {
                    value.side_comment = Some(match value.side_comment.take() {
                        Some(existing) => format!("{existing} {comment}"),
                        None => comment.to_string(),
                    });
                }
            }
            None => owner.values.push(Value {
                text: Some(text.to_string()),
                side_comment: comment.map(str::to_string),
            }),
        }
        Ok(())
    }

    fn finish(self) -> Vec<SectionRef> {
        if let Some(pending) = &self.pending {
            debug!(
                comments = pending.comments.len(),
                "Dropping trailing comments that document no key"
            );
        }
        self.key_lines.into_iter().map(|line| line.section).collect()
    }
}

/// Run the configured post-processing steps over one section, in order:
/// trim values, strip quotes, drop nulls, trim comments.
pub(crate) fn post_process(section: &mut Section, config: &Config) {
    if config.trim_values {
        for value in &mut section.values {
            if let Some(text) = &mut value.text {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                }
            }
        }
    }

    if config.strip_quotes {
        for value in &mut section.values {
            if let Some(text) = &mut value.text
                && let Some(inner) = strip_enclosing_quotes(text)
            {
                *text = inner.to_string();
            }
        }
    }

    if config.remove_null_values {
        section.values.retain(|value| value.text.is_some());
    }

    if config.trim_comments {
        for comment in &mut section.top_comments {
            *comment = comment.trim().to_string();
        }
        for value in &mut section.values {
            if let Some(comment) = &mut value.side_comment {
                *comment = comment.trim().to_string();
            }
        }
    }
}

/// The text between a matching pair of `"` or `'` enclosing all of `text`.
pub(crate) fn strip_enclosing_quotes(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last))
            if bytes.len() >= 2 && first == last && (first == b'"' || first == b'\'') =>
        {
            Some(&text[1..text.len() - 1])
        }
        _ => None,
    }
}

/// An edit section whose path has no counterpart in a fresh load.
pub(crate) struct Unmatched {
    pub path: Vec<String>,
    pub section: SectionRef,
}

/// Copy freshly loaded data into the edit sections with the same path.
///
/// `edits` pairs each edit section with the path it had before the reload.
/// Matched sections receive the loaded values, parent and children, so
/// existing handles observe current data. Unmatched sections are relinked
/// to a parent with the right path if one exists among the loaded or edit
/// sections; the rest are returned.
pub(crate) fn refresh_edits(
    edits: &[(Vec<String>, SectionRef)],
    loaded: &[SectionRef],
) -> Vec<Unmatched> {
    let loaded_paths: Vec<(Vec<String>, &SectionRef)> = loaded
        .iter()
        .map(|section| (section.borrow().path(), section))
        .collect();
    let find_loaded = |path: &[String]| {
        loaded_paths
            .iter()
            .find(|(candidate, _)| candidate.as_slice() == path)
            .map(|(_, section)| Rc::clone(section))
    };

    let mut unmatched = Vec::new();
    for (path, edit) in edits {
        if let Some(fresh) = find_loaded(path) {
            if Rc::ptr_eq(&fresh, edit) {
                continue;
            }
            let fresh = fresh.borrow();
            let mut edit = edit.borrow_mut();
            edit.values = fresh.values.clone();
            edit.set_parent(fresh.parent_weak());
            edit.set_children(fresh.children().to_vec());
            continue;
        }

        if path.len() > 1 {
            let parent_path = &path[..path.len() - 1];
            let parent = find_loaded(parent_path).or_else(|| {
                edits
                    .iter()
                    .find(|(candidate, _)| candidate.as_slice() == parent_path)
                    .map(|(_, section)| Rc::clone(section))
            });
            match parent {
                Some(parent) => link_child(&parent, edit),
                None => unmatched.push(Unmatched {
                    path: path.clone(),
                    section: Rc::clone(edit),
                }),
            }
        }
    }
    unmatched
}

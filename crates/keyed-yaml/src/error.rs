/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for reading, editing and writing documents.

use std::io;

use thiserror::Error;

/// Errors that can occur while loading, editing or saving a document.
#[derive(Debug, Error)]
pub enum Error {
    /// A mutation was attempted before the first successful `load()`.
    #[error("document has not been loaded yet")]
    NotLoaded,

    /// An `add` whose full key path already exists.
    #[error("duplicate key path: {path}")]
    DuplicateKey { path: String },

    /// An empty key path, or a segment the writer could not reproduce.
    #[error("illegal key path: {reason}")]
    IllegalKey { reason: String },

    /// A list item with no preceding key to own it.
    #[error("list item on line {line} has no owning key")]
    IllegalList { line: usize },

    /// A plain text line before any key it could continue.
    #[error("text on line {line} does not continue any value")]
    DanglingText { line: usize },

    /// The source could not be read.
    #[error("failed to read source: {0}")]
    Read(#[source] io::Error),

    /// The source could not be written.
    #[error("failed to write source: {0}")]
    Write(#[source] io::Error),

    /// `save()` produced no sections at all.
    #[error("nothing to save: the document has no sections")]
    EmptyDocument,

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl Error {
    pub(crate) fn illegal_key(reason: impl Into<String>) -> Self {
        Error::IllegalKey {
            reason: reason.into(),
        }
    }

    /// Whether this error was raised while reading the source.
    pub fn is_reader_failure(&self) -> bool {
        matches!(
            self,
            Error::Read(_) | Error::IllegalList { .. } | Error::DanglingText { .. }
        )
    }

    /// Whether this error was raised while writing the source.
    pub fn is_writer_failure(&self) -> bool {
        matches!(self, Error::Write(_) | Error::EmptyDocument)
    }
}

/// A value's text does not parse as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert {text:?} to {target}")]
    Invalid { target: &'static str, text: String },

    #[error("cannot convert a null value to {target}")]
    Null { target: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

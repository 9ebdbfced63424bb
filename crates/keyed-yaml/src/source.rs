/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Backing storage of a document.
//!
//! A document reads its whole text from a [`Source`] on every load and
//! writes the whole text back on save.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Trait for the storage a document loads from and saves to.
pub trait Source {
    /// Read the complete current text.
    fn read(&mut self) -> io::Result<String>;

    /// Replace the stored text with `text`.
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Short human-readable description, for logs.
    fn describe(&self) -> String;
}

/// A file on disk. The file must exist to be loaded.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for FileSource {
    fn read(&mut self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        fs::write(&self.path, text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Text held in memory; saving replaces it.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    text: String,
}

impl MemorySource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The current text, including the result of the last save.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Source for MemorySource {
    fn read(&mut self) -> io::Result<String> {
        Ok(self.text.clone())
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.text = text.to_string();
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// A byte stream pair: the input is consumed by the first load, saves go
/// to the output.
///
/// Later loads see the text read first, or the text saved last.
#[derive(Debug)]
pub struct StreamSource<R, W> {
    input: Option<R>,
    output: W,
    current: String,
}

impl<R: Read, W: Write> StreamSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Some(input),
            output,
            current: String::new(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: Read, W: Write> Source for StreamSource<R, W> {
    fn read(&mut self) -> io::Result<String> {
        if let Some(mut input) = self.input.take() {
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            self.current = text;
        }
        Ok(self.current.clone())
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        self.current = text.to_string();
        Ok(())
    }

    fn describe(&self) -> String {
        "<stream>".to_string()
    }
}

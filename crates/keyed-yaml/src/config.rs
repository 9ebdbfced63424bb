/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Processing toggles for reading and writing documents.

use serde::{Deserialize, Serialize};

/// Toggles controlling post-processing on load and default handling.
///
/// The post-processing steps run in a fixed order after every parse:
/// trim values, strip matching quotes, drop null values, trim comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch for the post-processing pipeline.
    pub post_processing: bool,

    pub trim_values: bool,

    /// Remove a matching pair of `"` or `'` enclosing a whole value.
    pub strip_quotes: bool,

    /// Drop values whose text is `None`.
    pub remove_null_values: bool,

    pub trim_comments: bool,

    /// `Section::value_at` falls back to the default value when the value is null.
    pub return_default_when_null: bool,

    /// The writer writes default values for sections with no non-null values.
    pub write_default_when_empty: bool,

    /// The writer writes default comments for sections with no top comments.
    pub write_default_comments_when_empty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            post_processing: true,
            trim_values: true,
            strip_quotes: true,
            remove_null_values: false,
            trim_comments: true,
            return_default_when_null: true,
            write_default_when_empty: true,
            write_default_comments_when_empty: true,
        }
    }
}

impl Config {
    /// A config with every post-processing step disabled.
    pub fn raw() -> Self {
        Self {
            post_processing: false,
            ..Self::default()
        }
    }
}

/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A single value of a section, with typed accessors.

use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// A null-capable piece of text plus an optional side comment.
///
/// `text == None` is an explicit absence and is distinct from the empty
/// string: `key:` reads as `None`, `key: ""` reads as `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pub text: Option<String>,

    /// Comment printed on the same line, after ` # `.
    pub side_comment: Option<String>,
}

impl Value {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            side_comment: None,
        }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn with_side_comment(mut self, comment: impl Into<String>) -> Self {
        self.side_comment = Some(comment.into());
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn side_comment(&self) -> Option<&str> {
        self.side_comment.as_deref()
    }

    pub fn is_null(&self) -> bool {
        self.text.is_none()
    }

    /// The text, failing on `None`.
    pub fn as_str(&self) -> Result<&str, ConversionError> {
        self.text
            .as_deref()
            .ok_or(ConversionError::Null { target: "string" })
    }

    /// The text as a sequence of characters.
    pub fn as_chars(&self) -> Result<Vec<char>, ConversionError> {
        Ok(self.as_str()?.chars().collect())
    }

    /// Accepts `true` and `false` in any letter case.
    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        let text = self.text.as_deref().ok_or(ConversionError::Null { target: "bool" })?;
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ConversionError::Invalid {
                target: "bool",
                text: text.to_string(),
            })
        }
    }

    pub fn as_i8(&self) -> Result<i8, ConversionError> {
        self.parse_as("byte")
    }

    pub fn as_i16(&self) -> Result<i16, ConversionError> {
        self.parse_as("short")
    }

    pub fn as_i32(&self) -> Result<i32, ConversionError> {
        self.parse_as("int")
    }

    pub fn as_i64(&self) -> Result<i64, ConversionError> {
        self.parse_as("long")
    }

    pub fn as_f32(&self) -> Result<f32, ConversionError> {
        self.parse_as("float")
    }

    pub fn as_f64(&self) -> Result<f64, ConversionError> {
        self.parse_as("double")
    }

    /// Parse the text with any [`FromStr`] type.
    pub fn parse<T: FromStr>(&self) -> Result<T, ConversionError> {
        self.parse_as(std::any::type_name::<T>())
    }

    fn parse_as<T: FromStr>(&self, target: &'static str) -> Result<T, ConversionError> {
        let text = self.text.as_deref().ok_or(ConversionError::Null { target })?;
        text.parse().map_err(|_| ConversionError::Invalid {
            target,
            text: text.to_string(),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::new(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::new(text)
    }
}

impl From<Option<String>> for Value {
    fn from(text: Option<String>) -> Self {
        Self {
            text,
            side_comment: None,
        }
    }
}

//! Strings that remember the markup dialect they were written in.
//!
//! Course content mixes notations (LaTeX, Markdown, plain text). A
//! [`LangString`] carries its source notation so a recipe can convert it to
//! its output dialect at build time through a [`NotationConverter`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BuildError;

/// A string tagged with the notation it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub value: String,
    /// Markup dialect (`latex`, `markdown`, ...); `None` means untagged.
    pub notation: Option<String>,
}

impl LangString {
    pub fn new(value: impl Into<String>, notation: Option<String>) -> Self {
        LangString {
            value: value.into(),
            notation,
        }
    }

    /// An untagged string (no notation, never converted).
    pub fn plain(value: impl Into<String>) -> Self {
        LangString {
            value: value.into(),
            notation: None,
        }
    }

    /// Convert the value to `target` notation.
    ///
    /// Conversion is skipped when the string is untagged, when no target is
    /// requested, or when source and target dialects already agree.
    pub fn convert_to(
        &self,
        target: Option<&str>,
        converter: &dyn NotationConverter,
    ) -> Result<String, BuildError> {
        match (self.notation.as_deref(), target) {
            (Some(from), Some(to)) if from != to => converter.convert(&self.value, from, to),
            _ => Ok(self.value.clone()),
        }
    }
}

impl fmt::Display for LangString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Dialect conversion seam, implemented by makecourse-render with pandoc.
pub trait NotationConverter {
    fn convert(&self, text: &str, from: &str, to: &str) -> Result<String, BuildError>;
}

/// Converter that refuses to convert anything; returns the input unchanged.
///
/// Useful when all content is already in the output dialect, and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityConverter;

impl NotationConverter for IdentityConverter {
    fn convert(&self, text: &str, _from: &str, _to: &str) -> Result<String, BuildError> {
        Ok(text.to_string())
    }
}

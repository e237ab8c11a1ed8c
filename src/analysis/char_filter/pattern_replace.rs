//! Regex replacement char filter.

use std::borrow::Cow;

use regex::Regex;

use super::CharFilter;
use crate::error::{IsItXError, Result};

/// Pattern matching HTML entities such as `&amp;`, `&#39;` or `&nbsp;`.
pub const HTML_ENTITY_PATTERN: &str = r"&#?\w*;";

/// Pattern matching runs of characters that are neither letters, digits nor whitespace.
pub const NON_ALPHANUMERIC_PATTERN: &str = r"[^\p{L}\p{N}\s]+";

/// Pattern matching two or more consecutive spaces.
pub const REPEATED_SPACES_PATTERN: &str = r" {2,}";

/// A char filter that replaces every match of a regex with a fixed string.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| IsItXError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    /// Replace HTML entities with a single space.
    pub fn html_entities() -> Result<Self> {
        Self::new(HTML_ENTITY_PATTERN, " ")
    }

    /// Replace punctuation and symbol runs with a single space.
    pub fn non_alphanumeric() -> Result<Self> {
        Self::new(NON_ALPHANUMERIC_PATTERN, " ")
    }

    /// Collapse repeated spaces into one.
    pub fn repeated_spaces() -> Result<Self> {
        Self::new(REPEATED_SPACES_PATTERN, " ")
    }

    /// Get the regex pattern used by this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        match self.pattern.replace_all(input, self.replacement.as_str()) {
            Cow::Borrowed(unchanged) => unchanged.to_string(),
            Cow::Owned(replaced) => replaced,
        }
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

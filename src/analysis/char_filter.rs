//! Char filters that rewrite raw text before it is tokenized.
//!
//! The linguistic extractor uses them to blank out HTML entities and
//! punctuation so that the tokenizer only ever sees alphanumeric words
//! separated by single spaces.

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text and return the rewritten text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod pattern_replace;

pub use pattern_replace::PatternReplaceCharFilter;

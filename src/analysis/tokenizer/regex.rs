//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream};
use crate::error::{IsItXError, Result};

/// A tokenizer that splits text on matches of a separator pattern.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// Pattern matching the separators between tokens
    separator: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a tokenizer splitting on `separator`.
    pub fn with_separator(separator: &str) -> Result<Self> {
        let separator = Regex::new(separator)
            .map_err(|e| IsItXError::analysis(format!("Invalid regex pattern: {e}")))?;
        Ok(RegexTokenizer {
            separator: Arc::new(separator),
        })
    }

    /// A tokenizer splitting on runs of non-word characters.
    pub fn non_word_splitter() -> Result<Self> {
        Self::with_separator(r"\W+")
    }

    /// Get the separator pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.separator.as_str()
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut last_end = 0;

        for mat in self.separator.find_iter(text) {
            if mat.start() > last_end {
                tokens.push(Token::with_offsets(
                    &text[last_end..mat.start()],
                    tokens.len(),
                    last_end,
                    mat.start(),
                ));
            }
            last_end = mat.end();
        }

        // Add final gap if any
        if last_end < text.len() {
            tokens.push(Token::with_offsets(
                &text[last_end..],
                tokens.len(),
                last_end,
                text.len(),
            ));
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

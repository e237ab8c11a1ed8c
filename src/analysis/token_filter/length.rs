//! Length filter implementation.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that drops tokens whose character length falls outside
/// `min..=max`.
#[derive(Clone, Copy, Debug)]
pub struct LengthFilter {
    min: usize,
    max: usize,
}

impl LengthFilter {
    /// Keep tokens with `min <= chars <= max`.
    pub fn new(min: usize, max: usize) -> Self {
        LengthFilter { min, max }
    }

    /// Keep tokens with at least `min` characters.
    pub fn at_least(min: usize) -> Self {
        Self::new(min, usize::MAX)
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Whether a token of this text would be kept.
    pub fn accepts(&self, text: &str) -> bool {
        let len = text.chars().count();
        len >= self.min && len <= self.max
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| self.accepts(&token.text))
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_filter_bounds_are_inclusive() {
        let filter = LengthFilter::new(3, 19);
        let tokens = vec![
            Token::new("ab", 0),
            Token::new("abc", 1),
            Token::new("a".repeat(19), 2),
            Token::new("a".repeat(20), 3),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "abc");
        assert_eq!(result[1].char_len(), 19);
    }

    #[test]
    fn test_length_counts_characters() {
        let filter = LengthFilter::at_least(3);
        assert!(filter.accepts("né!"));
        assert!(!filter.accepts("né"));
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(LengthFilter::at_least(1).name(), "length");
    }
}

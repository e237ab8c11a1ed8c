//! Case folding.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Lowercases every token.
///
/// Features are compared case-insensitively, so "Game" and "GAME" in two
/// documents count as the same evidence.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| {
            if !token.text.chars().any(char::is_uppercase) {
                token
            } else {
                let folded = token.text.to_lowercase();
                token.with_text(folded)
            }
        })))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::{IntoTokenStream, Token};

    #[test]
    fn test_folds_case() {
        let tokens = vec![
            Token::new("Game", 0),
            Token::new("ÉQUIPE", 1),
            Token::new("scored", 2),
        ];

        let result: Vec<Token> = LowercaseFilter::new()
            .filter(tokens.into_token_stream())
            .unwrap()
            .collect();

        assert_eq!(result[0].text, "game");
        assert_eq!(result[1].text, "équipe");
        assert_eq!(result[2].text, "scored");
        assert_eq!(result[1].position, 1);
    }
}

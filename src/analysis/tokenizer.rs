//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first token-producing step of the pipeline: they split
//! (already char-filtered) text into [`Token`](crate::analysis::token::Token)s.
//!
//! - [`whitespace::WhitespaceTokenizer`] - splits on whitespace
//! - [`regex::RegexTokenizer`] - splits on matches of a separator pattern
//!
//! # Examples
//!
//! ```
//! use isitx::analysis::tokenizer::Tokenizer;
//! use isitx::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod regex;
pub mod whitespace;

pub use self::regex::RegexTokenizer;
pub use whitespace::WhitespaceTokenizer;

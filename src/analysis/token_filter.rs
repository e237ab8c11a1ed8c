//! Token filter implementations for token transformation.
//!
//! Filters receive a token stream and produce a new one, lowercasing,
//! dropping or rewriting tokens along the way:
//!
//! - [`lowercase::LowercaseFilter`] - converts tokens to lowercase
//! - [`stop::StopFilter`] - removes stop words
//! - [`length::LengthFilter`] - removes tokens outside a character-length window
//! - [`lemma::LemmaFilter`] - reduces words to their dictionary lemma
//!
//! # Examples
//!
//! ```
//! use isitx::analysis::token_filter::Filter;
//! use isitx::analysis::token_filter::lowercase::LowercaseFilter;
//! use isitx::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "hello");
//! assert_eq!(filtered[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod lemma;
pub mod length;
pub mod lowercase;
pub mod stop;

pub use lemma::{EnglishLemmatizer, LemmaFilter, Lemmatizer};
pub use length::LengthFilter;
pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;

//! Text analysis for isitx.
//!
//! Raw documents are turned into features in three stages, the same way a
//! search engine analyzes text before indexing it:
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Token Filters → Features
//! ```
//!
//! The [`extractor`] module assembles these stages into the two
//! feature-extraction strategies the classifier consumes.

pub mod char_filter;
pub mod extractor;
pub mod pipeline;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

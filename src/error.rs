//! Error types for the isitx library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`IsItXError`] enum. Two variants carry classifier semantics and are meant
//! to be matched on by callers:
//!
//! - [`IsItXError::EmptyModel`] - nothing has been trained yet
//! - [`IsItXError::StoreUnavailable`] - the count store is closed or unreachable
//!
//! A classification that is not confident is *not* an error; it is reported as
//! [`Classification::Undetermined`](crate::classifier::Classification::Undetermined).
//!
//! # Examples
//!
//! ```
//! use isitx::error::{IsItXError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(IsItXError::invalid_input("threshold must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::source::FetchError;

/// The main error type for isitx operations.
#[derive(Error, Debug)]
pub enum IsItXError {
    /// No category has been trained yet.
    #[error("Empty model: no categories have been trained")]
    EmptyModel,

    /// The count store is closed or cannot be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Caller supplied a value the operation cannot accept.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors (corrupt tables, journal replay, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (bad patterns, ...)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document acquisition failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with IsItXError.
pub type Result<T> = std::result::Result<T, IsItXError>;

impl IsItXError {
    /// Create a new store unavailable error.
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        IsItXError::StoreUnavailable(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        IsItXError::InvalidInput(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        IsItXError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        IsItXError::Analysis(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        IsItXError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        IsItXError::Other(msg.into())
    }

    /// Whether this error means the model has nothing trained yet.
    pub fn is_empty_model(&self) -> bool {
        matches!(self, IsItXError::EmptyModel)
    }

    /// Whether this error means the backing store could not be used.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, IsItXError::StoreUnavailable(_))
    }
}

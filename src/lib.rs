//! # isitx
//!
//! An incremental naive-Bayes text classifier: train it one labeled document
//! at a time, then ask which category a new document belongs to.
//!
//! ## Features
//!
//! - Pluggable feature extraction built from a text analysis pipeline
//! - Count storage behind a trait, in memory or durable on disk
//! - Smoothed log-space scoring with per-category margin thresholds
//! - An explicit "undetermined" outcome instead of a forced guess
//! - Command line front-end for training, checking and collecting data

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod source;
pub mod store;

pub mod prelude {
    pub use crate::analysis::extractor::{ExtractorKind, FeatureExtractor, FeatureSet};
    pub use crate::classifier::{Classification, Classifier, ClassifierConfig};
    pub use crate::config::Config;
    pub use crate::error::{IsItXError, Result};
    pub use crate::source::{DocumentSource, FetchError, FileSource};
    pub use crate::store::{CountStore, FileCountStore, MemoryCountStore, StoreConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Count storage for the classifier.
//!
//! The classifier's whole model is two tables of counters:
//!
//! - `feature_counts{feature, category, count}`, unique on (feature, category)
//! - `category_counts{category, count}`, unique on category
//!
//! [`CountStore`] abstracts over where those tables live, so the same
//! classifier code runs against an in-memory store in tests and a durable
//! store in production.
//!
//! # Storage Types
//!
//! ## MemoryCountStore
//! - Counters held in memory behind a read-write lock
//! - Increments of existing keys proceed concurrently
//!
//! ## FileCountStore
//! - Tables persisted as JSON files inside a directory
//! - Every increment is journaled before it is applied
//! - Tables are rewritten and the journal truncated on `sync`
//!
//! # Example
//!
//! ```
//! use isitx::store::{StoreConfig, StoreFactory};
//!
//! # fn main() -> isitx::error::Result<()> {
//! let store = StoreFactory::create(StoreConfig::Memory)?;
//! store.increment_feature("game", "sports")?;
//! store.increment_category("sports")?;
//!
//! assert_eq!(store.feature_count("game", "sports")?, 1.0);
//! assert_eq!(store.total_count()?, 1.0);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IsItXError, Result};

pub mod file;
pub mod memory;

pub use file::{FileCountStore, FileStoreConfig};
pub use memory::MemoryCountStore;

/// Key-value backend holding feature and category counts.
///
/// Implementations must not lose concurrent increments of the same key, and
/// `reset` must never be observed half-done. Every operation fails with
/// [`IsItXError::StoreUnavailable`] once the store is closed.
pub trait CountStore: Send + Sync + fmt::Debug {
    /// Add one to the count of `feature` in `category`, creating it at 1.
    fn increment_feature(&self, feature: &str, category: &str) -> Result<()>;

    /// Add one to the document count of `category`, creating it at 1.
    fn increment_category(&self, category: &str) -> Result<()>;

    /// Count of `feature` in `category`; 0.0 when absent.
    fn feature_count(&self, feature: &str, category: &str) -> Result<f64>;

    /// Document count of `category`; 0.0 when absent.
    fn category_count(&self, category: &str) -> Result<f64>;

    /// Sum of all category counts. Fails with `EmptyModel` when no category exists.
    fn total_count(&self) -> Result<f64>;

    /// Every category with at least one recorded document.
    fn categories(&self) -> Result<BTreeSet<String>>;

    /// Copy all category counts and the counts of the given features at one
    /// point in time.
    fn snapshot(&self, features: &[String]) -> Result<CountSnapshot>;

    /// Table sizes.
    fn stats(&self) -> Result<StoreStats>;

    /// Empty both tables.
    fn reset(&self) -> Result<()>;

    /// Make every applied increment durable. A no-op for volatile stores.
    fn sync(&self) -> Result<()>;

    /// Sync and close; later calls fail with `StoreUnavailable`.
    fn close(&self) -> Result<()>;

    /// Get the name of this store (for logging).
    fn name(&self) -> &'static str;
}

/// One row of the `feature_counts` table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureRow {
    pub feature: String,
    pub category: String,
    pub count: u64,
}

/// One row of the `category_counts` table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryRow {
    pub category: String,
    pub count: u64,
}

/// Table sizes reported by [`CountStore::stats`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of categories.
    pub categories: usize,
    /// Number of (feature, category) records.
    pub feature_records: usize,
    /// Number of distinct features across all categories.
    pub distinct_features: usize,
    /// Sum of all category counts.
    pub documents: u64,
}

/// Point-in-time copy of the counts one classification pass needs.
///
/// Holds every category count, and the per-category counts of a chosen set
/// of features. Features that were not requested read as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountSnapshot {
    categories: BTreeMap<String, u64>,
    features: HashMap<String, BTreeMap<String, u64>>,
}

impl CountSnapshot {
    pub fn new(
        categories: BTreeMap<String, u64>,
        features: HashMap<String, BTreeMap<String, u64>>,
    ) -> Self {
        CountSnapshot {
            categories,
            features,
        }
    }

    pub fn category_count(&self, category: &str) -> f64 {
        self.categories.get(category).copied().unwrap_or(0) as f64
    }

    pub fn feature_count(&self, feature: &str, category: &str) -> f64 {
        self.features
            .get(feature)
            .and_then(|per_category| per_category.get(category))
            .copied()
            .unwrap_or(0) as f64
    }

    /// Sum of a feature's counts over every category.
    pub fn feature_total(&self, feature: &str) -> f64 {
        self.features
            .get(feature)
            .map(|per_category| per_category.values().sum::<u64>())
            .unwrap_or(0) as f64
    }

    /// Sum of all category counts; `EmptyModel` when no category exists.
    pub fn total_count(&self) -> Result<f64> {
        if self.categories.is_empty() {
            return Err(IsItXError::EmptyModel);
        }
        Ok(self.categories.values().sum::<u64>() as f64)
    }

    /// Categories in name order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn category_len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Errors raised by the store backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store was closed.
    Closed,

    /// Another process holds the store's lock file.
    Locked(String),

    /// Reading or writing the backend failed.
    Io(String),

    /// A persisted table could not be decoded.
    CorruptTable(String),

    /// A journal record other than the last one could not be decoded.
    CorruptJournal(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Closed => write!(f, "Store is closed"),
            StoreError::Locked(path) => write!(
                f,
                "Store is locked by another process (remove {path} if that process is gone)"
            ),
            StoreError::Io(msg) => write!(f, "I/O error: {msg}"),
            StoreError::CorruptTable(msg) => write!(f, "Corrupt table: {msg}"),
            StoreError::CorruptJournal(msg) => write!(f, "Corrupt journal: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for IsItXError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Closed | StoreError::Locked(_) | StoreError::Io(_) => {
                IsItXError::store_unavailable(err.to_string())
            }
            StoreError::CorruptTable(_) | StoreError::CorruptJournal(_) => {
                IsItXError::storage(err.to_string())
            }
        }
    }
}

/// Selects and configures a store backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Volatile in-memory store
    #[default]
    Memory,

    /// Durable store in a directory
    File(FileStoreConfig),
}

/// A factory for creating count stores.
pub struct StoreFactory;

impl StoreFactory {
    /// Create (or open) the store described by `config`.
    pub fn create(config: StoreConfig) -> Result<Arc<dyn CountStore>> {
        match config {
            StoreConfig::Memory => Ok(Arc::new(MemoryCountStore::new())),
            StoreConfig::File(file_config) => Ok(Arc::new(FileCountStore::open(file_config)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CountSnapshot {
        let categories = BTreeMap::from([("finance".to_string(), 2), ("sports".to_string(), 3)]);
        let features = HashMap::from([(
            "game".to_string(),
            BTreeMap::from([("sports".to_string(), 2), ("finance".to_string(), 1)]),
        )]);
        CountSnapshot::new(categories, features)
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = snapshot();

        assert_eq!(snapshot.category_count("sports"), 3.0);
        assert_eq!(snapshot.category_count("cooking"), 0.0);
        assert_eq!(snapshot.feature_count("game", "sports"), 2.0);
        assert_eq!(snapshot.feature_count("game", "cooking"), 0.0);
        assert_eq!(snapshot.feature_count("stock", "finance"), 0.0);
        assert_eq!(snapshot.feature_total("game"), 3.0);
        assert_eq!(snapshot.total_count().unwrap(), 5.0);
        assert_eq!(snapshot.categories().collect::<Vec<_>>(), vec!["finance", "sports"]);
    }

    #[test]
    fn test_empty_snapshot_total_is_an_error() {
        let snapshot = CountSnapshot::default();

        assert!(snapshot.is_empty());
        assert!(snapshot.total_count().unwrap_err().is_empty_model());
    }

    #[test]
    fn test_store_error_display_and_conversion() {
        assert_eq!(StoreError::Closed.to_string(), "Store is closed");

        let err: IsItXError = StoreError::Closed.into();
        assert!(err.is_store_unavailable());

        let err: IsItXError = StoreError::CorruptTable("bad row".to_string()).into();
        assert!(matches!(err, IsItXError::Storage(_)));
    }

    #[test]
    fn test_store_config_serde() {
        let config: StoreConfig = serde_json::from_str(r#"{"type":"memory"}"#).unwrap();
        assert_eq!(config, StoreConfig::Memory);

        let config: StoreConfig =
            serde_json::from_str(r#"{"type":"file","path":"/tmp/model"}"#).unwrap();
        match config {
            StoreConfig::File(file_config) => {
                assert_eq!(file_config.path, std::path::PathBuf::from("/tmp/model"));
                assert!(!file_config.sync_writes);
            }
            _ => panic!("Expected File config"),
        }
    }

    #[test]
    fn test_factory_creates_memory_store() {
        let store = StoreFactory::create(StoreConfig::default()).unwrap();
        assert_eq!(store.name(), "memory");
        assert!(store.categories().unwrap().is_empty());
    }
}

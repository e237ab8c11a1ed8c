//! In-memory count store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{IsItXError, Result};
use crate::store::{CategoryRow, CountSnapshot, CountStore, FeatureRow, StoreError, StoreStats};

/// The two count tables. Counters are atomics so that existing keys can be
/// bumped while only a shared guard is held.
#[derive(Debug, Default)]
struct CountTables {
    /// feature -> category -> count
    features: HashMap<String, HashMap<String, AtomicU64>>,
    /// category -> document count
    categories: HashMap<String, AtomicU64>,
}

impl CountTables {
    fn feature_counter(&self, feature: &str, category: &str) -> Option<&AtomicU64> {
        self.features
            .get(feature)
            .and_then(|per_category| per_category.get(category))
    }

    fn read_counter(&self, counter: Option<&AtomicU64>) -> u64 {
        counter.map_or(0, |count| count.load(Ordering::SeqCst))
    }
}

/// A volatile count store.
///
/// Increments of keys that already exist take the shared guard and an atomic
/// add, so trainers touching different keys do not block each other. Only the
/// first increment of a key, and `reset`, take the exclusive guard.
///
/// Outside the crate the tables can only be emptied together:
///
/// ```compile_fail
/// let store = isitx::store::MemoryCountStore::new();
/// store.clear_features();
/// ```
#[derive(Debug, Default)]
pub struct MemoryCountStore {
    tables: RwLock<CountTables>,
    closed: AtomicBool,
}

impl MemoryCountStore {
    pub fn new() -> Self {
        MemoryCountStore::default()
    }

    /// Build a store holding the given table rows.
    pub fn from_rows(features: Vec<FeatureRow>, categories: Vec<CategoryRow>) -> Self {
        let store = MemoryCountStore::new();
        store.replace_rows(features, categories);
        store
    }

    /// Replace both tables with the given rows.
    fn replace_rows(&self, features: Vec<FeatureRow>, categories: Vec<CategoryRow>) {
        let mut tables = CountTables::default();
        for row in features {
            tables
                .features
                .entry(row.feature)
                .or_default()
                .insert(row.category, AtomicU64::new(row.count));
        }
        for row in categories {
            tables
                .categories
                .insert(row.category, AtomicU64::new(row.count));
        }
        *self.tables.write() = tables;
    }

    /// Empty only the feature table. Journal replay is the only caller; a
    /// reset must clear both tables at once.
    pub(crate) fn clear_features(&self) {
        self.tables.write().features.clear();
    }

    /// Empty only the category table.
    pub(crate) fn clear_categories(&self) {
        self.tables.write().categories.clear();
    }

    /// Copy both tables as sorted rows.
    pub fn rows(&self) -> (Vec<FeatureRow>, Vec<CategoryRow>) {
        let tables = self.tables.read();

        let mut features: Vec<FeatureRow> = tables
            .features
            .iter()
            .flat_map(|(feature, per_category)| {
                per_category.iter().map(move |(category, count)| FeatureRow {
                    feature: feature.clone(),
                    category: category.clone(),
                    count: count.load(Ordering::SeqCst),
                })
            })
            .collect();
        features.sort();

        let mut categories: Vec<CategoryRow> = tables
            .categories
            .iter()
            .map(|(category, count)| CategoryRow {
                category: category.clone(),
                count: count.load(Ordering::SeqCst),
            })
            .collect();
        categories.sort();

        (features, categories)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed.into())
        } else {
            Ok(())
        }
    }
}

impl CountStore for MemoryCountStore {
    fn increment_feature(&self, feature: &str, category: &str) -> Result<()> {
        self.check_closed()?;

        {
            let tables = self.tables.read();
            if let Some(counter) = tables.feature_counter(feature, category) {
                counter.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }
        }

        // First sighting of this key; another writer may have created it
        // between the two guards, which the entry API absorbs.
        let mut tables = self.tables.write();
        tables
            .features
            .entry(feature.to_string())
            .or_default()
            .entry(category.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn increment_category(&self, category: &str) -> Result<()> {
        self.check_closed()?;

        {
            let tables = self.tables.read();
            if let Some(counter) = tables.categories.get(category) {
                counter.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }
        }

        let mut tables = self.tables.write();
        tables
            .categories
            .entry(category.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn feature_count(&self, feature: &str, category: &str) -> Result<f64> {
        self.check_closed()?;
        let tables = self.tables.read();
        Ok(tables.read_counter(tables.feature_counter(feature, category)) as f64)
    }

    fn category_count(&self, category: &str) -> Result<f64> {
        self.check_closed()?;
        let tables = self.tables.read();
        Ok(tables.read_counter(tables.categories.get(category)) as f64)
    }

    fn total_count(&self) -> Result<f64> {
        self.check_closed()?;
        let tables = self.tables.read();
        if tables.categories.is_empty() {
            return Err(IsItXError::EmptyModel);
        }
        let total: u64 = tables
            .categories
            .values()
            .map(|count| count.load(Ordering::SeqCst))
            .sum();
        Ok(total as f64)
    }

    fn categories(&self) -> Result<BTreeSet<String>> {
        self.check_closed()?;
        Ok(self.tables.read().categories.keys().cloned().collect())
    }

    fn snapshot(&self, features: &[String]) -> Result<CountSnapshot> {
        self.check_closed()?;
        let tables = self.tables.read();

        let categories: BTreeMap<String, u64> = tables
            .categories
            .iter()
            .map(|(category, count)| (category.clone(), count.load(Ordering::SeqCst)))
            .collect();

        let mut feature_counts = HashMap::with_capacity(features.len());
        for feature in features {
            if feature_counts.contains_key(feature) {
                continue;
            }
            if let Some(per_category) = tables.features.get(feature) {
                let counts: BTreeMap<String, u64> = per_category
                    .iter()
                    .map(|(category, count)| (category.clone(), count.load(Ordering::SeqCst)))
                    .collect();
                feature_counts.insert(feature.clone(), counts);
            }
        }

        Ok(CountSnapshot::new(categories, feature_counts))
    }

    fn stats(&self) -> Result<StoreStats> {
        self.check_closed()?;
        let tables = self.tables.read();

        Ok(StoreStats {
            categories: tables.categories.len(),
            feature_records: tables.features.values().map(HashMap::len).sum(),
            distinct_features: tables.features.len(),
            documents: tables
                .categories
                .values()
                .map(|count| count.load(Ordering::SeqCst))
                .sum(),
        })
    }

    fn reset(&self) -> Result<()> {
        self.check_closed()?;
        *self.tables.write() = CountTables::default();
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.check_closed()
    }

    fn close(&self) -> Result<()> {
        self.mark_closed();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

//! Incremental naive-Bayes text classifier.
//!
//! A [`Classifier`] ties a [`FeatureExtractor`] to a [`CountStore`]. Training
//! records which features were seen in which category; classification scores
//! every known category for a document and applies a margin test before
//! committing to the best one.
//!
//! Scores are natural-log values: the log of the category prior plus the sum
//! of the logs of the smoothed feature probabilities. They rank categories
//! but are not calibrated probabilities, and thresholds are tuned against
//! this scale.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use isitx::analysis::extractor::ExtractorKind;
//! use isitx::classifier::{Classification, Classifier};
//! use isitx::store::MemoryCountStore;
//!
//! # fn main() -> isitx::error::Result<()> {
//! let classifier = Classifier::new(
//!     ExtractorKind::Linguistic.build()?,
//!     Arc::new(MemoryCountStore::new()),
//! );
//!
//! classifier.train("win the game", "sports")?;
//! classifier.train("team scored", "sports")?;
//! classifier.train("stock market rose", "finance")?;
//! classifier.train("earnings report", "finance")?;
//!
//! assert_eq!(
//!     classifier.classify("the team won the game")?,
//!     Classification::Category("sports".to_string())
//! );
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::{FeatureExtractor, FeatureSet};
use crate::error::{IsItXError, Result};
use crate::store::{CountStore, StoreStats};

pub mod estimate;

/// Threshold of a category that has none configured.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// How many observations the assumed probability is worth.
    pub weight: f64,

    /// Probability assumed for a feature with no evidence.
    pub assumed_probability: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            weight: 1.0,
            assumed_probability: 0.5,
        }
    }
}

fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(IsItXError::invalid_input(format!(
            "weight must be finite and positive, got {weight}"
        )));
    }
    Ok(())
}

impl ClassifierConfig {
    /// Check that both parameters keep every smoothed probability in (0, 1].
    ///
    /// An assumed probability of 0 is rejected here even though the smoothing
    /// formula is defined for it: an unseen feature would score `ln(0)` and
    /// veto every category.
    pub fn validate(&self) -> Result<()> {
        validate_weight(self.weight)?;
        if !(self.assumed_probability > 0.0 && self.assumed_probability <= 1.0) {
            return Err(IsItXError::invalid_input(format!(
                "assumed probability must be in (0, 1], got {}",
                self.assumed_probability
            )));
        }
        Ok(())
    }
}

/// Outcome of a classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// The document belongs to this category.
    Category(String),

    /// No category beat its rivals by the required margin.
    Undetermined,
}

impl Classification {
    /// The chosen category, if any.
    pub fn category(&self) -> Option<&str> {
        match self {
            Classification::Category(category) => Some(category),
            Classification::Undetermined => None,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(self, Classification::Undetermined)
    }

    /// Whether the document was classified as `category`.
    pub fn is(&self, category: &str) -> bool {
        self.category() == Some(category)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Category(category) => write!(f, "{category}"),
            Classification::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Log score of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

/// A decision together with the scores it was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classification: Classification,

    /// Every category, highest score first.
    pub scores: Vec<CategoryScore>,

    /// Number of distinct features extracted from the document.
    pub features: usize,
}

/// Naive-Bayes classifier over a pluggable extractor and count store.
///
/// All methods take `&self`; a classifier can be shared between threads
/// behind an `Arc`.
#[derive(Debug)]
pub struct Classifier {
    extractor: Arc<dyn FeatureExtractor>,
    store: Arc<dyn CountStore>,
    config: ClassifierConfig,
    /// Per-category margins. Its write guard is also held across `reset`, so
    /// training and classification never see a store reset without the
    /// thresholds, or the other way round.
    thresholds: RwLock<HashMap<String, f64>>,
}

impl Classifier {
    /// Create a classifier with default smoothing.
    pub fn new(extractor: Arc<dyn FeatureExtractor>, store: Arc<dyn CountStore>) -> Self {
        Classifier {
            extractor,
            store,
            config: ClassifierConfig::default(),
            thresholds: RwLock::new(HashMap::new()),
        }
    }

    /// Create a classifier with the given smoothing parameters.
    pub fn with_config(
        extractor: Arc<dyn FeatureExtractor>,
        store: Arc<dyn CountStore>,
        config: ClassifierConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Classifier {
            config,
            ..Classifier::new(extractor, store)
        })
    }

    pub fn extractor(&self) -> &Arc<dyn FeatureExtractor> {
        &self.extractor
    }

    pub fn store(&self) -> &Arc<dyn CountStore> {
        &self.store
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Extract the features of a document with this classifier's extractor.
    pub fn features(&self, document: &str) -> Result<FeatureSet> {
        self.extractor.extract(document)
    }

    /// Record one example document of `category`.
    ///
    /// Each distinct feature is counted once however often it repeats, then
    /// the category's document count goes up by exactly one.
    pub fn train(&self, document: &str, category: &str) -> Result<()> {
        if category.is_empty() {
            return Err(IsItXError::invalid_input("category must not be empty"));
        }

        let features = self.extractor.extract(document)?;
        let _lifecycle = self.thresholds.read();

        for feature in features.distinct() {
            self.store.increment_feature(feature, category)?;
        }
        self.store.increment_category(category)?;

        debug!("Trained {category} on {} features", features.len());
        Ok(())
    }

    /// Train one document per non-empty line. Returns the number trained.
    pub fn train_from_file<I, S>(&self, lines: I, category: &str) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trained = 0;
        for line in lines {
            let document = line.as_ref().trim_end_matches(['\n', '\r']);
            if document.is_empty() {
                continue;
            }
            self.train(document, category)?;
            trained += 1;
        }

        info!("Trained {trained} documents as {category}");
        Ok(trained)
    }

    /// Train from a line-delimited UTF-8 file.
    pub fn train_from_path<P: AsRef<Path>>(&self, path: P, category: &str) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!("Training {category} from {}", path.as_ref().display());
        self.train_from_file(content.lines(), category)
    }

    /// Train many documents of one category in parallel.
    pub fn train_batch<S>(&self, documents: &[S], category: &str) -> Result<usize>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .try_for_each(|document| self.train(document.as_ref(), category))?;

        info!("Trained batch of {} documents as {category}", documents.len());
        Ok(documents.len())
    }

    /// `feature_count / category_count`, 0.0 for an empty category.
    pub fn feature_probability(&self, feature: &str, category: &str) -> Result<f64> {
        let snapshot = self.store.snapshot(&[feature.to_string()])?;
        Ok(estimate::feature_probability(&snapshot, feature, category))
    }

    /// Smoothed feature probability with the configured weight and prior.
    pub fn weighted_probability(&self, feature: &str, category: &str) -> Result<f64> {
        self.weighted_probability_with(
            feature,
            category,
            self.config.weight,
            self.config.assumed_probability,
        )
    }

    /// Smoothed feature probability with explicit parameters.
    ///
    /// `weight` must be positive and `assumed_probability` in [0, 1]. Unlike
    /// the configured parameters, an assumed probability of 0 is allowed since
    /// nothing here takes its logarithm.
    pub fn weighted_probability_with(
        &self,
        feature: &str,
        category: &str,
        weight: f64,
        assumed_probability: f64,
    ) -> Result<f64> {
        validate_weight(weight)?;
        if !(0.0..=1.0).contains(&assumed_probability) {
            return Err(IsItXError::invalid_input(format!(
                "assumed probability must be in [0, 1], got {assumed_probability}"
            )));
        }

        let snapshot = self.store.snapshot(&[feature.to_string()])?;
        Ok(estimate::weighted_probability(
            &snapshot,
            feature,
            category,
            weight,
            assumed_probability,
        ))
    }

    /// Sum of the log smoothed probabilities of the document's distinct
    /// features in `category`.
    pub fn document_probability(&self, document: &str, category: &str) -> Result<f64> {
        let features = self.extractor.extract(document)?;
        let snapshot = self.store.snapshot(&features.to_features())?;
        Ok(estimate::document_log_score(
            &snapshot,
            &features,
            category,
            self.config.weight,
            self.config.assumed_probability,
        ))
    }

    /// Log score of `document` in `category`: log prior plus
    /// [`document_probability`](Self::document_probability).
    ///
    /// An unknown category scores negative infinity. Fails with `EmptyModel`
    /// when nothing has been trained.
    pub fn probability(&self, document: &str, category: &str) -> Result<f64> {
        let features = self.extractor.extract(document)?;
        let snapshot = self.store.snapshot(&features.to_features())?;

        let prior = estimate::log_prior(&snapshot, category)?;
        Ok(prior
            + estimate::document_log_score(
                &snapshot,
                &features,
                category,
                self.config.weight,
                self.config.assumed_probability,
            ))
    }

    /// Classify a document.
    pub fn classify(&self, document: &str) -> Result<Classification> {
        Ok(self.classify_with_scores(document)?.classification)
    }

    /// Classify a document and report every category's score.
    ///
    /// One snapshot of the counts is used for the whole pass.
    pub fn classify_with_scores(&self, document: &str) -> Result<ClassificationReport> {
        let features = self.extractor.extract(document)?;

        let (classification, mut scores) = {
            let thresholds = self.thresholds.read();
            let snapshot = self.store.snapshot(&features.to_features())?;
            if snapshot.is_empty() {
                return Err(IsItXError::EmptyModel);
            }

            let scores = snapshot
                .categories()
                .map(|category| {
                    let score = estimate::log_prior(&snapshot, category)?
                        + estimate::document_log_score(
                            &snapshot,
                            &features,
                            category,
                            self.config.weight,
                            self.config.assumed_probability,
                        );
                    Ok((category.to_string(), score))
                })
                .collect::<Result<Vec<_>>>()?;

            let classification = estimate::decide(&scores, |category| {
                thresholds
                    .get(category)
                    .copied()
                    .unwrap_or(DEFAULT_THRESHOLD)
            })
            .ok_or(IsItXError::EmptyModel)?;

            (classification, scores)
        };

        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(
            "Classified document with {} features as {classification}",
            features.len()
        );

        Ok(ClassificationReport {
            classification,
            scores: scores
                .into_iter()
                .map(|(category, score)| CategoryScore { category, score })
                .collect(),
            features: features.len(),
        })
    }

    /// Set the margin `category` must win by. Must be finite and positive.
    pub fn set_threshold(&self, category: &str, value: f64) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(IsItXError::invalid_input(format!(
                "threshold for {category} must be finite and positive, got {value}"
            )));
        }
        self.thresholds.write().insert(category.to_string(), value);
        Ok(())
    }

    /// Margin of `category`; [`DEFAULT_THRESHOLD`] when unset.
    pub fn get_threshold(&self, category: &str) -> f64 {
        self.thresholds
            .read()
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Every explicitly set threshold.
    pub fn thresholds(&self) -> HashMap<String, f64> {
        self.thresholds.read().clone()
    }

    /// Forget all counts and thresholds.
    pub fn reset(&self) -> Result<()> {
        let mut thresholds = self.thresholds.write();
        self.store.reset()?;
        thresholds.clear();

        info!("Reset classifier model");
        Ok(())
    }

    pub fn categories(&self) -> Result<BTreeSet<String>> {
        self.store.categories()
    }

    pub fn feature_count(&self, feature: &str, category: &str) -> Result<f64> {
        self.store.feature_count(feature, category)
    }

    pub fn category_count(&self, category: &str) -> Result<f64> {
        self.store.category_count(category)
    }

    pub fn total_count(&self) -> Result<f64> {
        self.store.total_count()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    /// Make all training durable.
    pub fn sync(&self) -> Result<()> {
        self.store.sync()
    }
}

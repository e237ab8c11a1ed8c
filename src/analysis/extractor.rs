//! Feature extraction: raw document in, multiset of features out.
//!
//! Two interchangeable strategies are provided:
//!
//! - [`linguistic::LinguisticExtractor`] - strips HTML entities and
//!   punctuation, drops stop words and short tokens, lemmatizes, and counts
//!   repeated features
//! - [`simple::SimpleExtractor`] - splits on non-word runs, keeps tokens of
//!   3 to 19 characters, and records presence only
//!
//! Both are pure functions of their input.
//!
//! # Examples
//!
//! ```
//! use isitx::analysis::extractor::{ExtractorKind, FeatureExtractor};
//!
//! let extractor = ExtractorKind::Linguistic.build().unwrap();
//! let features = extractor.extract("The games, the GAME!").unwrap();
//!
//! assert_eq!(features.occurrences("game"), 2);
//! assert!(!features.contains("the"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis::pipeline::AnalysisPipeline;
use crate::error::Result;

pub mod linguistic;
pub mod simple;

pub use linguistic::LinguisticExtractor;
pub use simple::SimpleExtractor;

/// Trait for turning a document into classification features.
pub trait FeatureExtractor: Send + Sync + fmt::Debug {
    /// Extract the features of a document.
    fn extract(&self, document: &str) -> Result<FeatureSet>;

    /// Get the name of this extractor (for logging and configuration).
    fn name(&self) -> &'static str;
}

/// A multiset of features, iterated in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    counts: BTreeMap<String, u32>,
}

impl FeatureSet {
    pub fn new() -> Self {
        FeatureSet::default()
    }

    /// Record one more occurrence of a feature.
    pub fn insert<S: Into<String>>(&mut self, feature: S) {
        *self.counts.entry(feature.into()).or_insert(0) += 1;
    }

    /// Record that a feature is present, without counting repeats.
    pub fn mark_present<S: Into<String>>(&mut self, feature: S) {
        self.counts.insert(feature.into(), 1);
    }

    /// Number of times a feature was recorded (0 when absent).
    pub fn occurrences(&self, feature: &str) -> u32 {
        self.counts.get(feature).copied().unwrap_or(0)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.counts.contains_key(feature)
    }

    /// Each feature once, in sorted order.
    pub fn distinct(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Number of distinct features.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Sum of occurrences over all features.
    pub fn total_occurrences(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Distinct features as owned strings.
    pub fn to_features(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(feature, &count)| (feature.as_str(), count))
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for feature in iter {
            set.insert(feature);
        }
        set
    }
}

/// Selects one of the built-in extraction strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Entity/punctuation stripping, stop words, lemmas, counted repeats
    #[default]
    Linguistic,
    /// Non-word splitting, length window, presence only
    Simple,
}

impl ExtractorKind {
    /// Build the extractor for this strategy.
    pub fn build(self) -> Result<Arc<dyn FeatureExtractor>> {
        Ok(match self {
            ExtractorKind::Linguistic => Arc::new(LinguisticExtractor::new()?),
            ExtractorKind::Simple => Arc::new(SimpleExtractor::new()?),
        })
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::Linguistic => write!(f, "linguistic"),
            ExtractorKind::Simple => write!(f, "simple"),
        }
    }
}

/// Run a pipeline and hand each surviving token text to `record`.
fn collect_features<F>(
    pipeline: &AnalysisPipeline,
    document: &str,
    mut record: F,
) -> Result<FeatureSet>
where
    F: FnMut(&mut FeatureSet, String),
{
    let mut features = FeatureSet::new();
    for token in pipeline.analyze(document)? {
        if !token.is_empty() {
            record(&mut features, token.text);
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_set_multiset_semantics() {
        let mut set = FeatureSet::new();
        set.insert("game");
        set.insert("game");
        set.insert("team");

        assert_eq!(set.len(), 2);
        assert_eq!(set.total_occurrences(), 3);
        assert_eq!(set.occurrences("game"), 2);
        assert_eq!(set.occurrences("missing"), 0);
        assert_eq!(set.distinct().collect::<Vec<_>>(), vec!["game", "team"]);
    }

    #[test]
    fn test_mark_present_collapses_repeats() {
        let mut set = FeatureSet::new();
        set.mark_present("game");
        set.mark_present("game");

        assert_eq!(set.occurrences("game"), 1);
        assert_eq!(set.total_occurrences(), 1);
    }

    #[test]
    fn test_feature_set_from_iter() {
        let set: FeatureSet = vec!["b", "a", "b"].into_iter().collect();
        assert_eq!(set.to_features(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_extractor_kind_build() {
        assert_eq!(ExtractorKind::Linguistic.build().unwrap().name(), "linguistic");
        assert_eq!(ExtractorKind::Simple.build().unwrap().name(), "simple");
        assert_eq!(ExtractorKind::default(), ExtractorKind::Linguistic);
        assert_eq!(ExtractorKind::Simple.to_string(), "simple");
    }

    #[test]
    fn test_extractor_kind_serde() {
        let kind: ExtractorKind = serde_json::from_str("\"simple\"").unwrap();
        assert_eq!(kind, ExtractorKind::Simple);
        assert_eq!(
            serde_json::to_string(&ExtractorKind::Linguistic).unwrap(),
            "\"linguistic\""
        );
    }
}

//! Linguistic feature extractor.

use std::sync::Arc;

use super::{FeatureExtractor, FeatureSet, collect_features};
use crate::analysis::char_filter::PatternReplaceCharFilter;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::analysis::token_filter::{LemmaFilter, LengthFilter, LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::WhitespaceTokenizer;
use crate::error::Result;

/// Tokens must be longer than two characters to become features.
pub const MIN_FEATURE_CHARS: usize = 3;

/// Extractor that blanks HTML entities and punctuation, lowercases, drops
/// English stop words and tokens of two characters or fewer, and reduces
/// each survivor to its lemma. Repeated features are counted.
#[derive(Clone, Debug)]
pub struct LinguisticExtractor {
    pipeline: AnalysisPipeline,
}

impl LinguisticExtractor {
    /// Create the extractor with the default English stop words.
    pub fn new() -> Result<Self> {
        Self::with_stop_filter(StopFilter::new())
    }

    /// Create the extractor with a custom stop word filter.
    pub fn with_stop_filter(stop_filter: StopFilter) -> Result<Self> {
        let pipeline = AnalysisPipeline::new(Arc::new(WhitespaceTokenizer::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::html_entities()?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::non_alphanumeric()?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::repeated_spaces()?))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(stop_filter))
            .add_filter(Arc::new(LengthFilter::at_least(MIN_FEATURE_CHARS)))
            .add_filter(Arc::new(LemmaFilter::new()));

        Ok(LinguisticExtractor { pipeline })
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }
}

impl FeatureExtractor for LinguisticExtractor {
    fn extract(&self, document: &str) -> Result<FeatureSet> {
        collect_features(&self.pipeline, document, |features, text| {
            features.insert(text)
        })
    }

    fn name(&self) -> &'static str {
        "linguistic"
    }
}

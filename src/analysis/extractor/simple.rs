//! Simple feature extractor.

use std::sync::Arc;

use super::{FeatureExtractor, FeatureSet, collect_features};
use crate::analysis::pipeline::AnalysisPipeline;
use crate::analysis::token_filter::{LengthFilter, LowercaseFilter};
use crate::analysis::tokenizer::RegexTokenizer;
use crate::error::Result;

/// Shortest token kept by the simple extractor.
pub const MIN_TOKEN_CHARS: usize = 3;
/// Longest token kept by the simple extractor.
pub const MAX_TOKEN_CHARS: usize = 19;

/// Extractor that lowercases, splits on non-word runs and keeps tokens of
/// 3 to 19 characters. Each feature is recorded once regardless of repeats.
#[derive(Clone, Debug)]
pub struct SimpleExtractor {
    pipeline: AnalysisPipeline,
}

impl SimpleExtractor {
    pub fn new() -> Result<Self> {
        let pipeline = AnalysisPipeline::new(Arc::new(RegexTokenizer::non_word_splitter()?))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(LengthFilter::new(MIN_TOKEN_CHARS, MAX_TOKEN_CHARS)));

        Ok(SimpleExtractor { pipeline })
    }
}

impl FeatureExtractor for SimpleExtractor {
    fn extract(&self, document: &str) -> Result<FeatureSet> {
        collect_features(&self.pipeline, document, |features, text| {
            features.mark_present(text)
        })
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}

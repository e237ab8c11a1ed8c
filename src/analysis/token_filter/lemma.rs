//! Lemmatizing token filter.
//!
//! Reduces inflected nouns to their dictionary form ("games" → "game",
//! "children" → "child") so that singular and plural occurrences count as the
//! same feature. Only noun morphology is applied; verbs and adjectives pass
//! through unchanged.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for lemmatization algorithms.
pub trait Lemmatizer: Send + Sync {
    /// Reduce a lowercase word to its lemma.
    fn lemmatize(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Irregular plurals that suffix rules cannot recover.
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("pies", "pie"),
    ("ties", "tie"),
    ("lies", "lie"),
];

/// Words ending in "s" that are already lemmas.
const INVARIANT_NOUNS: &[&str] = &[
    "news", "series", "species", "physics", "economics", "politics", "mathematics", "athletics",
    "gymnastics", "lens", "chaos", "always", "perhaps", "afterwards", "towards", "whereas",
    "sometimes", "has", "was", "yes", "this", "thus", "plus", "gas", "bias", "atlas", "canvas",
];

static IRREGULAR_NOUN_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| IRREGULAR_NOUNS.iter().copied().collect());

/// Suffix rewrites, tried in order; the first applicable rule wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("zzes", "zz"),
    ("xes", "x"),
    ("ies", "y"),
];

/// Shortest stem a suffix rule may leave behind.
const MIN_STEM_CHARS: usize = 2;

/// Rule-based English noun lemmatizer.
#[derive(Debug, Clone, Default)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    pub fn new() -> Self {
        EnglishLemmatizer
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = IRREGULAR_NOUN_MAP.get(word) {
            return (*lemma).to_string();
        }
        if INVARIANT_NOUNS.contains(&word) || !word.is_ascii() {
            return word.to_string();
        }

        for (suffix, replacement) in SUFFIX_RULES {
            if let Some(stem) = word.strip_suffix(suffix)
                && stem.len() >= MIN_STEM_CHARS
            {
                return format!("{stem}{replacement}");
            }
        }

        // Plain plural "s", but not "ss" (class), "us" (status) or "is" (basis).
        if let Some(stem) = word.strip_suffix('s') {
            let keeps_s = stem.ends_with('s') || stem.ends_with('u') || stem.ends_with('i');
            if !keeps_s && stem.len() > MIN_STEM_CHARS {
                return stem.to_string();
            }
        }

        word.to_string()
    }

    fn name(&self) -> &'static str {
        "english"
    }
}

/// Filter that replaces each token with its lemma.
#[derive(Clone)]
pub struct LemmaFilter {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl std::fmt::Debug for LemmaFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LemmaFilter")
            .field("lemmatizer", &self.lemmatizer.name())
            .finish()
    }
}

impl LemmaFilter {
    /// Create a lemma filter with the English noun lemmatizer.
    pub fn new() -> Self {
        Self::with_lemmatizer(Arc::new(EnglishLemmatizer::new()))
    }

    /// Create a lemma filter with a custom lemmatizer.
    pub fn with_lemmatizer(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        LemmaFilter { lemmatizer }
    }
}

impl Default for LemmaFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for LemmaFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                let lemma = self.lemmatizer.lemmatize(&token.text);
                token.with_text(lemma)
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}

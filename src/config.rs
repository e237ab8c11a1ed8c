//! Configuration.
//!
//! A [`Config`] selects the feature extractor and count store, sets the
//! smoothing parameters and seeds per-category thresholds. It is usually
//! loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration.
//!
//! ```json
//! {
//!   "extractor": "linguistic",
//!   "store": { "type": "file", "path": "model", "sync_writes": false },
//!   "classifier": { "weight": 1.0, "assumed_probability": 0.5 },
//!   "thresholds": { "sports": 2.0 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::ExtractorKind;
use crate::classifier::{Classifier, ClassifierConfig};
use crate::error::{IsItXError, Result};
use crate::store::{StoreConfig, StoreFactory};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feature extraction strategy.
    pub extractor: ExtractorKind,

    /// Count store backend.
    pub store: StoreConfig,

    /// Smoothing parameters.
    pub classifier: ClassifierConfig,

    /// Initial per-category thresholds.
    pub thresholds: BTreeMap<String, f64>,
}

impl Config {
    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            IsItXError::config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config = Self::from_json(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| IsItXError::config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.classifier
            .validate()
            .map_err(|e| IsItXError::config(e.to_string()))?;

        for (category, threshold) in &self.thresholds {
            if !threshold.is_finite() || *threshold <= 0.0 {
                return Err(IsItXError::config(format!(
                    "Threshold for {category} must be finite and positive, got {threshold}"
                )));
            }
        }

        if let StoreConfig::File(file_config) = &self.store
            && file_config.path.as_os_str().is_empty()
        {
            return Err(IsItXError::config("File store path must not be empty"));
        }

        Ok(())
    }

    /// Build a classifier with this configuration's extractor, store,
    /// smoothing and thresholds.
    pub fn build_classifier(&self) -> Result<Classifier> {
        self.validate()?;

        let extractor = self.extractor.build()?;
        let store = StoreFactory::create(self.store.clone())?;
        let classifier = Classifier::with_config(extractor, store, self.classifier)?;

        for (category, threshold) in &self.thresholds {
            classifier.set_threshold(category, *threshold)?;
        }
        Ok(classifier)
    }
}

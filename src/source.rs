//! Document acquisition.
//!
//! A [`DocumentSource`] turns a location into the text of one document.
//! Failures are reported as [`FetchError`], which callers treat as "skip this
//! input" rather than as a reason to stop.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::error::{IsItXError, Result};

/// Why a document could not be fetched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing exists at the location.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The location exists but could not be read.
    #[error("Unreadable: {location}: {reason}")]
    Unreadable { location: String, reason: String },

    /// The content is not a text document.
    #[error("Not a text document: {0}")]
    NotText(String),

    /// The location string itself is malformed.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Fetches the raw text of a document.
pub trait DocumentSource: Send + Sync {
    /// Fetch the document at `location` as a single normalized string.
    fn fetch(&self, location: &str) -> std::result::Result<String, FetchError>;

    /// Get the name of this source (for logging).
    fn name(&self) -> &'static str;
}

/// Reads documents from local files.
///
/// Relative locations resolve against the optional root directory. Line
/// breaks are folded into spaces so that the content is one document.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        FileSource::default()
    }

    /// Resolve relative locations against `root`.
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        FileSource {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Fold every line break into a single space.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

impl DocumentSource for FileSource {
    fn fetch(&self, location: &str) -> std::result::Result<String, FetchError> {
        if location.trim().is_empty() {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }

        let path = self.resolve(location);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(location.to_string()),
            _ => FetchError::Unreadable {
                location: location.to_string(),
                reason: e.to_string(),
            },
        })?;

        let text = String::from_utf8(bytes).map_err(|_| FetchError::NotText(location.to_string()))?;
        debug!("Fetched {} bytes from {}", text.len(), path.display());
        Ok(normalize_newlines(&text))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Outcome of [`collect_training_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// File the documents were appended to.
    pub output: PathBuf,
    /// Number of documents written.
    pub collected: usize,
    /// Locations that could not be fetched.
    pub skipped: Vec<String>,
}

/// Fetch every location and append the documents, one per line, to
/// `data_dir/<label>`.
///
/// Failed fetches and empty documents are skipped with a warning. The output
/// file is a valid input for `Classifier::train_from_path`.
pub fn collect_training_data<I, S>(
    source: &dyn DocumentSource,
    locations: I,
    label: &str,
    data_dir: &Path,
) -> Result<CollectionSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".." {
        return Err(IsItXError::invalid_input(format!(
            "label must be a plain file name, got {label:?}"
        )));
    }

    fs::create_dir_all(data_dir)?;
    let output = data_dir.join(label);
    let file = OpenOptions::new().create(true).append(true).open(&output)?;
    let mut writer = BufWriter::new(file);

    let mut summary = CollectionSummary {
        output: output.clone(),
        ..CollectionSummary::default()
    };

    for location in locations {
        let location = location.as_ref().trim();
        if location.is_empty() {
            continue;
        }

        match source.fetch(location) {
            Ok(document) if document.trim().is_empty() => {
                warn!("Skipping {location}: empty document");
                summary.skipped.push(location.to_string());
            }
            Ok(document) => {
                writeln!(writer, "{}", document.trim())?;
                summary.collected += 1;
            }
            Err(e) => {
                warn!("Skipping {location}: {e}");
                summary.skipped.push(location.to_string());
            }
        }
    }
    writer.flush()?;

    info!(
        "Collected {} documents into {} ({} skipped)",
        summary.collected,
        output.display(),
        summary.skipped.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_file_source_folds_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.txt"), "win the game\nteam\r\nscored").unwrap();

        let source = FileSource::with_root(dir.path());
        assert_eq!(source.fetch("page.txt").unwrap(), "win the game team scored");
    }

    #[test]
    fn test_file_source_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("binary"), [0xff, 0xfe, 0x00]).unwrap();
        let source = FileSource::with_root(dir.path());

        assert_eq!(
            source.fetch("missing.txt").unwrap_err(),
            FetchError::NotFound("missing.txt".to_string())
        );
        assert_eq!(
            source.fetch("binary").unwrap_err(),
            FetchError::NotText("binary".to_string())
        );
        assert!(matches!(
            source.fetch("  ").unwrap_err(),
            FetchError::InvalidLocation(_)
        ));
    }

    #[test]
    fn test_collect_training_data_appends_and_skips() {
        let pages = TempDir::new().unwrap();
        fs::write(pages.path().join("a.txt"), "win the game\nagain").unwrap();
        fs::write(pages.path().join("b.txt"), "team scored").unwrap();
        fs::write(pages.path().join("empty.txt"), "\n").unwrap();
        let data = TempDir::new().unwrap();
        let source = FileSource::with_root(pages.path());

        let summary = collect_training_data(
            &source,
            ["a.txt", "missing.txt", "", "b.txt", "empty.txt"],
            "sports",
            data.path(),
        )
        .unwrap();
        assert_eq!(summary.collected, 2);
        assert_eq!(summary.skipped, vec!["missing.txt", "empty.txt"]);

        collect_training_data(&source, ["b.txt"], "sports", data.path()).unwrap();
        let content = fs::read_to_string(data.path().join("sports")).unwrap();
        assert_eq!(content, "win the game again\nteam scored\nteam scored\n");
    }

    #[test]
    fn test_collect_rejects_path_like_labels() {
        let data = TempDir::new().unwrap();
        let source = FileSource::new();

        for label in ["", "..", "a/b"] {
            assert!(collect_training_data(&source, ["x"], label, data.path()).is_err());
        }
    }
}

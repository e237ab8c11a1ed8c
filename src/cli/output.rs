//! Output formatting for CLI commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::classifier::{CategoryScore, Classification, ClassificationReport};
use crate::cli::args::{IsItXArgs, OutputFormat};
use crate::error::Result;
use crate::source::CollectionSummary;
use crate::store::StoreStats;

/// Rendering of a command result for people.
pub trait HumanOutput {
    fn human_lines(&self, args: &IsItXArgs) -> Vec<String>;
}

/// Result structure for training.
#[derive(Debug, Serialize)]
pub struct TrainResult {
    pub category: String,
    pub documents: usize,
    pub files: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// Result structure for classification.
#[derive(Debug, Serialize)]
pub struct ClassifyResult {
    pub classification: Classification,
    pub features: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<CategoryScore>>,
}

impl ClassifyResult {
    pub fn from_report(report: ClassificationReport, with_scores: bool) -> Self {
        ClassifyResult {
            classification: report.classification,
            features: report.features,
            scores: with_scores.then_some(report.scores),
        }
    }
}

/// Result structure for a check against a target category.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub location: String,
    pub target: String,
    pub matches: bool,
    pub classification: Classification,
}

/// Category with its document count.
#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub category: String,
    pub documents: u64,
}

/// Model statistics.
#[derive(Debug, Serialize)]
pub struct ModelStats {
    pub store: String,
    pub extractor: String,
    #[serde(flatten)]
    pub stats: StoreStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<Vec<CategoryEntry>>,
}

/// Effective thresholds.
#[derive(Debug, Serialize)]
pub struct ThresholdList {
    pub default: f64,
    pub thresholds: BTreeMap<String, f64>,
}

/// Result structure for a reset.
#[derive(Debug, Serialize)]
pub struct ResetResult {
    pub store: String,
    pub reset: bool,
}

/// Extracted features of a document.
#[derive(Debug, Serialize)]
pub struct FeatureList {
    pub extractor: String,
    pub features: BTreeMap<String, u32>,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &IsItXArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &IsItXArgs) -> Result<()> {
    if args.verbosity() > 1 && !message.is_empty() {
        println!("{message}");
        println!();
    }

    for line in result.human_lines(args) {
        println!("{line}");
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &IsItXArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Log scores are negative infinity for categories that cannot match.
fn format_score(score: f64) -> String {
    if score.is_finite() {
        format!("{score:.4}")
    } else {
        "-inf".to_string()
    }
}

impl HumanOutput for TrainResult {
    fn human_lines(&self, args: &IsItXArgs) -> Vec<String> {
        let mut lines = vec![format!(
            "Trained {} documents as {}",
            self.documents, self.category
        )];
        if args.verbosity() > 1 {
            for file in &self.files {
                lines.push(format!("  from {}", file.display()));
            }
            lines.push(format!("Training time: {}ms", self.duration_ms));
        }
        lines
    }
}

impl HumanOutput for ClassifyResult {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        let mut lines = vec![self.classification.to_string()];
        if let Some(scores) = &self.scores {
            lines.push(String::new());
            lines.push("Scores:".to_string());
            lines.push("───────".to_string());
            for entry in scores {
                lines.push(format!("  {:<20} {}", entry.category, format_score(entry.score)));
            }
            lines.push(format!("Features: {}", self.features));
        }
        lines
    }
}

impl HumanOutput for CheckResult {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        if self.matches {
            vec![format!("Yes {} is {}", self.location, self.target)]
        } else {
            vec![format!("No {} is NOT {}", self.location, self.target)]
        }
    }
}

impl HumanOutput for CollectionSummary {
    fn human_lines(&self, args: &IsItXArgs) -> Vec<String> {
        let mut lines = vec![format!(
            "Collected {} documents into {}",
            self.collected,
            self.output.display()
        )];
        if !self.skipped.is_empty() {
            lines.push(format!("Skipped {} locations", self.skipped.len()));
            if args.verbosity() > 1 {
                for location in &self.skipped {
                    lines.push(format!("  {location}"));
                }
            }
        }
        lines
    }
}

impl HumanOutput for ModelStats {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        let mut lines = vec![
            "Model Statistics:".to_string(),
            "═════════════════".to_string(),
            format!("Store: {}", self.store),
            format!("Extractor: {}", self.extractor),
            format!("Categories: {}", self.stats.categories),
            format!("Documents: {}", self.stats.documents),
            format!("Distinct features: {}", self.stats.distinct_features),
            format!("Feature records: {}", self.stats.feature_records),
        ];

        if let Some(entries) = &self.category_counts {
            lines.push(String::new());
            lines.push("Categories:".to_string());
            lines.push("───────────".to_string());
            for entry in entries {
                lines.push(format!("  {:<20} {}", entry.category, entry.documents));
            }
        }
        lines
    }
}

impl HumanOutput for ThresholdList {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        let mut lines = vec![format!("Default threshold: {}", self.default)];
        for (category, threshold) in &self.thresholds {
            lines.push(format!("  {category:<20} {threshold}"));
        }
        lines
    }
}

impl HumanOutput for ResetResult {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        if self.reset {
            vec![format!("Reset {} store", self.store)]
        } else {
            vec!["Reset cancelled".to_string()]
        }
    }
}

impl HumanOutput for FeatureList {
    fn human_lines(&self, _args: &IsItXArgs) -> Vec<String> {
        self.features
            .iter()
            .map(|(feature, count)| format!("{feature}\t{count}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args() -> IsItXArgs {
        IsItXArgs::parse_from(["isitx", "stats"])
    }

    #[test]
    fn test_check_result_lines() {
        let yes = CheckResult {
            location: "page.txt".to_string(),
            target: "sports".to_string(),
            matches: true,
            classification: Classification::Category("sports".to_string()),
        };
        assert_eq!(yes.human_lines(&args()), vec!["Yes page.txt is sports"]);

        let no = CheckResult {
            matches: false,
            classification: Classification::Undetermined,
            ..yes
        };
        assert_eq!(no.human_lines(&args()), vec!["No page.txt is NOT sports"]);
    }

    #[test]
    fn test_classify_result_scores() {
        let result = ClassifyResult {
            classification: Classification::Category("sports".to_string()),
            features: 2,
            scores: Some(vec![
                CategoryScore {
                    category: "sports".to_string(),
                    score: -2.0,
                },
                CategoryScore {
                    category: "cooking".to_string(),
                    score: f64::NEG_INFINITY,
                },
            ]),
        };

        let lines = result.human_lines(&args());
        assert_eq!(lines[0], "sports");
        assert!(lines.iter().any(|line| line.contains("-2.0000")));
        assert!(lines.iter().any(|line| line.ends_with("-inf")));
    }

    #[test]
    fn test_classification_json() {
        let result = ClassifyResult {
            classification: Classification::Undetermined,
            features: 0,
            scores: None,
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"classification":"undetermined","features":0}"#
        );
    }
}

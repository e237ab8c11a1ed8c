//! Command line argument parsing for the isitx CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::ExtractorKind;

/// isitx - learn what your documents are about, one example at a time
#[derive(Parser, Debug, Clone)]
#[command(name = "isitx")]
#[command(about = "An incremental naive-Bayes document classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct IsItXArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, env = "ISITX_CONFIG", value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Model directory; selects the durable store at this path
    #[arg(short, long, env = "ISITX_MODEL", value_name = "MODEL_DIR", global = true)]
    pub model: Option<PathBuf>,

    /// Feature extractor (overrides the configuration file)
    #[arg(short, long, global = true)]
    pub extractor: Option<ExtractorKind>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl IsItXArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a category from line-delimited files
    Train(TrainArgs),

    /// Classify a document
    Classify(ClassifyArgs),

    /// Check whether a document belongs to a target category
    Check(CheckArgs),

    /// Fetch documents and append them to a training file
    Collect(CollectArgs),

    /// Show model statistics
    Stats(StatsArgs),

    /// Show the effective classification thresholds
    Threshold(ThresholdArgs),

    /// Forget every count of the model
    Reset(ResetArgs),

    /// Show the features extracted from a document
    Features(FeaturesArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Category the documents belong to
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// Training files, one document per line
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Train the documents of each file in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Where a document to classify comes from.
#[derive(Parser, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct DocumentInput {
    /// Document text
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    /// Read the document from a file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: DocumentInput,

    /// Threshold override, as CATEGORY=VALUE (repeatable)
    #[arg(short, long = "threshold", value_name = "CATEGORY=VALUE", value_parser = parse_threshold)]
    pub thresholds: Vec<(String, f64)>,

    /// Include every category's score in the output
    #[arg(long)]
    pub scores: bool,
}

/// Arguments for checking a document against one category
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Location of the document
    #[arg(value_name = "LOCATION")]
    pub location: String,

    /// Category to check for
    #[arg(short, long, value_name = "CATEGORY")]
    pub target: String,

    /// Threshold override, as CATEGORY=VALUE (repeatable)
    #[arg(long = "threshold", value_name = "CATEGORY=VALUE", value_parser = parse_threshold)]
    pub thresholds: Vec<(String, f64)>,
}

/// Arguments for collecting training data
#[derive(Parser, Debug, Clone)]
pub struct CollectArgs {
    /// Label of the collected documents; names the output file
    #[arg(value_name = "LABEL")]
    pub label: String,

    /// Document locations
    #[arg(value_name = "LOCATION")]
    pub locations: Vec<String>,

    /// File listing one location per line
    #[arg(short, long, value_name = "LIST_FILE")]
    pub list: Option<PathBuf>,

    /// Directory receiving the training files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,
}

/// Arguments for statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// List every category with its document count
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for showing thresholds
#[derive(Parser, Debug, Clone)]
pub struct ThresholdArgs {
    /// Only show this category
    #[arg(value_name = "CATEGORY")]
    pub category: Option<String>,
}

/// Arguments for resetting the model
#[derive(Parser, Debug, Clone)]
pub struct ResetArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for feature extraction
#[derive(Parser, Debug, Clone)]
pub struct FeaturesArgs {
    #[command(flatten)]
    pub input: DocumentInput,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Parse a `CATEGORY=VALUE` threshold override.
pub fn parse_threshold(s: &str) -> Result<(String, f64), String> {
    let (category, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got {s:?}"))?;
    if category.is_empty() {
        return Err(format!("missing category in {s:?}"));
    }

    let value: f64 = value
        .parse()
        .map_err(|e| format!("invalid threshold {value:?}: {e}"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("threshold must be finite and positive, got {value}"));
    }
    Ok((category.to_string(), value))
}

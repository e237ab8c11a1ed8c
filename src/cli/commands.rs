//! Command implementations for the isitx CLI.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use log::{info, warn};

use crate::classifier::{Classifier, DEFAULT_THRESHOLD};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::Config;
use crate::error::Result;
use crate::source::{DocumentSource, FileSource, collect_training_data};
use crate::store::{FileStoreConfig, StoreConfig};

/// Execute a CLI command.
pub fn execute_command(args: IsItXArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Check(check_args) => check(check_args, &args),
        Command::Collect(collect_args) => collect(collect_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
        Command::Threshold(threshold_args) => show_thresholds(threshold_args, &args),
        Command::Reset(reset_args) => reset(reset_args, &args),
        Command::Features(features_args) => show_features(features_args, &args),
    }
}

/// Resolve the configuration: file first, then command line overrides.
pub fn load_config(cli_args: &IsItXArgs) -> Result<Config> {
    let mut config = match &cli_args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(extractor) = cli_args.extractor {
        config.extractor = extractor;
    }
    if let Some(model) = &cli_args.model {
        config.store = match config.store {
            StoreConfig::File(mut file_config) => {
                file_config.path = model.clone();
                StoreConfig::File(file_config)
            }
            StoreConfig::Memory => StoreConfig::File(FileStoreConfig::new(model)),
        };
    }

    config.validate()?;
    Ok(config)
}

fn open_classifier(cli_args: &IsItXArgs) -> Result<Classifier> {
    let config = load_config(cli_args)?;
    if config.store == StoreConfig::Memory {
        warn!("Using a memory store; the model is discarded on exit (pass --model to keep it)");
    }
    config.build_classifier()
}

fn apply_thresholds(classifier: &Classifier, thresholds: &[(String, f64)]) -> Result<()> {
    for (category, value) in thresholds {
        classifier.set_threshold(category, *value)?;
    }
    Ok(())
}

fn read_document(input: &DocumentInput) -> Result<String> {
    match (&input.text, &input.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => Ok(FileSource::new().fetch(&path.to_string_lossy())?),
        (None, None) => Ok(String::new()),
    }
}

/// Train a category from line-delimited files.
fn train(args: &TrainArgs, cli_args: &IsItXArgs) -> Result<()> {
    let classifier = open_classifier(cli_args)?;
    let start = Instant::now();

    let mut documents = 0;
    for file in &args.files {
        documents += if args.parallel {
            let content = fs::read_to_string(file)?;
            let lines: Vec<&str> = content.lines().filter(|line| !line.is_empty()).collect();
            classifier.train_batch(&lines, &args.category)?
        } else {
            classifier.train_from_path(file, &args.category)?
        };
    }
    classifier.store().close()?;

    output_result(
        "Training finished",
        &TrainResult {
            category: args.category.clone(),
            documents,
            files: args.files.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Classify one document.
fn classify(args: &ClassifyArgs, cli_args: &IsItXArgs) -> Result<()> {
    let document = read_document(&args.input)?;
    let classifier = open_classifier(cli_args)?;
    apply_thresholds(&classifier, &args.thresholds)?;

    let report = classifier.classify_with_scores(&document)?;
    classifier.store().close()?;

    output_result(
        "Classification",
        &ClassifyResult::from_report(report, args.scores),
        cli_args,
    )
}

/// Fetch a document and check it against the target category.
fn check(args: &CheckArgs, cli_args: &IsItXArgs) -> Result<()> {
    let document = FileSource::new().fetch(&args.location)?;
    let classifier = open_classifier(cli_args)?;
    apply_thresholds(&classifier, &args.thresholds)?;

    let classification = classifier.classify(&document)?;
    classifier.store().close()?;
    info!("{} classified as {classification}", args.location);

    output_result(
        "Check",
        &CheckResult {
            location: args.location.clone(),
            target: args.target.clone(),
            matches: classification.is(&args.target),
            classification,
        },
        cli_args,
    )
}

/// Fetch documents into a training file.
fn collect(args: &CollectArgs, cli_args: &IsItXArgs) -> Result<()> {
    let mut locations = args.locations.clone();
    if let Some(list) = &args.list {
        let content = fs::read_to_string(list)?;
        locations.extend(content.lines().map(str::to_string));
    }

    let summary = collect_training_data(&FileSource::new(), &locations, &args.label, &args.data_dir)?;
    output_result("Collection finished", &summary, cli_args)
}

/// Show model statistics.
fn show_stats(args: &StatsArgs, cli_args: &IsItXArgs) -> Result<()> {
    let classifier = open_classifier(cli_args)?;
    let stats = classifier.stats()?;

    let category_counts = if args.detailed {
        let mut entries = Vec::new();
        for category in classifier.categories()? {
            let documents = classifier.category_count(&category)? as u64;
            entries.push(CategoryEntry {
                category,
                documents,
            });
        }
        Some(entries)
    } else {
        None
    };
    classifier.store().close()?;

    output_result(
        "Model statistics",
        &ModelStats {
            store: classifier.store().name().to_string(),
            extractor: classifier.extractor().name().to_string(),
            stats,
            category_counts,
        },
        cli_args,
    )
}

/// Show the thresholds the configuration sets.
fn show_thresholds(args: &ThresholdArgs, cli_args: &IsItXArgs) -> Result<()> {
    let config = load_config(cli_args)?;

    let thresholds: BTreeMap<String, f64> = match &args.category {
        Some(category) => {
            let value = config
                .thresholds
                .get(category)
                .copied()
                .unwrap_or(DEFAULT_THRESHOLD);
            BTreeMap::from([(category.clone(), value)])
        }
        None => config.thresholds,
    };

    output_result(
        "Thresholds",
        &ThresholdList {
            default: DEFAULT_THRESHOLD,
            thresholds,
        },
        cli_args,
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Forget every count of the model.
fn reset(args: &ResetArgs, cli_args: &IsItXArgs) -> Result<()> {
    let classifier = open_classifier(cli_args)?;
    let store = classifier.store().name().to_string();

    if !args.yes && !confirm("Really forget every trained document?")? {
        classifier.store().close()?;
        return output_result("", &ResetResult { store, reset: false }, cli_args);
    }

    classifier.reset()?;
    classifier.store().close()?;
    output_result("", &ResetResult { store, reset: true }, cli_args)
}

/// Show the features of a document.
fn show_features(args: &FeaturesArgs, cli_args: &IsItXArgs) -> Result<()> {
    let document = read_document(&args.input)?;
    let config = load_config(cli_args)?;
    let extractor = config.extractor.build()?;
    let features = extractor.extract(&document)?;

    output_result(
        "Features",
        &FeatureList {
            extractor: extractor.name().to_string(),
            features: features
                .iter()
                .map(|(feature, count)| (feature.to_string(), count))
                .collect(),
        },
        cli_args,
    )
}

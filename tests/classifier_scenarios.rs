use isitx::analysis::extractor::ExtractorKind;
use isitx::classifier::{Classification, Classifier};
use isitx::config::Config;
use isitx::error::Result;
use isitx::source::{FileSource, collect_training_data};
use isitx::store::MemoryCountStore;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn classifier(kind: ExtractorKind) -> Result<Classifier> {
    Ok(Classifier::new(kind.build()?, Arc::new(MemoryCountStore::new())))
}

fn train_scenario(classifier: &Classifier) -> Result<()> {
    classifier.train_from_file(["win the game", "team scored"], "sports")?;
    classifier.train_from_file(["stock market rose", "earnings report"], "finance")?;
    Ok(())
}

#[test]
fn test_sports_finance_scenario() -> Result<()> {
    for kind in [ExtractorKind::Linguistic, ExtractorKind::Simple] {
        let classifier = classifier(kind)?;
        train_scenario(&classifier)?;

        assert_eq!(
            classifier.classify("the team won the game")?,
            Classification::Category("sports".to_string()),
            "{kind}"
        );
        assert_eq!(
            classifier.classify("purple elephants dance")?,
            Classification::Undetermined,
            "{kind}"
        );
    }
    Ok(())
}

#[test]
fn test_threshold_effect() -> Result<()> {
    let classifier = classifier(ExtractorKind::Linguistic)?;
    train_scenario(&classifier)?;

    classifier.set_threshold("sports", 0.1)?;
    assert!(classifier.classify("the team won")?.is("sports"));

    classifier.set_threshold("sports", 10.0)?;
    assert!(classifier.classify("the team won")?.is_undetermined());
    Ok(())
}

#[test]
fn test_reset_is_idempotent() -> Result<()> {
    let classifier = classifier(ExtractorKind::Linguistic)?;
    train_scenario(&classifier)?;

    classifier.reset()?;
    let after_first = classifier.stats()?;
    classifier.reset()?;

    assert_eq!(classifier.stats()?, after_first);
    assert_eq!(after_first.documents, 0);
    assert!(classifier.categories()?.is_empty());
    Ok(())
}

#[test]
fn test_concurrent_trainers_lose_no_updates() -> Result<()> {
    let classifier = Arc::new(classifier(ExtractorKind::Linguistic)?);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let classifier = Arc::clone(&classifier);
            thread::spawn(move || {
                let category = if i % 2 == 0 { "sports" } else { "finance" };
                for _ in 0..100 {
                    classifier.train("shared feature", category).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(classifier.total_count()?, 800.0);
    assert_eq!(classifier.feature_count("shared", "sports")?, 400.0);
    assert_eq!(classifier.feature_count("feature", "finance")?, 400.0);
    Ok(())
}

#[test]
fn test_collect_then_train() -> Result<()> {
    let pages = tempdir()?;
    let data = tempdir()?;
    fs::write(pages.path().join("one.txt"), "win the game\n")?;
    fs::write(pages.path().join("two.txt"), "team\nscored")?;

    let source = FileSource::with_root(pages.path());
    let summary = collect_training_data(
        &source,
        ["one.txt", "gone.txt", "two.txt"],
        "sports",
        data.path(),
    )?;
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.skipped, vec!["gone.txt".to_string()]);

    let classifier = Config::default().build_classifier()?;
    assert_eq!(classifier.train_from_path(&summary.output, "sports")?, 2);
    assert_eq!(classifier.feature_count("scored", "sports")?, 1.0);
    assert!(classifier.classify("the game")?.is("sports"));
    Ok(())
}

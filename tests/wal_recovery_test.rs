use isitx::analysis::extractor::ExtractorKind;
use isitx::classifier::{Classification, Classifier};
use isitx::error::Result;
use isitx::store::{CountStore, FileCountStore, FileStoreConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn open_classifier(path: &Path) -> Result<Classifier> {
    let store = FileCountStore::open(FileStoreConfig::new(path))?;
    Ok(Classifier::new(
        ExtractorKind::Linguistic.build()?,
        Arc::new(store),
    ))
}

fn train_scenario(classifier: &Classifier) -> Result<()> {
    classifier.train("win the game", "sports")?;
    classifier.train("team scored", "sports")?;
    classifier.train("stock market rose", "finance")?;
    classifier.train("earnings report", "finance")?;
    Ok(())
}

#[test]
fn test_journal_recovery_unsynced_training() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("model");

    // 1. "First run": train but never sync, then simulate a crash by leaking
    //    the store so that neither close nor drop runs.
    {
        let store = FileCountStore::open(FileStoreConfig::new(&path))?;
        let classifier = Classifier::new(ExtractorKind::Linguistic.build()?, Arc::new(store));
        train_scenario(&classifier)?;
        std::mem::forget(classifier);
    }

    // The crashed process left its lock behind.
    fs::remove_file(path.join("isitx.lock"))?;

    // 2. "Restart": the journal is replayed.
    let classifier = open_classifier(&path)?;
    assert_eq!(classifier.total_count()?, 4.0);
    assert_eq!(classifier.feature_count("game", "sports")?, 1.0);
    assert_eq!(
        classifier.classify("the team won the game")?,
        Classification::Category("sports".to_string())
    );
    Ok(())
}

#[test]
fn test_torn_journal_tail_does_not_corrupt_later_records() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("model");
    fs::create_dir_all(&path)?;

    // A crash mid-append left half a record and no newline.
    fs::write(path.join("counts.wal"), r#"{"seq":1,"op":"category","cat"#)?;

    {
        let store = FileCountStore::open(FileStoreConfig::new(&path))?;
        store.increment_feature("game", "sports")?;
        store.increment_category("sports")?;
        std::mem::forget(store);
    }
    fs::remove_file(path.join("isitx.lock"))?;

    let store = FileCountStore::open(FileStoreConfig::new(&path))?;
    assert_eq!(store.feature_count("game", "sports")?, 1.0);
    assert_eq!(store.category_count("sports")?, 1.0);
    assert_eq!(store.total_count()?, 1.0);
    Ok(())
}

#[test]
fn test_synced_model_survives_reopen() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("model");

    {
        let classifier = open_classifier(&path)?;
        train_scenario(&classifier)?;
        classifier.sync()?;
        classifier.train("team game", "sports")?;
        classifier.store().close()?;
    }

    let classifier = open_classifier(&path)?;
    assert_eq!(classifier.category_count("sports")?, 3.0);
    assert_eq!(classifier.feature_count("team", "sports")?, 2.0);

    // Thresholds are not part of the persisted model.
    classifier.set_threshold("sports", 10.0)?;
    drop(classifier);
    let classifier = open_classifier(&path)?;
    assert_eq!(classifier.get_threshold("sports"), 1.0);
    Ok(())
}

#[test]
fn test_reset_is_durable() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("model");

    {
        let classifier = open_classifier(&path)?;
        train_scenario(&classifier)?;
        classifier.sync()?;
        classifier.reset()?;
    }

    let classifier = open_classifier(&path)?;
    assert!(classifier.categories()?.is_empty());
    assert!(
        classifier
            .classify("the team won")
            .unwrap_err()
            .is_empty_model()
    );
    Ok(())
}

#[test]
fn test_locked_model_refuses_second_opener() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("model");

    let store = FileCountStore::open(FileStoreConfig::new(&path))?;
    let err = FileCountStore::open(FileStoreConfig::new(&path)).unwrap_err();
    assert!(err.is_store_unavailable());

    store.close()?;
    assert!(store.total_count().unwrap_err().is_store_unavailable());
    assert!(FileCountStore::open(FileStoreConfig::new(&path)).is_ok());
    Ok(())
}

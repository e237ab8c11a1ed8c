//! Durable count store backed by a directory.
//!
//! Directory layout:
//!
//! ```text
//! <path>/feature_counts.json   {"last_seq": N, "rows": [{feature, category, count}, ...]}
//! <path>/category_counts.json  {"last_seq": N, "rows": [{category, count}, ...]}
//! <path>/counts.wal            one JSON journal record per line
//! <path>/isitx.lock            held while the store is open
//! ```
//!
//! Every write is appended to the journal before it is applied in memory.
//! `sync` (and automatic compaction) rewrites both tables and truncates the
//! journal. Each table remembers the last journal sequence number folded into
//! it, so replay after a crash applies exactly the records a table is missing.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::memory::MemoryCountStore;
use crate::store::{
    CategoryRow, CountSnapshot, CountStore, FeatureRow, StoreError, StoreStats,
};

pub const FEATURE_TABLE_FILE: &str = "feature_counts.json";
pub const CATEGORY_TABLE_FILE: &str = "category_counts.json";
pub const JOURNAL_FILE: &str = "counts.wal";
pub const LOCK_FILE: &str = "isitx.lock";

/// Journal records accumulated before the tables are rewritten automatically.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 10_000;

fn default_compaction_threshold() -> usize {
    DEFAULT_COMPACTION_THRESHOLD
}

/// Configuration for [`FileCountStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStoreConfig {
    /// Directory holding the tables and journal.
    pub path: PathBuf,

    /// fsync the journal after every record.
    #[serde(default)]
    pub sync_writes: bool,

    /// Rewrite the tables after this many journal records; 0 disables it.
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: usize,
}

impl FileStoreConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileStoreConfig {
            path: path.into(),
            sync_writes: false,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

/// On-disk form of one table.
#[derive(Debug, Serialize, Deserialize)]
struct TableFile<R> {
    last_seq: u64,
    rows: Vec<R>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalOp {
    Feature { feature: String, category: String },
    Category { category: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct JournalRecord {
    seq: u64,
    #[serde(flatten)]
    op: JournalOp,
}

/// Append-only journal file.
#[derive(Debug)]
struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    last_seq: u64,
    pending: usize,
    sync_writes: bool,
}

impl Journal {
    fn open(path: PathBuf, last_seq: u64, sync_writes: bool) -> Result<Self> {
        let file = open_append(&path)?;
        Ok(Journal {
            path,
            writer: BufWriter::new(file),
            last_seq,
            pending: 0,
            sync_writes,
        })
    }

    fn append(&mut self, op: JournalOp) -> Result<u64> {
        let record = JournalRecord {
            seq: self.last_seq + 1,
            op,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        self.writer.write_all(&line).map_err(io_error)?;
        self.writer.flush().map_err(io_error)?;
        if self.sync_writes {
            self.writer.get_ref().sync_data().map_err(io_error)?;
        }

        self.last_seq = record.seq;
        self.pending += 1;
        Ok(record.seq)
    }

    fn truncate(&mut self) -> Result<()> {
        self.writer.flush().map_err(io_error)?;
        File::create(&self.path).map_err(io_error)?;
        self.writer = BufWriter::new(open_append(&self.path)?);
        self.pending = 0;
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)?)
}

fn read_table<R: DeserializeOwned>(path: &Path) -> Result<TableFile<R>> {
    if !path.exists() {
        return Ok(TableFile {
            last_seq: 0,
            rows: Vec::new(),
        });
    }

    let file = File::open(path).map_err(io_error)?;
    let table = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StoreError::CorruptTable(format!("{}: {e}", path.display())))?;
    Ok(table)
}

fn write_table<R: Serialize>(path: &Path, table: &TableFile<R>) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&temp_path).map_err(io_error)?);
        serde_json::to_writer(&mut writer, table)?;
        writer.flush().map_err(io_error)?;
        writer.get_ref().sync_all().map_err(io_error)?;
    }
    fs::rename(&temp_path, path).map_err(io_error)?;
    Ok(())
}

/// Read every journal record. A torn final line is dropped with a warning;
/// any other undecodable line is an error.
fn read_journal(path: &Path) -> Result<Vec<JournalRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path).map_err(io_error)?);
    let lines: Vec<String> = reader
        .lines()
        .collect::<std::io::Result<_>>()
        .map_err(io_error)?;
    let last_line = lines.iter().rposition(|line| !line.trim().is_empty());

    let mut records = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) if Some(index) == last_line => {
                warn!("Dropping torn journal record at line {}: {e}", index + 1);
            }
            Err(e) => {
                return Err(StoreError::CorruptJournal(format!("line {}: {e}", index + 1)).into());
            }
        }
    }

    Ok(records)
}

/// A count store persisted in a directory.
///
/// Writers are serialized through the journal; reads go straight to the
/// in-memory tables.
#[derive(Debug)]
pub struct FileCountStore {
    config: FileStoreConfig,
    counts: MemoryCountStore,
    journal: Mutex<Journal>,
    lock_path: PathBuf,
    closed: AtomicBool,
}

impl FileCountStore {
    /// Open the store in `config.path`, creating the directory if needed.
    pub fn open(config: FileStoreConfig) -> Result<Self> {
        let directory = config.path.clone();
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(io_error)?;
        }
        if !directory.is_dir() {
            return Err(StoreError::Io(format!(
                "Path is not a directory: {}",
                directory.display()
            ))
            .into());
        }

        let lock_path = directory.join(LOCK_FILE);
        acquire_lock(&lock_path)?;

        match Self::load(config, lock_path.clone()) {
            Ok(store) => Ok(store),
            Err(e) => {
                let _ = fs::remove_file(&lock_path);
                Err(e)
            }
        }
    }

    fn load(config: FileStoreConfig, lock_path: PathBuf) -> Result<Self> {
        let directory = &config.path;
        let features: TableFile<FeatureRow> = read_table(&directory.join(FEATURE_TABLE_FILE))?;
        let categories: TableFile<CategoryRow> =
            read_table(&directory.join(CATEGORY_TABLE_FILE))?;
        let (feature_seq, category_seq) = (features.last_seq, categories.last_seq);

        let counts = MemoryCountStore::from_rows(features.rows, categories.rows);
        let journal_path = directory.join(JOURNAL_FILE);
        let records = read_journal(&journal_path)?;
        // Leftover bytes (a torn tail included) must not prefix the next append.
        let journal_dirty = fs::metadata(&journal_path)
            .map(|metadata| metadata.len() > 0)
            .unwrap_or(false);
        let mut last_seq = feature_seq.max(category_seq);

        for record in &records {
            last_seq = last_seq.max(record.seq);
            match &record.op {
                JournalOp::Feature { feature, category } if record.seq > feature_seq => {
                    counts.increment_feature(feature, category)?;
                }
                JournalOp::Category { category } if record.seq > category_seq => {
                    counts.increment_category(category)?;
                }
                JournalOp::Reset => {
                    if record.seq > feature_seq {
                        counts.clear_features();
                    }
                    if record.seq > category_seq {
                        counts.clear_categories();
                    }
                }
                _ => {}
            }
        }

        let journal = Journal::open(journal_path, last_seq, config.sync_writes)?;
        let store = FileCountStore {
            config,
            counts,
            journal: Mutex::new(journal),
            lock_path,
            closed: AtomicBool::new(false),
        };

        if journal_dirty {
            info!(
                "Replayed {} journal records from {}",
                records.len(),
                store.config.path.display()
            );
            let mut journal = store.journal.lock();
            store.compact(&mut journal)?;
        }

        Ok(store)
    }

    /// Directory this store lives in.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Journal records not yet folded into the tables.
    pub fn pending_records(&self) -> usize {
        self.journal.lock().pending
    }

    /// Lock the journal, failing if the store was closed.
    fn journal(&self) -> Result<MutexGuard<'_, Journal>> {
        let journal = self.journal.lock();
        self.check_closed()?;
        Ok(journal)
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed.into())
        } else {
            Ok(())
        }
    }

    /// Write both tables at the journal's current sequence and truncate it.
    fn compact(&self, journal: &mut Journal) -> Result<()> {
        let (features, categories) = self.counts.rows();
        let last_seq = journal.last_seq;
        let folded = journal.pending;

        write_table(
            &self.config.path.join(FEATURE_TABLE_FILE),
            &TableFile {
                last_seq,
                rows: features,
            },
        )?;
        write_table(
            &self.config.path.join(CATEGORY_TABLE_FILE),
            &TableFile {
                last_seq,
                rows: categories,
            },
        )?;
        journal.truncate()?;

        debug!("Compacted {folded} journal records at seq {last_seq}");
        Ok(())
    }

    /// Compact once enough records are pending. The triggering record is
    /// already durable in the journal, so a failure here only leaves the
    /// records pending for the next `sync`.
    fn maybe_compact(&self, journal: &mut Journal) {
        let threshold = self.config.compaction_threshold;
        if threshold > 0
            && journal.pending >= threshold
            && let Err(e) = self.compact(journal)
        {
            warn!(
                "Automatic compaction of {} failed, {} records stay pending: {e}",
                self.config.path.display(),
                journal.pending
            );
        }
    }
}

fn acquire_lock(lock_path: &Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                StoreError::Locked(lock_path.display().to_string())
            } else {
                io_error(e)
            }
        })?;
    writeln!(file, "{}", std::process::id()).map_err(io_error)?;
    Ok(())
}

impl CountStore for FileCountStore {
    fn increment_feature(&self, feature: &str, category: &str) -> Result<()> {
        let mut journal = self.journal()?;
        journal.append(JournalOp::Feature {
            feature: feature.to_string(),
            category: category.to_string(),
        })?;
        self.counts.increment_feature(feature, category)?;
        self.maybe_compact(&mut journal);
        Ok(())
    }

    fn increment_category(&self, category: &str) -> Result<()> {
        let mut journal = self.journal()?;
        journal.append(JournalOp::Category {
            category: category.to_string(),
        })?;
        self.counts.increment_category(category)?;
        self.maybe_compact(&mut journal);
        Ok(())
    }

    fn feature_count(&self, feature: &str, category: &str) -> Result<f64> {
        self.check_closed()?;
        self.counts.feature_count(feature, category)
    }

    fn category_count(&self, category: &str) -> Result<f64> {
        self.check_closed()?;
        self.counts.category_count(category)
    }

    fn total_count(&self) -> Result<f64> {
        self.check_closed()?;
        self.counts.total_count()
    }

    fn categories(&self) -> Result<std::collections::BTreeSet<String>> {
        self.check_closed()?;
        self.counts.categories()
    }

    fn snapshot(&self, features: &[String]) -> Result<CountSnapshot> {
        self.check_closed()?;
        self.counts.snapshot(features)
    }

    fn stats(&self) -> Result<StoreStats> {
        self.check_closed()?;
        self.counts.stats()
    }

    fn reset(&self) -> Result<()> {
        let mut journal = self.journal()?;
        journal.append(JournalOp::Reset)?;
        self.counts.reset()
    }

    fn sync(&self) -> Result<()> {
        let mut journal = self.journal()?;
        self.compact(&mut journal)
    }

    fn close(&self) -> Result<()> {
        let mut journal = self.journal.lock();
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = self.compact(&mut journal);
        self.counts.mark_closed();
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!("Failed to remove lock file {}: {e}", self.lock_path.display());
        }
        result
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

impl Drop for FileCountStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close count store {}: {e}", self.config.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config(dir: &TempDir) -> FileStoreConfig {
        FileStoreConfig::new(dir.path().join("model"))
    }

    #[test]
    fn test_counts_survive_close_and_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileCountStore::open(config(&dir)).unwrap();
            store.increment_feature("game", "sports").unwrap();
            store.increment_feature("game", "sports").unwrap();
            store.increment_category("sports").unwrap();
            store.close().unwrap();
        }

        let store = FileCountStore::open(config(&dir)).unwrap();
        assert_eq!(store.feature_count("game", "sports").unwrap(), 2.0);
        assert_eq!(store.category_count("sports").unwrap(), 1.0);
        assert_eq!(store.pending_records(), 0);
    }

    #[test]
    fn test_tables_have_the_documented_layout() {
        let dir = TempDir::new().unwrap();
        let store = FileCountStore::open(config(&dir)).unwrap();
        store.increment_feature("game", "sports").unwrap();
        store.increment_category("sports").unwrap();
        store.sync().unwrap();

        let path = dir.path().join("model");
        let features: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.join(FEATURE_TABLE_FILE)).unwrap())
                .unwrap();
        assert_eq!(features["last_seq"], 2);
        assert_eq!(features["rows"][0]["feature"], "game");
        assert_eq!(features["rows"][0]["category"], "sports");
        assert_eq!(features["rows"][0]["count"], 1);

        let categories: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.join(CATEGORY_TABLE_FILE)).unwrap())
                .unwrap();
        assert_eq!(categories["rows"][0]["category"], "sports");
        assert_eq!(fs::read_to_string(path.join(JOURNAL_FILE)).unwrap(), "");
    }

    #[test]
    fn test_journal_replay_without_sync() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        fs::create_dir_all(&path).unwrap();

        // A journal left behind by a process that never synced.
        let journal = [
            r#"{"seq":1,"op":"feature","feature":"game","category":"sports"}"#,
            r#"{"seq":2,"op":"category","category":"sports"}"#,
            r#"{"seq":3,"op":"category","cat"#,
        ]
        .join("\n");
        fs::write(path.join(JOURNAL_FILE), journal).unwrap();

        let store = FileCountStore::open(config(&dir)).unwrap();
        assert_eq!(store.feature_count("game", "sports").unwrap(), 1.0);
        assert_eq!(store.category_count("sports").unwrap(), 1.0);

        // Replay is folded into the tables straight away.
        assert_eq!(fs::read_to_string(path.join(JOURNAL_FILE)).unwrap(), "");
    }

    #[test]
    fn test_replay_skips_records_already_in_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        fs::create_dir_all(&path).unwrap();

        fs::write(
            path.join(FEATURE_TABLE_FILE),
            r#"{"last_seq":2,"rows":[{"feature":"game","category":"sports","count":1}]}"#,
        )
        .unwrap();
        fs::write(
            path.join(CATEGORY_TABLE_FILE),
            r#"{"last_seq":1,"rows":[]}"#,
        )
        .unwrap();
        let journal = [
            r#"{"seq":1,"op":"feature","feature":"game","category":"sports"}"#,
            r#"{"seq":2,"op":"category","category":"sports"}"#,
        ]
        .join("\n");
        fs::write(path.join(JOURNAL_FILE), journal).unwrap();

        let store = FileCountStore::open(config(&dir)).unwrap();
        assert_eq!(store.feature_count("game", "sports").unwrap(), 1.0);
        assert_eq!(store.category_count("sports").unwrap(), 1.0);
    }

    #[test]
    fn test_corrupt_journal_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        fs::create_dir_all(&path).unwrap();
        let journal = [
            "not json",
            r#"{"seq":2,"op":"category","category":"sports"}"#,
        ]
        .join("\n");
        fs::write(path.join(JOURNAL_FILE), journal).unwrap();

        let err = FileCountStore::open(config(&dir)).unwrap_err();
        assert!(matches!(err, crate::error::IsItXError::Storage(_)));
        // The lock is released when opening fails.
        assert!(!path.join(LOCK_FILE).exists());
    }

    #[test]
    fn test_reset_is_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileCountStore::open(config(&dir)).unwrap();
            store.increment_feature("game", "sports").unwrap();
            store.increment_category("sports").unwrap();
            store.sync().unwrap();
            store.reset().unwrap();
        }

        let store = FileCountStore::open(config(&dir)).unwrap();
        assert!(store.categories().unwrap().is_empty());
        assert_eq!(store.feature_count("game", "sports").unwrap(), 0.0);
    }

    #[test]
    fn test_second_opener_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileCountStore::open(config(&dir)).unwrap();

        let err = FileCountStore::open(config(&dir)).unwrap_err();
        assert!(err.is_store_unavailable());

        store.close().unwrap();
        assert!(FileCountStore::open(config(&dir)).is_ok());
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = FileCountStore::open(config(&dir)).unwrap();
        store.close().unwrap();
        store.close().unwrap();

        assert!(store.increment_feature("game", "sports").unwrap_err().is_store_unavailable());
        assert!(store.feature_count("game", "sports").unwrap_err().is_store_unavailable());
        assert!(store.reset().unwrap_err().is_store_unavailable());
    }

    #[test]
    fn test_automatic_compaction() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.compaction_threshold = 3;
        let store = FileCountStore::open(config).unwrap();

        store.increment_feature("a", "x").unwrap();
        store.increment_feature("b", "x").unwrap();
        assert_eq!(store.pending_records(), 2);
        store.increment_category("x").unwrap();
        assert_eq!(store.pending_records(), 0);
    }

    #[test]
    fn test_failed_automatic_compaction_keeps_increment() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.compaction_threshold = 1;
        let store = FileCountStore::open(config).unwrap();

        // A directory in the temp file's place makes the table write fail.
        let blocker = dir.path().join("model").join("feature_counts.json.tmp");
        fs::create_dir(&blocker).unwrap();

        store.increment_feature("game", "sports").unwrap();
        store.increment_category("sports").unwrap();
        assert_eq!(store.feature_count("game", "sports").unwrap(), 1.0);
        assert_eq!(store.category_count("sports").unwrap(), 1.0);
        assert_eq!(store.pending_records(), 2);
        assert!(store.sync().is_err());

        fs::remove_dir(&blocker).unwrap();
        store.sync().unwrap();
        assert_eq!(store.pending_records(), 0);
        store.close().unwrap();

        let store = FileCountStore::open(FileStoreConfig::new(dir.path().join("model"))).unwrap();
        assert_eq!(store.feature_count("game", "sports").unwrap(), 1.0);
        assert_eq!(store.category_count("sports").unwrap(), 1.0);
    }

    #[test]
    fn test_torn_only_journal_is_truncated_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(JOURNAL_FILE), r#"{"seq":1,"op":"category","cat"#).unwrap();

        let store = FileCountStore::open(config(&dir)).unwrap();
        assert!(store.categories().unwrap().is_empty());
        assert_eq!(fs::read_to_string(path.join(JOURNAL_FILE)).unwrap(), "");
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: FileStoreConfig = serde_json::from_str(r#"{"path":"/tmp/m"}"#).unwrap();
        assert!(!config.sync_writes);
        assert_eq!(config.compaction_threshold, DEFAULT_COMPACTION_THRESHOLD);
    }
}

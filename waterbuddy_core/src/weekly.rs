//! Weekly history persistence.
//!
//! Each committed day is stored as one `(date, total)` row. Writes replace
//! any existing row for the same date; reads return at most the latest
//! [`WEEK_DAYS`] dates, oldest first.
//!
//! The CSV store keeps rows in insertion order on disk, so reads select by
//! date value, never by file position. Rows are copied as raw bytes when
//! the file is rewritten, so rows that fail to parse survive untouched.
//! Writers hold an exclusive lock on a `.lock` file next to the CSV for
//! the whole read-modify-write.

use crate::{Result, WeeklyRecord};
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Number of days shown in the weekly summary
pub const WEEK_DAYS: usize = 7;

const HEADER: [&str; 2] = ["date", "total"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable date-keyed table of daily totals
pub trait WeeklyStore {
    /// Insert or replace the total for `date`
    fn upsert(&mut self, date: NaiveDate, total_ml: u64) -> Result<()>;

    /// The records for the latest `max_days` distinct dates, oldest first
    fn read_recent(&self, max_days: usize) -> Result<Vec<WeeklyRecord>>;

    /// Discard every record
    fn reset_all(&mut self) -> Result<()>;
}

/// Keep the latest `max_days` entries of a date-ordered map
fn latest(records: BTreeMap<NaiveDate, u64>, max_days: usize) -> Vec<WeeklyRecord> {
    let skip = records.len().saturating_sub(max_days);
    records
        .into_iter()
        .skip(skip)
        .map(|(date, total_ml)| WeeklyRecord { date, total_ml })
        .collect()
}

// ============================================================================
// CSV-backed store
// ============================================================================

/// Weekly store backed by a `date,total` CSV file
pub struct CsvWeeklyStore {
    path: PathBuf,
}

impl CsvWeeklyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Lock the sidecar lock file; the lock is released when the file is dropped
    ///
    /// The CSV itself is replaced by rename on every write, so locking it
    /// would not exclude a writer holding the previous inode.
    fn lock(&self, exclusive: bool) -> Result<File> {
        std::fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    /// Create the file with just a header if it does not exist yet
    fn ensure_initialized(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        let _lock = self.lock(true)?;
        self.init_locked()
    }

    /// Same as `ensure_initialized`, for callers already holding the lock
    fn init_locked(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        tracing::info!("Creating weekly history at {:?}", self.path);
        self.write_rows(&[])
    }

    /// Read every data row as raw bytes, including ones that fail to parse
    ///
    /// Callers must hold the lock.
    fn read_rows(&self) -> Result<Vec<ByteRecord>> {
        let file = File::open(&self.path)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(&file));

        let mut rows = Vec::new();
        for (idx, result) in reader.byte_records().enumerate() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    // Row numbers are 1-based and count the header
                    tracing::warn!("Unreadable weekly row {}: {}", idx + 2, e);
                }
            }
        }

        Ok(rows)
    }

    /// Atomically replace the file with a header followed by `rows`
    ///
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    ///
    /// Callers must hold the exclusive lock.
    fn write_rows(&self, rows: &[ByteRecord]) -> Result<()> {
        let parent = self.parent_dir();
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;

        {
            let mut writer = WriterBuilder::new()
                .flexible(true)
                .from_writer(std::io::BufWriter::new(temp.as_file()));
            writer.write_record(HEADER)?;
            for row in rows {
                writer.write_record(row)?;
            }
            let mut inner = writer
                .into_inner()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            inner.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| crate::Error::Io(e.error))?;
        Ok(())
    }
}

/// Decode one field of a row as trimmed UTF-8
fn field(row: &ByteRecord, idx: usize) -> std::result::Result<&str, String> {
    let raw = &row[idx];
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|_| format!("column {} is not valid UTF-8: {:?}", idx + 1, raw))
}

/// Parse one data row, or explain why it was skipped
fn parse_row(row: &ByteRecord) -> std::result::Result<WeeklyRecord, String> {
    if row.len() != 2 {
        return Err(format!("expected 2 columns, found {}", row.len()));
    }
    let date_text = field(row, 0)?;
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|e| format!("invalid date {:?}: {}", date_text, e))?;
    let total_text = field(row, 1)?;
    let total_ml = total_text
        .parse::<u64>()
        .map_err(|e| format!("invalid total {:?}: {}", total_text, e))?;
    Ok(WeeklyRecord { date, total_ml })
}

/// First column matches `date`, compared as text the way rows are written
fn row_is_for(row: &ByteRecord, key: &str) -> bool {
    row.get(0)
        .and_then(|f| std::str::from_utf8(f).ok())
        .map(str::trim)
        == Some(key)
}

impl WeeklyStore for CsvWeeklyStore {
    fn upsert(&mut self, date: NaiveDate, total_ml: u64) -> Result<()> {
        let _lock = self.lock(true)?;
        self.init_locked()?;

        let key = date.format(DATE_FORMAT).to_string();
        let mut rows: Vec<ByteRecord> = self
            .read_rows()?
            .into_iter()
            .filter(|row| !row_is_for(row, &key))
            .collect();
        let total = total_ml.to_string();
        rows.push(ByteRecord::from(vec![key.as_str(), total.as_str()]));

        self.write_rows(&rows)?;
        tracing::info!("Saved {} ml for {}", total_ml, key);
        Ok(())
    }

    fn read_recent(&self, max_days: usize) -> Result<Vec<WeeklyRecord>> {
        self.ensure_initialized()?;

        let rows = {
            let _lock = self.lock(false)?;
            self.read_rows()?
        };

        // Later rows win if a date was duplicated by hand
        let mut by_date = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            match parse_row(row) {
                Ok(record) => {
                    by_date.insert(record.date, record.total_ml);
                }
                Err(reason) => {
                    tracing::warn!("Skipping weekly row {}: {}", idx + 2, reason);
                }
            }
        }

        let records = latest(by_date, max_days);
        tracing::debug!("Read {} weekly records from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn reset_all(&mut self) -> Result<()> {
        let _lock = self.lock(true)?;
        self.write_rows(&[])?;
        tracing::info!("Cleared weekly history at {:?}", self.path);
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Weekly store kept in memory; nothing survives the process
#[derive(Clone, Debug, Default)]
pub struct MemoryWeeklyStore {
    records: BTreeMap<NaiveDate, u64>,
}

impl MemoryWeeklyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl WeeklyStore for MemoryWeeklyStore {
    fn upsert(&mut self, date: NaiveDate, total_ml: u64) -> Result<()> {
        self.records.insert(date, total_ml);
        Ok(())
    }

    fn read_recent(&self, max_days: usize) -> Result<Vec<WeeklyRecord>> {
        Ok(latest(self.records.clone(), max_days))
    }

    fn reset_all(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }
}

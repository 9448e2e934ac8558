//! Quality metrics for an endoscopy practice, computed from the practice's CSV exports.
//!
//! Each tool in `src/bin` loads one or more flat files, filters them by date, and tallies counts
//! into the explicit aggregate structures defined in the modules below. Reports are written as
//! fixed width text or CSV.
pub mod adr;
pub mod caecum;
pub mod config;
pub mod counts;
pub mod dates;
pub mod doctors;
pub mod extract;
pub mod follow_up;
pub mod period;
pub mod phisc;
pub mod repeats;
pub mod report;
pub mod target;
mod util;

pub use anyhow::{Context, Error};
use chrono::NaiveDate;
use qu::ick_use::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, io, path::Path, sync::Arc};

pub use crate::{
    config::Config,
    dates::DateRange,
    period::{HalfYear, MonthSpan, Quarter},
    util::{header, title_case},
};
use crate::util::dmy_date;

pub type ArcStr = Arc<str>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

pub const EPISODES_FILE: &str = "episodes.csv";

/// A row in the practice's `episodes.csv`.
///
/// Only the columns used by the tools are named here. Columns that are missing from an export
/// default to the empty string, apart from `date` and `mrn` which every row must have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(with = "dmy_date")]
    pub date: NaiveDate,
    pub mrn: String,
    #[serde(default)]
    pub anaes: String,
    #[serde(default)]
    pub endo: String,
    #[serde(default)]
    pub upper: String,
    #[serde(default)]
    pub colon: String,
    #[serde(default)]
    pub anal: String,
    #[serde(default)]
    pub caecum: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub surname: String,
    /// Birth date as entered, `d/m/yyyy`.
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub polyp: String,
}

impl EpisodeRecord {
    /// Load every row of an `episodes.csv` export.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        load_csv(path)
    }
}

/// Field positions in the headerless `day_surgery.csv`.
pub mod day_surgery {
    pub const FILE: &str = "day_surgery.csv";

    pub const DATE: usize = 0;
    pub const MRN: usize = 1;
    pub const ENDOSCOPIST: usize = 5;
    pub const UPPER: usize = 7;
    pub const COLON: usize = 8;
    pub const GLP1: usize = 12;
}

/// A CSV table kept as raw strings, with its header row.
///
/// Used where rows have to be written back out with all of their original columns.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl RawTable {
    pub fn new(headers: csv::StringRecord, rows: Vec<csv::StringRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        fn inner(path: &Path) -> Result<RawTable> {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .from_path(path)?;
            let headers = reader.headers()?.clone();
            let rows = reader
                .into_records()
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RawTable { headers, rows })
        }
        inner(path).with_context(|| format!("while loading \"{}\"", path.display()))
    }

    /// Like `load`, but a missing or empty file gives an empty table.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(meta) if meta.len() > 0 => Self::load(path),
            Ok(_) => Ok(Self::default()),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("while loading \"{}\"", path.display())),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        let path = path.as_ref();
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("unable to save data to \"{}\"", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &csv::StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[csv::StringRecord] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<csv::StringRecord> {
        &mut self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get the named field of `row`, or `""` if the column or field doesn't exist.
    pub fn get<'a>(&self, row: &'a csv::StringRecord, name: &str) -> &'a str {
        self.column(name)
            .and_then(|idx| row.get(idx))
            .unwrap_or("")
    }
}

/// Load data with a header row into memory.
pub fn load_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?
        .into_deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("while loading \"{}\"", path.display()))
}

/// Load a file without a header row as raw records.
///
/// Rows may have differing numbers of fields.
pub fn load_headerless(path: impl AsRef<Path>) -> Result<Vec<csv::StringRecord>> {
    let path = path.as_ref();
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?
        .into_records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("while loading \"{}\"", path.display()))
}

/// Like `load_headerless`, but a missing file gives no rows.
pub fn load_headerless_optional(path: impl AsRef<Path>) -> Result<Vec<csv::StringRecord>> {
    let path = path.as_ref();
    if !file_exists(path)? {
        event!(
            Level::DEBUG,
            "\"{}\" not found, treating as empty",
            path.display()
        );
        return Ok(vec![]);
    }
    load_headerless(path)
}

/// Save rows to a CSV file with a header row.
pub fn save_csv<T: Serialize>(rows: &[T], path: impl AsRef<Path>) -> Result {
    fn inner<T: Serialize>(rows: &[T], path: &Path) -> Result {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("could not create parent")?;
            }
        }
        warn_overwrite(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
    let path = path.as_ref();
    inner(rows, path).with_context(|| format!("unable to save data to \"{}\"", path.display()))
}

/// Save raw records without a header row.
pub fn save_headerless(rows: &[csv::StringRecord], path: impl AsRef<Path>) -> Result {
    fn inner(rows: &[csv::StringRecord], path: &Path) -> Result {
        warn_overwrite(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
    let path = path.as_ref();
    inner(rows, path).with_context(|| format!("unable to save data to \"{}\"", path.display()))
}

/// Write a text report, replacing any existing file.
pub fn save_text(contents: &str, path: impl AsRef<Path>) -> Result {
    let path = path.as_ref();
    warn_overwrite(path)?;
    fs::write(path, contents)
        .with_context(|| format!("unable to write report to \"{}\"", path.display()))?;
    event!(Level::INFO, "wrote \"{}\"", path.display());
    Ok(())
}

fn warn_overwrite(path: &Path) -> Result {
    if file_exists(path)? {
        event!(
            Level::WARN,
            "overwriting existing file at \"{}\"",
            path.display()
        );
    }
    Ok(())
}

/// Converts a not found error to `Ok(false)`.
pub fn file_exists(path: &Path) -> io::Result<bool> {
    util::path_exists(path)
}

pub fn check_extension(path: &Path, ext: &str) -> Result<()> {
    ensure!(
        matches!(path.extension(), Some(p) if p == ext),
        "filename should end with `.{}`",
        ext
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn episode_records_default_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("episodes.csv");
        fs::write(&path, "date,mrn,endo\n12-03-2024,123,Smith\n").unwrap();

        let records = EpisodeRecord::load(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(records[0].endo, "Smith");
        assert_eq!(records[0].caecum, "");
    }

    #[test]
    fn raw_table_get_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "date,mrn\n01-01-2024,55\n").unwrap();

        let table = RawTable::load(&path).unwrap();
        let row = &table.rows()[0];
        assert_eq!(table.get(row, "mrn"), "55");
        assert_eq!(table.get(row, "missing"), "");
    }

    #[test]
    fn raw_table_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let table = RawTable::load_or_empty(dir.path().join("nope.csv")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn optional_headerless_missing_file() {
        let dir = TempDir::new().unwrap();
        let rows = load_headerless_optional(dir.path().join("nope.csv")).unwrap();
        assert!(rows.is_empty());
    }
}

//! CSV loading of the precomputed daily table.
//!
//! The table is produced upstream (prices plus indicator columns). The loader
//! only parses and validates it:
//! - `Date` and `Close` columns are required; `Open`/`High`/`Low` default to
//!   the close when absent
//! - Unknown columns (e.g. `Adj Close`) are ignored
//! - Blank, `NaN` or infinite indicator cells become `None`
//! - Rows whose close is missing, non-finite or not positive are skipped and
//!   reported
//!
//! The resulting series is fingerprinted with BLAKE3 so every report can be
//! traced back to the exact data it was computed on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use swingsignal_core::domain::{Column, PriceBar, PriceSeries, SeriesError};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("line {line}: cannot parse date '{value}'")]
    BadDate { line: u64, value: String },

    #[error("line {line}: cannot parse {column} value '{value}'")]
    BadNumber {
        line: u64,
        column: Column,
        value: String,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// A row dropped during loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub line: u64,
    pub date: NaiveDate,
    pub reason: String,
}

/// Loaded series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    /// BLAKE3 over symbol, dates and every numeric column.
    pub dataset_hash: String,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Load a CSV file. The symbol defaults to the file stem when `symbol` is `None`.
pub fn load_csv(path: &Path, symbol: Option<&str>) -> Result<LoadedSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let symbol = symbol
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_uppercase())
        })
        .unwrap_or_else(|| "UNKNOWN".to_string());
    parse_csv(file, &symbol)
}

/// Parse CSV from any reader.
pub fn parse_csv<R: Read>(reader: R, symbol: &str) -> Result<LoadedSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(is_date_header)
        .ok_or_else(|| LoadError::MissingColumn("Date".into()))?;

    let mapped: Vec<(usize, Column)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .filter_map(|(i, h)| Column::from_header(h).map(|c| (i, c)))
        .collect();
    if !mapped.iter().any(|(_, c)| *c == Column::Close) {
        return Err(LoadError::MissingColumn(Column::Close.header().into()));
    }
    let columns: Vec<Column> = mapped.iter().map(|(_, c)| *c).collect();

    let mut bars = Vec::new();
    let mut skipped_rows = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_date = record.get(date_idx).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            line,
            value: raw_date.to_string(),
        })?;

        let mut values = Vec::with_capacity(mapped.len());
        for &(idx, column) in &mapped {
            let raw = record.get(idx).unwrap_or("");
            values.push((column, parse_cell(raw, line, column)?));
        }

        let close = values
            .iter()
            .find(|(c, _)| *c == Column::Close)
            .and_then(|(_, v)| *v);
        let close = match close {
            Some(c) if c > 0.0 => c,
            other => {
                let reason = match other {
                    Some(c) => format!("non-positive close {c}"),
                    None => "missing close".to_string(),
                };
                warn!(line, %date, "skipping row: {reason}");
                skipped_rows.push(SkippedRow { line, date, reason });
                continue;
            }
        };

        let mut bar = PriceBar::from_close(date, close);
        for (column, value) in values {
            bar.set(column, value);
        }
        bars.push(bar);
    }

    let series = PriceSeries::new(symbol, bars, columns)?;
    let dataset_hash = dataset_hash(&series);
    debug!(
        symbol,
        bars = series.len(),
        skipped = skipped_rows.len(),
        hash = %dataset_hash,
        "parsed daily table"
    );

    Ok(LoadedSeries {
        series,
        dataset_hash,
        skipped_rows,
    })
}

/// Deterministic BLAKE3 fingerprint of a series.
///
/// Missing indicator values hash as a distinct marker byte, so `None` and
/// `Some(0.0)` never collide.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());

    for bar in series.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        for column in Column::ALL {
            match bar.get(column) {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}

fn is_date_header(header: &str) -> bool {
    let h = header.trim();
    h.eq_ignore_ascii_case("date") || h.eq_ignore_ascii_case("datetime")
}

/// `2024-01-02`, or a timestamp starting with one (`2024-01-02 00:00:00-05:00`).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_cell(raw: &str, line: u64, column: Column) -> Result<Option<f64>, LoadError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| LoadError::BadNumber {
        line,
        column,
        value: raw.to_string(),
    })?;
    Ok(Some(value).filter(|v| v.is_finite()))
}

//! PriceSeries: validated, date-ordered daily table for one symbol.
//!
//! The series is owned by whoever loaded it and is never mutated by the
//! analysis code. Classifiers only see a [`SeriesWindow`], a read-only prefix
//! `bars[0..=end]`, so a decision for day `i` cannot observe day `i + 1`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use super::bar::{Column, PriceBar};

/// Errors raised while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series '{symbol}' has no bars")]
    Empty { symbol: String },

    #[error("series '{symbol}' has duplicate date {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("series '{symbol}' is not date-ordered: {date} follows {previous}")]
    NonIncreasingDate {
        symbol: String,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

/// Lookup failure against an existing series.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PriceLookupError {
    #[error("date {date} not found in series")]
    DateNotFound { date: NaiveDate },
}

/// Daily bars with a strictly increasing date index.
///
/// Deserialization goes through [`PriceSeries::new`], so a stored series is
/// validated the same way as a freshly loaded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
    columns: BTreeSet<Column>,
}

#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    bars: Vec<PriceBar>,
    #[serde(default)]
    columns: BTreeSet<Column>,
}

impl TryFrom<RawSeries> for PriceSeries {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::new(raw.symbol, raw.bars, raw.columns)
    }
}

impl PriceSeries {
    /// Build a series with an explicit column set (e.g. the headers of a CSV file).
    ///
    /// Price columns are always part of the set.
    pub fn new(
        symbol: impl Into<String>,
        bars: Vec<PriceBar>,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }
        for pair in bars.windows(2) {
            let (previous, date) = (pair[0].date, pair[1].date);
            if date == previous {
                return Err(SeriesError::DuplicateDate { symbol, date });
            }
            if date < previous {
                return Err(SeriesError::NonIncreasingDate {
                    symbol,
                    previous,
                    date,
                });
            }
        }

        let mut columns: BTreeSet<Column> = columns.into_iter().collect();
        columns.extend(Column::ALL.into_iter().filter(|c| c.is_price()));

        Ok(Self {
            symbol,
            bars,
            columns,
        })
    }

    /// Build a series whose column set is inferred from the bars: an indicator
    /// column counts as present if any bar carries a value for it.
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let present: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|&c| c.is_price() || bars.iter().any(|b| b.get(c).is_some()))
            .collect();
        Self::new(symbol, bars, present)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Read-only prefix ending at `end` (inclusive). `end` is clamped to the last bar.
    pub fn window(&self, end: usize) -> SeriesWindow<'_> {
        let end = end.min(self.bars.len() - 1);
        SeriesWindow {
            bars: &self.bars[..=end],
            columns: &self.columns,
        }
    }

    /// The whole series as a window.
    pub fn full(&self) -> SeriesWindow<'_> {
        self.window(self.bars.len() - 1)
    }

    /// Index of the bar dated `date`.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Close on `date`, or `DateNotFound`.
    pub fn close_on(&self, date: NaiveDate) -> Result<f64, PriceLookupError> {
        self.index_of(date)
            .map(|i| self.bars[i].close)
            .ok_or(PriceLookupError::DateNotFound { date })
    }
}

/// Read-only view of `bars[0..=end]` plus the column set of the parent series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesWindow<'a> {
    bars: &'a [PriceBar],
    columns: &'a BTreeSet<Column>,
}

impl<'a> SeriesWindow<'a> {
    /// View over an arbitrary bar slice. Used when the caller already holds a prefix.
    pub fn new(bars: &'a [PriceBar], columns: &'a BTreeSet<Column>) -> Self {
        Self { bars, columns }
    }

    pub fn bars(&self) -> &'a [PriceBar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// First column from `required` that the series lacks.
    pub fn missing_column(&self, required: &[Column]) -> Option<Column> {
        required.iter().copied().find(|c| !self.has_column(*c))
    }

    /// Last bar of the window.
    pub fn last(&self) -> Option<&'a PriceBar> {
        self.bars.last()
    }

    /// Date of the last bar, i.e. the "as of" date of any reading on this window.
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.last().map(|b| b.date)
    }

    /// Trailing `n` bars, or `None` if the window is shorter.
    pub fn tail(&self, n: usize) -> Option<&'a [PriceBar]> {
        self.bars.len().checked_sub(n).map(|start| &self.bars[start..])
    }
}

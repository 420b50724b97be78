//! PriceBar: one trading day of prices plus precomputed indicator columns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily bar for a single symbol.
///
/// Prices are required. Indicator fields are produced upstream by the
/// indicator-computation collaborator and may be missing (blank cell, warmup
/// NaN), so they are `Option<f64>`. A NaN never survives construction through
/// [`PriceBar::set`]: it is stored as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

impl PriceBar {
    /// Bar with all four prices equal to `close` and no indicator values.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            adx: None,
            plus_di: None,
            minus_di: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            stoch_k: None,
            stoch_d: None,
        }
    }

    /// Read one column. Prices are always present.
    pub fn get(&self, column: Column) -> Option<f64> {
        match column {
            Column::Open => Some(self.open),
            Column::High => Some(self.high),
            Column::Low => Some(self.low),
            Column::Close => Some(self.close),
            Column::Volume => self.volume,
            Column::Rsi => self.rsi,
            Column::Macd => self.macd,
            Column::MacdSignal => self.macd_signal,
            Column::MacdHist => self.macd_hist,
            Column::Adx => self.adx,
            Column::PlusDi => self.plus_di,
            Column::MinusDi => self.minus_di,
            Column::BbUpper => self.bb_upper,
            Column::BbMiddle => self.bb_middle,
            Column::BbLower => self.bb_lower,
            Column::StochK => self.stoch_k,
            Column::StochD => self.stoch_d,
        }
    }

    /// Write one indicator column. NaN is normalized to `None`.
    ///
    /// Price columns ignore `None` and keep their previous value.
    pub fn set(&mut self, column: Column, value: Option<f64>) {
        let value = value.filter(|v| !v.is_nan());
        match column {
            Column::Open => self.open = value.unwrap_or(self.open),
            Column::High => self.high = value.unwrap_or(self.high),
            Column::Low => self.low = value.unwrap_or(self.low),
            Column::Close => self.close = value.unwrap_or(self.close),
            Column::Volume => self.volume = value,
            Column::Rsi => self.rsi = value,
            Column::Macd => self.macd = value,
            Column::MacdSignal => self.macd_signal = value,
            Column::MacdHist => self.macd_hist = value,
            Column::Adx => self.adx = value,
            Column::PlusDi => self.plus_di = value,
            Column::MinusDi => self.minus_di = value,
            Column::BbUpper => self.bb_upper = value,
            Column::BbMiddle => self.bb_middle = value,
            Column::BbLower => self.bb_lower = value,
            Column::StochK => self.stoch_k = value,
            Column::StochD => self.stoch_d = value,
        }
    }
}

/// Named column of the daily table, spelled the way the upstream table spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
    Rsi,
    Macd,
    MacdSignal,
    MacdHist,
    Adx,
    PlusDi,
    MinusDi,
    BbUpper,
    BbMiddle,
    BbLower,
    StochK,
    StochD,
}

impl Column {
    pub const ALL: [Column; 17] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
        Column::Rsi,
        Column::Macd,
        Column::MacdSignal,
        Column::MacdHist,
        Column::Adx,
        Column::PlusDi,
        Column::MinusDi,
        Column::BbUpper,
        Column::BbMiddle,
        Column::BbLower,
        Column::StochK,
        Column::StochD,
    ];

    /// External header name, e.g. `MACD_Signal` or `+DI`.
    pub fn header(self) -> &'static str {
        match self {
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
            Column::Rsi => "RSI",
            Column::Macd => "MACD",
            Column::MacdSignal => "MACD_Signal",
            Column::MacdHist => "MACD_Hist",
            Column::Adx => "ADX",
            Column::PlusDi => "+DI",
            Column::MinusDi => "-DI",
            Column::BbUpper => "BB_Upper",
            Column::BbMiddle => "BB_Middle",
            Column::BbLower => "BB_Lower",
            Column::StochK => "Stoch_%K",
            Column::StochD => "Stoch_%D",
        }
    }

    /// Parse a header. Case-insensitive, and accepts the unicode minus in `−DI`.
    pub fn from_header(header: &str) -> Option<Column> {
        let normalized = header.trim().replace('\u{2212}', "-");
        Column::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(&normalized))
    }

    /// Open/High/Low/Close are mandatory for every series.
    pub fn is_price(self) -> bool {
        matches!(self, Column::Open | Column::High | Column::Low | Column::Close)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

//! Indicator classifiers: map the latest indicator values to a discrete state.
//!
//! One canonical classifier per indicator:
//! - [`RsiClassifier`]: trend regime plus overextension state
//! - [`MacdClassifier`]: MACD/signal regime plus histogram momentum
//! - [`AdxClassifier`]: trend strength regime, DI direction as a label
//! - [`BollingerClassifier`]: price position inside the bands
//! - [`StochasticClassifier`]: %K/%D crossover timing
//!
//! Every classifier reads a [`SeriesWindow`] and never fails: missing columns,
//! short windows and blank values produce a sentinel reading carrying an
//! [`InsufficientData`] issue, so the combiners downstream always receive a
//! well-formed value.

pub mod adx;
pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use adx::{AdxClassifier, AdxConfig, AdxReading, AdxRegime, AdxState, TrendAcceleration};
pub use bollinger::{BollingerClassifier, BollingerReading, BollingerState};
pub use macd::{MacdClassifier, MacdConfig, MacdPoint, MacdReading, MacdState};
pub use rsi::{RsiClassifier, RsiConfig, RsiHistory, RsiReading, RsiRegime, RsiState};
pub use stochastic::{StochasticClassifier, StochasticConfig, StochasticReading, StochasticState};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{Column, PriceBar, SeriesWindow};

// ─── Shared vocabulary ──────────────────────────────────────────────

/// Which indicator a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Rsi,
    Macd,
    Adx,
    Bollinger,
    Stochastic,
}

impl Indicator {
    pub fn name(self) -> &'static str {
        match self {
            Indicator::Rsi => "RSI",
            Indicator::Macd => "MACD",
            Indicator::Adx => "ADX",
            Indicator::Bollinger => "Bollinger",
            Indicator::Stochastic => "Stochastic",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a two-line comparison (MACD vs signal, +DI vs −DI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendDirection {
    /// Compare a fast line against a slow line. Exact equality is neutral.
    pub fn compare(fast: f64, slow: f64) -> Self {
        if fast > slow {
            TrendDirection::Bullish
        } else if fast < slow {
            TrendDirection::Bearish
        } else {
            TrendDirection::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Bullish => "bullish",
            TrendDirection::Bearish => "bearish",
            TrendDirection::Neutral => "neutral",
        }
    }
}

/// Crossing of a fast line through a slow line between two bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cross {
    Bullish,
    Bearish,
}

impl Cross {
    /// Bullish when fast was below slow and is now above; bearish on the mirror.
    pub fn detect(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Option<Cross> {
        if prev_fast < prev_slow && fast > slow {
            Some(Cross::Bullish)
        } else if prev_fast > prev_slow && fast < slow {
            Some(Cross::Bearish)
        } else {
            None
        }
    }
}

/// Side a bias leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lean {
    Long,
    Short,
}

/// Strategic inclination implied by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    MeanReversionLong,
    MeanReversionShort,
    TrendFollowLong,
    TrendFollowShort,
    TrendFollowNeutral,
    CautionLong,
    CautionShort,
    MeanReversion,
    Wait,
    WaitForConfirmation,
    RiskOfReversal,
    RiskManagement,
    None,
}

impl Bias {
    pub fn label(self) -> &'static str {
        match self {
            Bias::MeanReversionLong => "mean_reversion_long",
            Bias::MeanReversionShort => "mean_reversion_short",
            Bias::TrendFollowLong => "trend_follow_long",
            Bias::TrendFollowShort => "trend_follow_short",
            Bias::TrendFollowNeutral => "trend_follow_neutral",
            Bias::CautionLong => "caution_long",
            Bias::CautionShort => "caution_short",
            Bias::MeanReversion => "mean_reversion",
            Bias::Wait => "wait",
            Bias::WaitForConfirmation => "wait_for_confirmation",
            Bias::RiskOfReversal => "risk_of_reversal",
            Bias::RiskManagement => "risk_management",
            Bias::None => "none",
        }
    }

    /// Side the bias leans toward, if any. Caution biases still lean: a
    /// weakening uptrend is an uptrend.
    pub fn lean(self) -> Option<Lean> {
        match self {
            Bias::MeanReversionLong | Bias::TrendFollowLong | Bias::CautionLong => Some(Lean::Long),
            Bias::MeanReversionShort | Bias::TrendFollowShort | Bias::CautionShort => {
                Some(Lean::Short)
            }
            _ => None,
        }
    }

    /// Actionable signal of the bias: only the entry biases vote.
    pub fn signal(self) -> Signal {
        match self {
            Bias::MeanReversionLong | Bias::TrendFollowLong => Signal::Buy,
            Bias::MeanReversionShort | Bias::TrendFollowShort => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniform −1 / 0 / +1 vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    /// Sign of a score: positive buys, negative sells, zero holds.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Signal::Buy
        } else if score < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::Sell => "sell",
            Signal::Hold => "hold",
            Signal::Buy => "buy",
        }
    }
}

/// Fixed descriptive text attached to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub headline: &'static str,
    pub meaning: &'static str,
    pub chance: &'static str,
    pub risk: &'static str,
    pub action_hint: &'static str,
}

impl Narrative {
    pub const fn new(
        headline: &'static str,
        meaning: &'static str,
        chance: &'static str,
        risk: &'static str,
        action_hint: &'static str,
    ) -> Self {
        Self {
            headline,
            meaning,
            chance,
            risk,
            action_hint,
        }
    }

    /// Narrative of a sentinel reading.
    pub const INVALID: Narrative = Narrative::new(
        "No data",
        "The indicator could not be evaluated on the available data.",
        "-",
        "-",
        "Wait until enough data is available.",
    );
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Why a classifier fell back to its sentinel reading.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsufficientData {
    #[error("{indicator}: column {column} is missing")]
    MissingColumn { indicator: Indicator, column: Column },

    #[error("{indicator}: needs {required} rows, got {available}")]
    TooFewRows {
        indicator: Indicator,
        required: usize,
        available: usize,
    },

    #[error("{indicator}: no {column} value on {date}")]
    MissingValue {
        indicator: Indicator,
        column: Column,
        date: NaiveDate,
    },
}

// ─── Uniform reading interface ──────────────────────────────────────

/// Common view over the five per-indicator readings.
pub trait IndicatorReading {
    fn indicator(&self) -> Indicator;

    /// Textual state label, e.g. `oversold` or `bullish_expansion`.
    fn label(&self) -> &'static str;

    fn signal(&self) -> Signal;

    /// Normalized magnitude in `[0, 1]`.
    fn strength(&self) -> f64;

    fn narrative(&self) -> Narrative;

    /// Set on sentinel readings.
    fn issue(&self) -> Option<&InsufficientData>;

    fn is_valid(&self) -> bool {
        self.issue().is_none()
    }

    fn summary(&self) -> ReadingSummary {
        ReadingSummary {
            indicator: self.indicator(),
            signal: self.signal(),
            label: self.label().to_string(),
            strength: self.strength(),
            headline: self.narrative().headline.to_string(),
        }
    }
}

/// Tagged result shared by all indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSummary {
    pub indicator: Indicator,
    pub signal: Signal,
    pub label: String,
    pub strength: f64,
    pub headline: String,
}

// ─── Window access helpers ──────────────────────────────────────────

/// Trailing `rows` bars after checking that every `columns` entry exists.
pub(crate) fn trailing<'a>(
    window: &SeriesWindow<'a>,
    indicator: Indicator,
    columns: &[Column],
    rows: usize,
) -> Result<&'a [PriceBar], InsufficientData> {
    if let Some(column) = window.missing_column(columns) {
        return Err(InsufficientData::MissingColumn { indicator, column });
    }
    window.tail(rows).ok_or(InsufficientData::TooFewRows {
        indicator,
        required: rows,
        available: window.len(),
    })
}

/// Value of `column` on `bar`, or `MissingValue`.
pub(crate) fn value(
    bar: &PriceBar,
    indicator: Indicator,
    column: Column,
) -> Result<f64, InsufficientData> {
    bar.get(column)
        .filter(|v| v.is_finite())
        .ok_or(InsufficientData::MissingValue {
            indicator,
            column,
            date: bar.date,
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::PriceSeries;

    pub fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(n)
    }

    /// Series of `rows.len()` bars; each closure fills in one bar.
    pub fn series_with(rows: usize, fill: impl Fn(usize, &mut PriceBar)) -> PriceSeries {
        let bars = (0..rows)
            .map(|i| {
                let mut bar = PriceBar::from_close(day(i as i64), 100.0);
                fill(i, &mut bar);
                bar
            })
            .collect();
        PriceSeries::from_bars("TEST", bars).unwrap()
    }

    /// Series with one indicator column populated from `values`.
    pub fn single_column(column: Column, values: &[f64]) -> PriceSeries {
        series_with(values.len(), |i, bar| bar.set(column, Some(values[i])))
    }
}

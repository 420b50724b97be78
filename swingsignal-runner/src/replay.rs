//! Historical replay: one signal record per day from a growing window.
//!
//! Day `i` is evaluated on `series.window(i)`, the prefix `bars[0..=i]`, so a
//! record can never see later bars. Days are independent, which lets rayon
//! partition them by index; results are collected in index order and then
//! stably sorted by date.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use swingsignal_core::classify::{Bias, RsiState, Signal};
use swingsignal_core::decision::Action;
use swingsignal_core::domain::{PriceSeries, SeriesWindow};
use swingsignal_core::regime::MarketRegime;
use swingsignal_core::Analyzer;

use crate::config::EvaluationMode;

/// One replayed day.
///
/// Decision mode fills the regime and decision fields; composite mode fills
/// `composite_score`. Raw RSI and ADX values are carried in both modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
    pub action: Option<Action>,
    pub confidence: Option<f64>,
    pub market_regime: Option<MarketRegime>,
    pub rsi_state: Option<RsiState>,
    pub rsi_value: Option<f64>,
    pub macd_bias: Option<Bias>,
    pub adx_value: Option<f64>,
    pub composite_score: Option<f64>,
}

impl SignalRecord {
    pub fn is_buy(&self) -> bool {
        self.signal == Signal::Buy
    }
}

/// Replays the analysis pipeline over every day from `min_window` on.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    analyzer: Analyzer,
    min_window: usize,
    mode: EvaluationMode,
}

impl SignalGenerator {
    pub fn new(analyzer: Analyzer, min_window: usize, mode: EvaluationMode) -> Self {
        Self {
            analyzer,
            min_window,
            mode,
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Records for days `min_window..len`, sorted by date. Empty when the
    /// series is not longer than `min_window`.
    pub fn generate(&self, series: &PriceSeries) -> Vec<SignalRecord> {
        let mut records: Vec<SignalRecord> = (self.min_window..series.len())
            .into_par_iter()
            .filter_map(|i| self.record(&series.window(i)))
            .collect();
        records.sort_by_key(|r| r.date);
        records
    }

    /// Record for the last bar of `window`.
    pub fn record(&self, window: &SeriesWindow<'_>) -> Option<SignalRecord> {
        let bar = window.last()?;
        let record = match self.mode {
            EvaluationMode::Decision => {
                let analysis = self.analyzer.analyze(window);
                let action = analysis.decision.action;
                SignalRecord {
                    date: bar.date,
                    close: bar.close,
                    signal: action.signal(),
                    action: Some(action),
                    confidence: Some(analysis.decision.confidence),
                    market_regime: Some(analysis.regime.market_regime),
                    rsi_state: Some(analysis.rsi.state),
                    rsi_value: analysis.rsi.value,
                    macd_bias: Some(analysis.macd.bias),
                    adx_value: analysis.adx.adx,
                    composite_score: None,
                }
            }
            EvaluationMode::Composite => {
                let composite = self.analyzer.composite(window);
                SignalRecord {
                    date: bar.date,
                    close: bar.close,
                    signal: composite.signal,
                    action: None,
                    confidence: None,
                    market_regime: None,
                    rsi_state: None,
                    rsi_value: bar.rsi,
                    macd_bias: None,
                    adx_value: bar.adx,
                    composite_score: Some(composite.score),
                }
            }
        };
        Some(record)
    }
}

/// Dates of all buy records.
pub fn buy_dates(records: &[SignalRecord]) -> Vec<NaiveDate> {
    records.iter().filter(|r| r.is_buy()).map(|r| r.date).collect()
}

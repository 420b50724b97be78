//! MACD classifier: regime from MACD vs signal line, momentum from the histogram.

use serde::{Deserialize, Serialize};

use super::{
    trailing, value, Bias, Indicator, IndicatorReading, InsufficientData, Narrative, Signal,
    TrendDirection,
};
use crate::domain::{Column, SeriesWindow};

const COLUMNS: [Column; 3] = [Column::Macd, Column::MacdSignal, Column::MacdHist];

/// MACD thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    /// Histogram level an expansion must exceed.
    pub min_hist_strength: f64,
    /// Strength per unit of histogram in expansion states.
    pub expansion_scale: f64,
    /// Strength per unit of histogram change in weakening states.
    pub weakening_scale: f64,
    /// Fixed strength of a steady trend.
    pub steady_strength: f64,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            min_hist_strength: 0.05,
            expansion_scale: 5.0,
            weakening_scale: 3.0,
            steady_strength: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdState {
    BullishExpansion,
    BullishWeakening,
    BullishNeutral,
    BearishExpansion,
    BearishWeakening,
    BearishNeutral,
    Transition,
    Invalid,
}

impl MacdState {
    pub fn label(self) -> &'static str {
        match self {
            MacdState::BullishExpansion => "bullish_expansion",
            MacdState::BullishWeakening => "bullish_weakening",
            MacdState::BullishNeutral => "bullish_neutral",
            MacdState::BearishExpansion => "bearish_expansion",
            MacdState::BearishWeakening => "bearish_weakening",
            MacdState::BearishNeutral => "bearish_neutral",
            MacdState::Transition => "transition",
            MacdState::Invalid => "invalid",
        }
    }

    pub fn bias(self) -> Bias {
        match self {
            MacdState::BullishExpansion | MacdState::BullishNeutral => Bias::TrendFollowLong,
            MacdState::BullishWeakening => Bias::CautionLong,
            MacdState::BearishExpansion | MacdState::BearishNeutral => Bias::TrendFollowShort,
            MacdState::BearishWeakening => Bias::CautionShort,
            MacdState::Transition => Bias::Wait,
            MacdState::Invalid => Bias::None,
        }
    }

    pub fn narrative(self) -> Narrative {
        match self {
            MacdState::BullishExpansion => Narrative::new(
                "Uptrend accelerating",
                "The market is in an uptrend and momentum keeps building.",
                "Trend continuation with rising momentum is likely.",
                "Late entries can run into pullbacks.",
                "Follow the trend and wait for a pullback to enter.",
            ),
            MacdState::BullishWeakening => Narrative::new(
                "Uptrend losing momentum",
                "The larger trend is positive but momentum is fading.",
                "A sideways phase or short consolidation is possible.",
                "The trend can tip over if momentum keeps falling.",
                "Protect long positions or take partial profits.",
            ),
            MacdState::BullishNeutral => Narrative::new(
                "Steady uptrend",
                "The market rises without additional acceleration.",
                "Solid trend continuation is possible.",
                "Missing momentum can turn into a sideways move.",
                "Hold the trend and watch for momentum to pick up.",
            ),
            MacdState::BearishExpansion => Narrative::new(
                "Downtrend intensifying",
                "The market is in a clear downtrend with growing selling pressure.",
                "Further losses are likely.",
                "Technical counter moves can be abrupt.",
                "Prefer shorts or avoid longs.",
            ),
            MacdState::BearishWeakening => Narrative::new(
                "Selling pressure easing",
                "The downtrend is losing momentum.",
                "A recovery or sideways phase is possible.",
                "The trend can resume after a short pause.",
                "Lock in short profits and wait for confirmation.",
            ),
            MacdState::BearishNeutral => Narrative::new(
                "Steady downtrend",
                "The market falls evenly without additional acceleration.",
                "Further decline is likely.",
                "Sudden counter moves are possible.",
                "Stay short-oriented and respect stops.",
            ),
            MacdState::Transition => Narrative::new(
                "Trend change phase",
                "The MACD shows no clear trend direction right now.",
                "A new trend may develop.",
                "More false signals during transitions.",
                "Wait and rely on other indicators.",
            ),
            MacdState::Invalid => Narrative::INVALID,
        }
    }
}

/// Result of one MACD classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
    /// `None` on sentinel readings.
    pub regime: Option<TrendDirection>,
    pub state: MacdState,
    pub bias: Bias,
    pub strength: f64,
    /// Histogram change against the previous bar.
    pub histogram_delta: Option<f64>,
    /// MACD line change against the previous bar.
    pub macd_delta: Option<f64>,
    pub issue: Option<InsufficientData>,
}

impl MacdReading {
    pub fn invalid(issue: InsufficientData) -> Self {
        Self {
            macd: None,
            signal_line: None,
            histogram: None,
            regime: None,
            state: MacdState::Invalid,
            bias: Bias::None,
            strength: 0.0,
            histogram_delta: None,
            macd_delta: None,
            issue: Some(issue),
        }
    }
}

impl IndicatorReading for MacdReading {
    fn indicator(&self) -> Indicator {
        Indicator::Macd
    }

    fn label(&self) -> &'static str {
        self.state.label()
    }

    fn signal(&self) -> Signal {
        self.bias.signal()
    }

    fn strength(&self) -> f64 {
        self.strength
    }

    fn narrative(&self) -> Narrative {
        self.state.narrative()
    }

    fn issue(&self) -> Option<&InsufficientData> {
        self.issue.as_ref()
    }
}

/// Latest and previous values of the three MACD columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub hist: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MacdClassifier {
    config: MacdConfig,
}

impl MacdClassifier {
    /// Rows required: the third-to-last bar is not read but must exist.
    pub const MIN_ROWS: usize = 3;

    pub fn new(config: MacdConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, window: &SeriesWindow<'_>) -> MacdReading {
        match self.try_classify(window) {
            Ok(reading) => reading,
            Err(issue) => MacdReading::invalid(issue),
        }
    }

    fn try_classify(&self, window: &SeriesWindow<'_>) -> Result<MacdReading, InsufficientData> {
        let rows = trailing(window, Indicator::Macd, &COLUMNS, Self::MIN_ROWS)?;
        let point = |i: usize| -> Result<MacdPoint, InsufficientData> {
            Ok(MacdPoint {
                macd: value(&rows[i], Indicator::Macd, Column::Macd)?,
                signal: value(&rows[i], Indicator::Macd, Column::MacdSignal)?,
                hist: value(&rows[i], Indicator::Macd, Column::MacdHist)?,
            })
        };
        let prev = point(1)?;
        let last = point(2)?;
        Ok(self.classify_points(prev, last))
    }

    pub fn classify_points(&self, prev: MacdPoint, last: MacdPoint) -> MacdReading {
        let c = &self.config;
        let regime = TrendDirection::compare(last.macd, last.signal);
        let hist_delta = last.hist - prev.hist;
        let hist = last.hist;

        let (state, strength) = match regime {
            TrendDirection::Bullish => {
                if hist > c.min_hist_strength && hist_delta > 0.0 {
                    (MacdState::BullishExpansion, (hist.abs() * c.expansion_scale).min(1.0))
                } else if hist_delta < 0.0 {
                    (
                        MacdState::BullishWeakening,
                        (hist_delta.abs() * c.weakening_scale).min(1.0),
                    )
                } else {
                    (MacdState::BullishNeutral, c.steady_strength)
                }
            }
            TrendDirection::Bearish => {
                if hist < -c.min_hist_strength && hist_delta < 0.0 {
                    (MacdState::BearishExpansion, (hist.abs() * c.expansion_scale).min(1.0))
                } else if hist_delta > 0.0 {
                    (
                        MacdState::BearishWeakening,
                        (hist_delta.abs() * c.weakening_scale).min(1.0),
                    )
                } else {
                    (MacdState::BearishNeutral, c.steady_strength)
                }
            }
            TrendDirection::Neutral => (MacdState::Transition, 0.0),
        };

        MacdReading {
            macd: Some(last.macd),
            signal_line: Some(last.signal),
            histogram: Some(hist),
            regime: Some(regime),
            state,
            bias: state.bias(),
            strength,
            histogram_delta: Some(hist_delta),
            macd_delta: Some(last.macd - prev.macd),
            issue: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support::series_with;

    const EPS: f64 = 1e-9;

    fn point(macd: f64, signal: f64, hist: f64) -> MacdPoint {
        MacdPoint { macd, signal, hist }
    }

    fn classify(prev: MacdPoint, last: MacdPoint) -> MacdReading {
        MacdClassifier::default().classify_points(prev, last)
    }

    #[test]
    fn bullish_expansion() {
        let r = classify(point(0.5, 0.4, 0.08), point(0.7, 0.5, 0.12));
        assert_eq!(r.regime, Some(TrendDirection::Bullish));
        assert_eq!(r.state, MacdState::BullishExpansion);
        assert_eq!(r.bias, Bias::TrendFollowLong);
        assert!((r.strength - 0.6).abs() < EPS);
        assert!((r.macd_delta.unwrap() - 0.2).abs() < EPS);
    }

    #[test]
    fn bullish_weakening() {
        let r = classify(point(0.7, 0.5, 0.2), point(0.6, 0.5, 0.1));
        assert_eq!(r.state, MacdState::BullishWeakening);
        assert_eq!(r.bias, Bias::CautionLong);
        assert!((r.strength - 0.3).abs() < EPS);
    }

    #[test]
    fn bullish_neutral_when_histogram_small_and_rising() {
        let r = classify(point(0.5, 0.49, 0.01), point(0.52, 0.5, 0.02));
        assert_eq!(r.state, MacdState::BullishNeutral);
        assert!((r.strength - 0.2).abs() < EPS);
    }

    #[test]
    fn bearish_expansion_and_weakening() {
        let r = classify(point(-0.5, -0.4, -0.1), point(-0.7, -0.5, -0.2));
        assert_eq!(r.state, MacdState::BearishExpansion);
        assert_eq!(r.bias, Bias::TrendFollowShort);
        assert!((r.strength - 1.0).abs() < EPS);

        let r = classify(point(-0.7, -0.5, -0.2), point(-0.6, -0.5, -0.1));
        assert_eq!(r.state, MacdState::BearishWeakening);
        assert_eq!(r.bias, Bias::CautionShort);
    }

    #[test]
    fn bearish_neutral_when_histogram_flat() {
        let r = classify(point(-0.5, -0.4, -0.02), point(-0.52, -0.5, -0.02));
        assert_eq!(r.state, MacdState::BearishNeutral);
        assert_eq!(r.bias, Bias::TrendFollowShort);
    }

    #[test]
    fn equal_lines_are_transition() {
        let r = classify(point(0.5, 0.4, 0.1), point(0.5, 0.5, 0.0));
        assert_eq!(r.regime, Some(TrendDirection::Neutral));
        assert_eq!(r.state, MacdState::Transition);
        assert_eq!(r.bias, Bias::Wait);
        assert_eq!(r.strength, 0.0);
        assert_eq!(r.signal(), Signal::Hold);
    }

    #[test]
    fn needs_three_rows() {
        let series = series_with(2, |_, bar| {
            bar.macd = Some(1.0);
            bar.macd_signal = Some(0.5);
            bar.macd_hist = Some(0.5);
        });
        let r = MacdClassifier::default().classify(&series.full());
        assert_eq!(r.state, MacdState::Invalid);
        assert_eq!(r.regime, None);
        assert!(matches!(
            r.issue,
            Some(InsufficientData::TooFewRows { required: 3, available: 2, .. })
        ));
    }

    #[test]
    fn missing_histogram_column_is_invalid() {
        let series = series_with(5, |_, bar| {
            bar.macd = Some(1.0);
            bar.macd_signal = Some(0.5);
        });
        let r = MacdClassifier::default().classify(&series.full());
        assert!(matches!(
            r.issue,
            Some(InsufficientData::MissingColumn { column: Column::MacdHist, .. })
        ));
    }

    #[test]
    fn reads_last_two_bars_of_window() {
        let series = series_with(4, |i, bar| {
            bar.macd = Some(0.1 * i as f64);
            bar.macd_signal = Some(0.0);
            bar.macd_hist = Some(0.1 * i as f64);
        });
        let r = MacdClassifier::default().classify(&series.window(2));
        // hist 0.2 > 0.05 and rising
        assert_eq!(r.state, MacdState::BullishExpansion);
        assert!((r.histogram.unwrap() - 0.2).abs() < EPS);
    }
}

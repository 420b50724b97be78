//! Bollinger classifier: where the latest close sits relative to the bands.

use serde::{Deserialize, Serialize};

use super::{trailing, value, Indicator, IndicatorReading, InsufficientData, Narrative, Signal};
use crate::domain::{Column, SeriesWindow};

const COLUMNS: [Column; 4] = [Column::Close, Column::BbUpper, Column::BbMiddle, Column::BbLower];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerState {
    BelowLower,
    LowerHalf,
    AboveUpper,
    Neutral,
    Invalid,
}

impl BollingerState {
    pub fn label(self) -> &'static str {
        match self {
            BollingerState::BelowLower => "below_lower",
            BollingerState::LowerHalf => "lower_half",
            BollingerState::AboveUpper => "above_upper",
            BollingerState::Neutral => "neutral",
            BollingerState::Invalid => "invalid",
        }
    }

    /// Price-level attractiveness used by the entry-quality score.
    pub fn score(self) -> f64 {
        match self {
            BollingerState::BelowLower => 1.0,
            BollingerState::LowerHalf => 0.5,
            BollingerState::AboveUpper => -1.0,
            BollingerState::Neutral | BollingerState::Invalid => 0.0,
        }
    }

    pub fn narrative(self) -> Narrative {
        match self {
            BollingerState::BelowLower => Narrative::new(
                "Price at the lower band",
                "Price trades at the lower band, pointing to strong undervaluation and \
                 elevated volatility. This can be an attractive long entry zone.",
                "Attractive entry if a bottom forms.",
                "The market could keep falling despite being oversold.",
                "Possible buy signal, mind the risk.",
            ),
            BollingerState::LowerHalf => Narrative::new(
                "Price in the lower half",
                "Price moves in the lower half of the bands with moderate volatility \
                 and no extreme moves.",
                "Favourable zone with moderate upside.",
                "The trend could stay flat or weak.",
                "Long position possible, watch the trend.",
            ),
            BollingerState::AboveUpper => Narrative::new(
                "Price above the upper band",
                "Price trades above the upper band and is overstretched. \
                 A technical counter reaction is likely.",
                "Strong upward momentum is present.",
                "High probability of a technical pullback.",
                "Be careful with new entries and consider taking profits.",
            ),
            BollingerState::Neutral => Narrative::new(
                "Price near the middle band",
                "Price sits near the middle band: a stable phase without clear over- \
                 or undervaluation.",
                "The market is stable without extremes.",
                "No clear signal and a possible sideways move.",
                "Wait or use a sideways strategy.",
            ),
            BollingerState::Invalid => Narrative::INVALID,
        }
    }
}

/// Result of one Bollinger classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub close: Option<f64>,
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
    pub state: BollingerState,
    pub score: f64,
    /// `(upper - lower) / middle`; `None` when the middle band is zero.
    pub bandwidth: Option<f64>,
    pub issue: Option<InsufficientData>,
}

impl BollingerReading {
    pub fn invalid(issue: InsufficientData) -> Self {
        Self {
            close: None,
            upper: None,
            middle: None,
            lower: None,
            state: BollingerState::Invalid,
            score: 0.0,
            bandwidth: None,
            issue: Some(issue),
        }
    }
}

impl IndicatorReading for BollingerReading {
    fn indicator(&self) -> Indicator {
        Indicator::Bollinger
    }

    fn label(&self) -> &'static str {
        self.state.label()
    }

    fn signal(&self) -> Signal {
        Signal::from_score(self.score)
    }

    fn strength(&self) -> f64 {
        self.score.abs()
    }

    fn narrative(&self) -> Narrative {
        self.state.narrative()
    }

    fn issue(&self) -> Option<&InsufficientData> {
        self.issue.as_ref()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerClassifier;

impl BollingerClassifier {
    pub fn classify(&self, window: &SeriesWindow<'_>) -> BollingerReading {
        match self.try_classify(window) {
            Ok(reading) => reading,
            Err(issue) => BollingerReading::invalid(issue),
        }
    }

    fn try_classify(&self, window: &SeriesWindow<'_>) -> Result<BollingerReading, InsufficientData> {
        let rows = trailing(window, Indicator::Bollinger, &COLUMNS, 1)?;
        let bar = &rows[0];
        let close = bar.close;
        let upper = value(bar, Indicator::Bollinger, Column::BbUpper)?;
        let middle = value(bar, Indicator::Bollinger, Column::BbMiddle)?;
        let lower = value(bar, Indicator::Bollinger, Column::BbLower)?;
        Ok(self.classify_values(close, upper, middle, lower))
    }

    pub fn classify_values(&self, close: f64, upper: f64, middle: f64, lower: f64) -> BollingerReading {
        let state = if close <= lower {
            BollingerState::BelowLower
        } else if close < middle {
            BollingerState::LowerHalf
        } else if close > upper {
            BollingerState::AboveUpper
        } else {
            BollingerState::Neutral
        };

        BollingerReading {
            close: Some(close),
            upper: Some(upper),
            middle: Some(middle),
            lower: Some(lower),
            state,
            score: state.score(),
            bandwidth: (middle != 0.0).then(|| (upper - lower) / middle),
            issue: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support::series_with;

    fn classify(close: f64) -> BollingerReading {
        BollingerClassifier.classify_values(close, 110.0, 100.0, 90.0)
    }

    #[test]
    fn states_by_price_position() {
        assert_eq!(classify(85.0).state, BollingerState::BelowLower);
        assert_eq!(classify(90.0).state, BollingerState::BelowLower);
        assert_eq!(classify(95.0).state, BollingerState::LowerHalf);
        assert_eq!(classify(100.0).state, BollingerState::Neutral);
        assert_eq!(classify(110.0).state, BollingerState::Neutral);
        assert_eq!(classify(111.0).state, BollingerState::AboveUpper);
    }

    #[test]
    fn scores_and_signals() {
        assert_eq!(classify(85.0).score, 1.0);
        assert_eq!(classify(95.0).score, 0.5);
        assert_eq!(classify(111.0).score, -1.0);
        assert_eq!(classify(111.0).signal(), Signal::Sell);
        assert_eq!(classify(105.0).signal(), Signal::Hold);
    }

    #[test]
    fn bandwidth_is_relative_to_middle() {
        let r = classify(100.0);
        assert!((r.bandwidth.unwrap() - 0.2).abs() < 1e-12);
        let flat = BollingerClassifier.classify_values(0.0, 0.0, 0.0, 0.0);
        assert_eq!(flat.bandwidth, None);
    }

    #[test]
    fn missing_band_is_invalid() {
        let series = series_with(2, |_, bar| {
            bar.bb_upper = Some(110.0);
            bar.bb_lower = Some(90.0);
        });
        let r = BollingerClassifier.classify(&series.full());
        assert_eq!(r.state, BollingerState::Invalid);
        assert_eq!(r.score, 0.0);
        assert!(matches!(
            r.issue,
            Some(InsufficientData::MissingColumn { column: Column::BbMiddle, .. })
        ));
    }

    #[test]
    fn classifies_latest_bar() {
        let series = series_with(2, |i, bar| {
            bar.close = if i == 0 { 120.0 } else { 92.0 };
            bar.bb_upper = Some(110.0);
            bar.bb_middle = Some(100.0);
            bar.bb_lower = Some(90.0);
        });
        let r = BollingerClassifier.classify(&series.full());
        assert_eq!(r.state, BollingerState::LowerHalf);
        assert_eq!(r.close, Some(92.0));
    }
}

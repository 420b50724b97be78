//! Stochastic classifier: entry timing from %K/%D crossovers and levels.

use serde::{Deserialize, Serialize};

use super::{
    trailing, value, Cross, Indicator, IndicatorReading, InsufficientData, Narrative, Signal,
};
use crate::domain::{Column, SeriesWindow};

const COLUMNS: [Column; 2] = [Column::StochK, Column::StochD];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticConfig {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StochasticState {
    OversoldReversal,
    OverboughtReversal,
    BullishMomentum,
    BearishMomentum,
    Neutral,
    Invalid,
}

impl StochasticState {
    pub fn label(self) -> &'static str {
        match self {
            StochasticState::OversoldReversal => "oversold_reversal",
            StochasticState::OverboughtReversal => "overbought_reversal",
            StochasticState::BullishMomentum => "bullish_momentum",
            StochasticState::BearishMomentum => "bearish_momentum",
            StochasticState::Neutral => "neutral",
            StochasticState::Invalid => "invalid",
        }
    }

    /// Timing attractiveness used by the entry-quality score.
    pub fn score(self) -> f64 {
        match self {
            StochasticState::OversoldReversal => 1.0,
            StochasticState::OverboughtReversal => -1.0,
            StochasticState::BullishMomentum => 0.5,
            StochasticState::BearishMomentum => -0.5,
            StochasticState::Neutral | StochasticState::Invalid => 0.0,
        }
    }

    pub fn narrative(self) -> Narrative {
        match self {
            StochasticState::OversoldReversal => Narrative::new(
                "Oversold bullish signal",
                "The oscillator is oversold and %K just crossed above %D. \
                 This can be a good opportunity for a technical rebound or reversal.",
                "High probability of a recovery or trend change.",
                "The signal can fail in a strong downtrend and needs confirmation.",
                "Consider a long position and set a stop-loss.",
            ),
            StochasticState::OverboughtReversal => Narrative::new(
                "Overbought bearish signal",
                "The oscillator is overbought and %K just crossed below %D, \
                 pointing to a possible pullback or reversal.",
                "Potential for a short-term correction or reversal.",
                "The signal could be a false break while the trend continues.",
                "Secure profits and check short positions.",
            ),
            StochasticState::BullishMomentum => Narrative::new(
                "Positive momentum",
                "Momentum is on the long side without an overbought extreme.",
                "Uptrend continuation with moderate risk.",
                "The market can consolidate or correct briefly.",
                "Hold or add to positions.",
            ),
            StochasticState::BearishMomentum => Narrative::new(
                "Negative momentum",
                "Momentum is on the short side without an oversold extreme.",
                "Possible reversal or short-term recovery.",
                "The weakness may only be a pause in a downtrend.",
                "Be careful and respect stops.",
            ),
            StochasticState::Neutral => Narrative::new(
                "No clear timing",
                "The oscillator gives no clear reversal or momentum signal.",
                "The market may decide soon and offer good entries.",
                "An undecided phase carries uncertainty.",
                "Wait and observe.",
            ),
            StochasticState::Invalid => Narrative::INVALID,
        }
    }
}

/// Result of one Stochastic classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub cross: Option<Cross>,
    pub state: StochasticState,
    pub score: f64,
    pub issue: Option<InsufficientData>,
}

impl StochasticReading {
    pub fn invalid(issue: InsufficientData) -> Self {
        Self {
            k: None,
            d: None,
            cross: None,
            state: StochasticState::Invalid,
            score: 0.0,
            issue: Some(issue),
        }
    }
}

impl IndicatorReading for StochasticReading {
    fn indicator(&self) -> Indicator {
        Indicator::Stochastic
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

#[derive(Debug, Clone, Default)]
pub struct StochasticClassifier {
    config: StochasticConfig,
}

impl StochasticClassifier {
    pub fn new(config: StochasticConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, window: &SeriesWindow<'_>) -> StochasticReading {
        match self.try_classify(window) {
            Ok(reading) => reading,
            Err(issue) => StochasticReading::invalid(issue),
        }
    }

    fn try_classify(&self, window: &SeriesWindow<'_>) -> Result<StochasticReading, InsufficientData> {
        let rows = trailing(window, Indicator::Stochastic, &COLUMNS, 2)?;
        let prev_k = value(&rows[0], Indicator::Stochastic, Column::StochK)?;
        let prev_d = value(&rows[0], Indicator::Stochastic, Column::StochD)?;
        let k = value(&rows[1], Indicator::Stochastic, Column::StochK)?;
        let d = value(&rows[1], Indicator::Stochastic, Column::StochD)?;
        Ok(self.classify_values(prev_k, prev_d, k, d))
    }

    pub fn classify_values(&self, prev_k: f64, prev_d: f64, k: f64, d: f64) -> StochasticReading {
        let c = &self.config;
        let cross = Cross::detect(prev_k, prev_d, k, d);

        let state = if k < c.oversold && cross == Some(Cross::Bullish) {
            StochasticState::OversoldReversal
        } else if k > c.overbought && cross == Some(Cross::Bearish) {
            StochasticState::OverboughtReversal
        } else if k > d && k < c.overbought {
            StochasticState::BullishMomentum
        } else if k < d && k > c.oversold {
            StochasticState::BearishMomentum
        } else {
            StochasticState::Neutral
        };

        StochasticReading {
            k: Some(k),
            d: Some(d),
            cross,
            state,
            score: state.score(),
            issue: None,
        }
    }
}

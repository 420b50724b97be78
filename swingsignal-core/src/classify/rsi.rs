//! RSI classifier: trend regime from two consecutive values, then overextension.
//!
//! Regime (bullish floor / bearish ceiling) is decided first. The state then
//! checks overextension, and only falls back to a regime-qualified state when
//! the value sits between the oversold and overbought levels.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{trailing, value, Bias, Indicator, IndicatorReading, InsufficientData, Narrative, Signal};
use crate::domain::{Column, SeriesWindow};

/// RSI thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub oversold: f64,
    pub overbought: f64,
    pub bullish_floor: f64,
    pub bearish_ceiling: f64,
    /// Minimum RSI for `bullish_strength` inside a bullish regime.
    pub strength_level: f64,
    /// Maximum RSI for `bearish_weakness` inside a bearish regime.
    pub weakness_level: f64,
    /// Base strength added to overextended states.
    pub extreme_bonus: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            bullish_floor: 40.0,
            bearish_ceiling: 60.0,
            strength_level: 55.0,
            weakness_level: 45.0,
            extreme_bonus: 0.3,
        }
    }
}

/// Trend regime read from the last two RSI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiRegime {
    Bullish,
    Bearish,
    Sideways,
    Unknown,
}

impl RsiRegime {
    pub fn label(self) -> &'static str {
        match self {
            RsiRegime::Bullish => "bullish",
            RsiRegime::Bearish => "bearish",
            RsiRegime::Sideways => "sideways",
            RsiRegime::Unknown => "unknown",
        }
    }
}

impl FromStr for RsiRegime {
    type Err = std::convert::Infallible;

    /// Case-insensitive. Anything unrecognized is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => RsiRegime::Bullish,
            "bearish" => RsiRegime::Bearish,
            "sideways" => RsiRegime::Sideways,
            _ => RsiRegime::Unknown,
        })
    }
}

/// Point-in-time RSI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiState {
    Oversold,
    Overbought,
    BullishStrength,
    BearishWeakness,
    Neutral,
    Invalid,
}

impl RsiState {
    pub fn label(self) -> &'static str {
        match self {
            RsiState::Oversold => "oversold",
            RsiState::Overbought => "overbought",
            RsiState::BullishStrength => "bullish_strength",
            RsiState::BearishWeakness => "bearish_weakness",
            RsiState::Neutral => "neutral",
            RsiState::Invalid => "invalid",
        }
    }

    pub fn bias(self) -> Bias {
        match self {
            RsiState::Oversold => Bias::MeanReversionLong,
            RsiState::Overbought => Bias::MeanReversionShort,
            RsiState::BullishStrength => Bias::TrendFollowLong,
            RsiState::BearishWeakness => Bias::TrendFollowShort,
            RsiState::Neutral | RsiState::Invalid => Bias::None,
        }
    }

    pub fn narrative(self) -> Narrative {
        match self {
            RsiState::Oversold => Narrative::new(
                "Strongly oversold",
                "Price has been sold hard and is technically overstretched.",
                "A short-term technical rebound is possible.",
                "In strong downtrends the RSI can stay oversold for a long time.",
                "Suitable for short-term trades only.",
            ),
            RsiState::Overbought => Narrative::new(
                "Strongly overbought",
                "Price has risen sharply in a short time and is technically overstretched.",
                "A pullback or sideways phase is possible.",
                "In strong uptrends the RSI can stay overbought for a long time.",
                "Protect profits or consider partial sales.",
            ),
            RsiState::BullishStrength => Narrative::new(
                "Trend strength in an uptrend",
                "The RSI confirms a stable uptrend.",
                "Trend continuation is likely.",
                "A very fast rise can overheat.",
                "Follow the trend and wait for pullbacks.",
            ),
            RsiState::BearishWeakness => Narrative::new(
                "Selling pressure confirmed",
                "The RSI confirms a weak market.",
                "Further losses are possible.",
                "Sudden counter moves are possible.",
                "Lean short or stay on the sidelines.",
            ),
            RsiState::Neutral => Narrative::new(
                "Neutral",
                "The RSI shows no clear direction right now.",
                "A breakout from the range is possible.",
                "False signals in a sideways market.",
                "Wait for confirmation from other indicators.",
            ),
            RsiState::Invalid => Narrative::INVALID,
        }
    }
}

/// Result of one RSI classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: Option<f64>,
    pub regime: RsiRegime,
    pub state: RsiState,
    pub bias: Bias,
    pub strength: f64,
    pub issue: Option<InsufficientData>,
}

impl RsiReading {
    /// Sentinel reading: regime unknown, state invalid.
    pub fn invalid(issue: InsufficientData) -> Self {
        Self {
            value: None,
            regime: RsiRegime::Unknown,
            state: RsiState::Invalid,
            bias: Bias::None,
            strength: 0.0,
            issue: Some(issue),
        }
    }
}

impl IndicatorReading for RsiReading {
    fn indicator(&self) -> Indicator {
        Indicator::Rsi
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

/// Aggregate over every RSI value in a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiHistory {
    pub samples: usize,
    /// Percentage of samples strictly below the oversold level.
    pub oversold_pct: f64,
    /// Percentage of samples strictly above the overbought level.
    pub overbought_pct: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// RSI classifier.
#[derive(Debug, Clone, Default)]
pub struct RsiClassifier {
    config: RsiConfig,
}

impl RsiClassifier {
    pub fn new(config: RsiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RsiConfig {
        &self.config
    }

    pub fn classify(&self, window: &SeriesWindow<'_>) -> RsiReading {
        match self.try_classify(window) {
            Ok(reading) => reading,
            Err(issue) => RsiReading::invalid(issue),
        }
    }

    fn try_classify(&self, window: &SeriesWindow<'_>) -> Result<RsiReading, InsufficientData> {
        let rows = trailing(window, Indicator::Rsi, &[Column::Rsi], 2)?;
        let prev = value(&rows[0], Indicator::Rsi, Column::Rsi)?;
        let rsi = value(&rows[1], Indicator::Rsi, Column::Rsi)?;
        Ok(self.classify_values(prev, rsi))
    }

    /// Classify from the previous and latest RSI values.
    pub fn classify_values(&self, prev: f64, rsi: f64) -> RsiReading {
        let c = &self.config;

        let regime = if rsi >= c.bullish_floor && prev >= c.bullish_floor {
            RsiRegime::Bullish
        } else if rsi <= c.bearish_ceiling && prev <= c.bearish_ceiling {
            RsiRegime::Bearish
        } else {
            RsiRegime::Sideways
        };

        let (state, strength) = if rsi <= c.oversold {
            (
                RsiState::Oversold,
                ((c.oversold - rsi) / c.oversold + c.extreme_bonus).min(1.0),
            )
        } else if rsi >= c.overbought {
            (
                RsiState::Overbought,
                ((rsi - c.overbought) / (100.0 - c.overbought) + c.extreme_bonus).min(1.0),
            )
        } else if regime == RsiRegime::Bullish && rsi >= c.strength_level {
            (RsiState::BullishStrength, (rsi - 50.0) / 50.0)
        } else if regime == RsiRegime::Bearish && rsi <= c.weakness_level {
            (RsiState::BearishWeakness, (50.0 - rsi) / 50.0)
        } else {
            (RsiState::Neutral, 0.0)
        };

        RsiReading {
            value: Some(rsi),
            regime,
            state,
            bias: state.bias(),
            strength,
            issue: None,
        }
    }

    /// Summary of all RSI values in the window; `None` if there are none.
    pub fn history(&self, window: &SeriesWindow<'_>) -> Option<RsiHistory> {
        let values: Vec<f64> = window
            .bars()
            .iter()
            .filter_map(|b| b.rsi)
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let pct = |count: usize| count as f64 / n * 100.0;
        let oversold = values.iter().filter(|&&v| v < self.config.oversold).count();
        let overbought = values.iter().filter(|&&v| v > self.config.overbought).count();

        Some(RsiHistory {
            samples: values.len(),
            oversold_pct: pct(oversold),
            overbought_pct: pct(overbought),
            mean: values.iter().sum::<f64>() / n,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

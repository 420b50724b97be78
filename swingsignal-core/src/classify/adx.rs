//! ADX classifier: trend strength regime with the DI spread as a direction label.
//!
//! The regime is decided by ADX magnitude alone on closed-open intervals:
//! `[0, weak)` range, `[weak, strong)` emerging, `[strong, extreme)` strong,
//! `[extreme, ∞)` extreme. Direction only names the state.

use serde::{Deserialize, Serialize};

use super::{
    trailing, value, Bias, Indicator, IndicatorReading, InsufficientData, Narrative, Signal,
    TrendDirection,
};
use crate::domain::{Column, SeriesWindow};

const COLUMNS: [Column; 3] = [Column::Adx, Column::PlusDi, Column::MinusDi];

/// ADX regime boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdxConfig {
    pub weak: f64,
    pub strong: f64,
    pub extreme: f64,
}

impl Default for AdxConfig {
    fn default() -> Self {
        Self {
            weak: 20.0,
            strong: 25.0,
            extreme: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxRegime {
    Range,
    EmergingTrend,
    StrongTrend,
    ExtremeTrend,
    Unknown,
}

impl AdxRegime {
    pub fn label(self) -> &'static str {
        match self {
            AdxRegime::Range => "range",
            AdxRegime::EmergingTrend => "emerging_trend",
            AdxRegime::StrongTrend => "strong_trend",
            AdxRegime::ExtremeTrend => "extreme_trend",
            AdxRegime::Unknown => "unknown",
        }
    }

    pub fn narrative(self) -> Narrative {
        match self {
            AdxRegime::Range => Narrative::new(
                "Sideways market",
                "ADX is below the trend threshold and the market mostly moves sideways. \
                 Trend-following tends to fail here while short counter moves are common.",
                "Short counter moves offer trading opportunities.",
                "Trend-following is ineffective and prone to false signals.",
                "Wait or use range strategies.",
            ),
            AdxRegime::EmergingTrend => Narrative::new(
                "Trend building",
                "ADX is rising but has not reached a stable trend level. \
                 A trend may be forming, but it can still turn out to be a false start.",
                "Early entries into a forming trend are possible.",
                "The trend is unconfirmed and false signals are possible.",
                "Observe.",
            ),
            AdxRegime::StrongTrend => Narrative::new(
                "Strong trend",
                "ADX signals a clear and stable trend. \
                 Trend-following has a higher probability of success because moves tend to persist.",
                "Clear trend direction favours trend-following.",
                "The market can still show sudden counter moves.",
                "Trade the trend.",
            ),
            AdxRegime::ExtremeTrend => Narrative::new(
                "Overstretched trend",
                "ADX is at an extreme level, which often comes with overextension. \
                 New entries carry a higher risk of sudden pullbacks or reversals.",
                "The trend has a lot of force and taking profits can make sense.",
                "High risk of a reversal or sudden pullback.",
                "Secure profits and be careful.",
            ),
            AdxRegime::Unknown => Narrative::INVALID,
        }
    }
}

/// Regime qualified by DI direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxState {
    NoTrend,
    Emerging(TrendDirection),
    Trend(TrendDirection),
    Exhaustion(TrendDirection),
    Invalid,
}

impl AdxState {
    pub fn label(self) -> &'static str {
        use TrendDirection::*;
        match self {
            AdxState::NoTrend => "no_trend",
            AdxState::Emerging(Bullish) => "bullish_emerging",
            AdxState::Emerging(Bearish) => "bearish_emerging",
            AdxState::Emerging(Neutral) => "neutral_emerging",
            AdxState::Trend(Bullish) => "bullish_trend",
            AdxState::Trend(Bearish) => "bearish_trend",
            AdxState::Trend(Neutral) => "neutral_trend",
            AdxState::Exhaustion(Bullish) => "bullish_exhaustion",
            AdxState::Exhaustion(Bearish) => "bearish_exhaustion",
            AdxState::Exhaustion(Neutral) => "neutral_exhaustion",
            AdxState::Invalid => "invalid",
        }
    }
}

/// ADX change against the previous bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendAcceleration {
    Rising,
    Falling,
    Flat,
}

impl TrendAcceleration {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            TrendAcceleration::Rising
        } else if delta < 0.0 {
            TrendAcceleration::Falling
        } else {
            TrendAcceleration::Flat
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            TrendAcceleration::Rising => "trend is gaining strength",
            TrendAcceleration::Falling => "trend is losing strength",
            TrendAcceleration::Flat => "trend strength unchanged",
        }
    }
}

/// Result of one ADX classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdxReading {
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub regime: AdxRegime,
    pub direction: Option<TrendDirection>,
    pub state: AdxState,
    pub bias: Bias,
    pub strength: f64,
    pub acceleration: Option<TrendAcceleration>,
    pub issue: Option<InsufficientData>,
}

impl AdxReading {
    pub fn invalid(issue: InsufficientData) -> Self {
        Self {
            adx: None,
            plus_di: None,
            minus_di: None,
            regime: AdxRegime::Unknown,
            direction: None,
            state: AdxState::Invalid,
            bias: Bias::None,
            strength: 0.0,
            acceleration: None,
            issue: Some(issue),
        }
    }
}

impl IndicatorReading for AdxReading {
    fn indicator(&self) -> Indicator {
        Indicator::Adx
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
        self.regime.narrative()
    }

    fn issue(&self) -> Option<&InsufficientData> {
        self.issue.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdxClassifier {
    config: AdxConfig,
}

impl AdxClassifier {
    pub fn new(config: AdxConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, window: &SeriesWindow<'_>) -> AdxReading {
        match self.try_classify(window) {
            Ok(reading) => reading,
            Err(issue) => AdxReading::invalid(issue),
        }
    }

    fn try_classify(&self, window: &SeriesWindow<'_>) -> Result<AdxReading, InsufficientData> {
        let rows = trailing(window, Indicator::Adx, &COLUMNS, 2)?;
        let prev_adx = value(&rows[0], Indicator::Adx, Column::Adx)?;
        let adx = value(&rows[1], Indicator::Adx, Column::Adx)?;
        let plus_di = value(&rows[1], Indicator::Adx, Column::PlusDi)?;
        let minus_di = value(&rows[1], Indicator::Adx, Column::MinusDi)?;
        Ok(self.classify_values(prev_adx, adx, plus_di, minus_di))
    }

    /// Regime for an ADX magnitude.
    pub fn regime_for(&self, adx: f64) -> AdxRegime {
        let c = &self.config;
        if adx < c.weak {
            AdxRegime::Range
        } else if adx < c.strong {
            AdxRegime::EmergingTrend
        } else if adx < c.extreme {
            AdxRegime::StrongTrend
        } else {
            AdxRegime::ExtremeTrend
        }
    }

    pub fn classify_values(&self, prev_adx: f64, adx: f64, plus_di: f64, minus_di: f64) -> AdxReading {
        let c = &self.config;
        let direction = TrendDirection::compare(plus_di, minus_di);
        let regime = self.regime_for(adx);

        let (state, bias, strength) = match regime {
            AdxRegime::Range => (AdxState::NoTrend, Bias::MeanReversion, 0.0),
            AdxRegime::EmergingTrend => (
                AdxState::Emerging(direction),
                Bias::WaitForConfirmation,
                (adx - c.weak) / (c.strong - c.weak),
            ),
            AdxRegime::StrongTrend => {
                let bias = match direction {
                    TrendDirection::Bullish => Bias::TrendFollowLong,
                    TrendDirection::Bearish => Bias::TrendFollowShort,
                    TrendDirection::Neutral => Bias::TrendFollowNeutral,
                };
                (AdxState::Trend(direction), bias, (adx / c.extreme).min(1.0))
            }
            AdxRegime::ExtremeTrend | AdxRegime::Unknown => {
                (AdxState::Exhaustion(direction), Bias::RiskOfReversal, 1.0)
            }
        };

        AdxReading {
            adx: Some(adx),
            plus_di: Some(plus_di),
            minus_di: Some(minus_di),
            regime,
            direction: Some(direction),
            state,
            bias,
            strength,
            acceleration: Some(TrendAcceleration::from_delta(adx - prev_adx)),
            issue: None,
        }
    }
}

//! Entry quality: price level (Bollinger) plus timing (Stochastic), regime-weighted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::{BollingerReading, BollingerState, StochasticReading, StochasticState};
use crate::regime::MarketRegime;

/// Grade of an entry setup, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryGrade {
    Poor,
    Neutral,
    Good,
    Excellent,
}

impl EntryGrade {
    pub fn label(self) -> &'static str {
        match self {
            EntryGrade::Poor => "poor",
            EntryGrade::Neutral => "neutral",
            EntryGrade::Good => "good",
            EntryGrade::Excellent => "excellent",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            EntryGrade::Excellent => "Excellent entry: very good mix of price and timing",
            EntryGrade::Good => "Good entry: attractive setup with limited risk",
            EntryGrade::Neutral => "Neutral entry: neither particularly good nor bad",
            EntryGrade::Poor => "Poor entry: unfavourable setup",
        }
    }

    pub fn action_hint(self) -> &'static str {
        match self {
            EntryGrade::Excellent => "Entry clearly recommended.",
            EntryGrade::Good => "Consider entering.",
            EntryGrade::Neutral => "Wait or take small positions.",
            EntryGrade::Poor => "Avoid entering.",
        }
    }
}

impl fmt::Display for EntryGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Regime weights and grade cut-offs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryQualityConfig {
    pub trend_multiplier: f64,
    pub late_trend_multiplier: f64,
    pub excellent: f64,
    pub good: f64,
    pub neutral: f64,
}

impl Default for EntryQualityConfig {
    fn default() -> Self {
        Self {
            trend_multiplier: 1.1,
            late_trend_multiplier: 0.8,
            excellent: 1.5,
            good: 0.5,
            neutral: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryQuality {
    pub score: f64,
    pub grade: EntryGrade,
    /// Short remarks on price and timing, in evaluation order.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryQualityScorer {
    config: EntryQualityConfig,
}

impl EntryQualityScorer {
    pub fn new(config: EntryQualityConfig) -> Self {
        Self { config }
    }

    pub fn score(
        &self,
        bollinger: &BollingerReading,
        stochastic: &StochasticReading,
        regime: MarketRegime,
    ) -> EntryQuality {
        let c = &self.config;
        let mut notes = Vec::new();

        match bollinger.state {
            BollingerState::BelowLower | BollingerState::LowerHalf => {
                notes.push("price attractive (Bollinger)".to_string())
            }
            BollingerState::AboveUpper => notes.push("price stretched (Bollinger)".to_string()),
            _ => {}
        }
        match stochastic.state {
            StochasticState::OversoldReversal => notes.push("good reversal timing".to_string()),
            StochasticState::OverboughtReversal => notes.push("unfavourable timing".to_string()),
            _ => {}
        }

        let mut score = bollinger.score + stochastic.score;
        match regime {
            MarketRegime::TrendMarket => score *= c.trend_multiplier,
            MarketRegime::LateTrend => score *= c.late_trend_multiplier,
            _ => {}
        }

        EntryQuality {
            score,
            grade: self.grade(score),
            notes,
        }
    }

    pub fn grade(&self, score: f64) -> EntryGrade {
        let c = &self.config;
        if score >= c.excellent {
            EntryGrade::Excellent
        } else if score >= c.good {
            EntryGrade::Good
        } else if score >= c.neutral {
            EntryGrade::Neutral
        } else {
            EntryGrade::Poor
        }
    }
}

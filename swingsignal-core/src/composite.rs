//! Weighted composite signal: the simple per-indicator vote model.
//!
//! Each indicator casts a −1 / 0 / +1 vote from the latest bars. The votes are
//! weighted, scaled by the trading-status modifier of their group and summed;
//! the sum is compared against a symmetric threshold:
//!
//! ```text
//! score = Σ vote(i) × weight(i) × modifier(group(i))
//! BUY if score > threshold, SELL if score < −threshold, else HOLD
//! ```
//!
//! Missing data never aborts the vote: the indicator abstains (vote 0) and the
//! reason is kept on the vote.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::classify::{trailing, value, Cross, Indicator, InsufficientData, Signal};
use crate::domain::{Column, SeriesWindow};

// ─── Profiles ───────────────────────────────────────────────────────

/// Stock category selecting a weight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockProfile {
    Growth,
    Value,
    Cyclical,
    Defensive,
    Volatile,
    Momentum,
}

impl StockProfile {
    pub const ALL: [StockProfile; 6] = [
        StockProfile::Growth,
        StockProfile::Value,
        StockProfile::Cyclical,
        StockProfile::Defensive,
        StockProfile::Volatile,
        StockProfile::Momentum,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StockProfile::Growth => "growth",
            StockProfile::Value => "value",
            StockProfile::Cyclical => "cyclical",
            StockProfile::Defensive => "defensive",
            StockProfile::Volatile => "volatile",
            StockProfile::Momentum => "momentum",
        }
    }

    /// Indicator weights of the category. Indicators not listed do not vote.
    pub fn weights(self) -> BTreeMap<Indicator, f64> {
        let pairs: &[(Indicator, f64)] = match self {
            StockProfile::Growth => &[
                (Indicator::Macd, 0.2),
                (Indicator::Adx, 0.6),
                (Indicator::Bollinger, 0.2),
            ],
            StockProfile::Value => &[
                (Indicator::Rsi, 0.5),
                (Indicator::Stochastic, 0.3),
                (Indicator::Bollinger, 0.2),
            ],
            StockProfile::Cyclical => &[(Indicator::Macd, 0.6), (Indicator::Adx, 0.4)],
            StockProfile::Defensive => &[(Indicator::Adx, 0.9), (Indicator::Bollinger, 0.1)],
            StockProfile::Volatile => &[(Indicator::Bollinger, 0.5), (Indicator::Stochastic, 0.5)],
            StockProfile::Momentum => &[
                (Indicator::Macd, 0.5),
                (Indicator::Rsi, 0.3),
                (Indicator::Adx, 0.2),
            ],
        };
        pairs.iter().copied().collect()
    }
}

impl fmt::Display for StockProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for StockProfile {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        StockProfile::ALL
            .into_iter()
            .find(|p| p.label() == wanted)
            .ok_or(UnknownLabel(wanted))
    }
}

/// Current trading behaviour of the stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingStatus {
    Momentum,
    Volatile,
    #[default]
    None,
}

impl TradingStatus {
    pub fn modifier(self) -> StatusModifier {
        match self {
            TradingStatus::Momentum => StatusModifier {
                trend: 1.2,
                volatility: 0.8,
            },
            TradingStatus::Volatile => StatusModifier {
                trend: 0.8,
                volatility: 1.2,
            },
            TradingStatus::None => StatusModifier::default(),
        }
    }
}

impl FromStr for TradingStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "momentum" => Ok(TradingStatus::Momentum),
            "volatile" => Ok(TradingStatus::Volatile),
            "none" => Ok(TradingStatus::None),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Indicator group a status modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalGroup {
    Trend,
    Volatility,
}

impl SignalGroup {
    pub fn of(indicator: Indicator) -> Self {
        match indicator {
            Indicator::Macd | Indicator::Adx => SignalGroup::Trend,
            Indicator::Rsi | Indicator::Bollinger | Indicator::Stochastic => SignalGroup::Volatility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusModifier {
    pub trend: f64,
    pub volatility: f64,
}

impl Default for StatusModifier {
    fn default() -> Self {
        Self {
            trend: 1.0,
            volatility: 1.0,
        }
    }
}

impl StatusModifier {
    pub fn factor(&self, group: SignalGroup) -> f64 {
        match group {
            SignalGroup::Trend => self.trend,
            SignalGroup::Volatility => self.volatility,
        }
    }
}

// ─── Config ─────────────────────────────────────────────────────────

/// Vote rules, weights and decision threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub weights: BTreeMap<Indicator, f64>,
    pub threshold: f64,
    pub modifier: StatusModifier,
    pub rsi_buy_below: f64,
    pub rsi_sell_above: f64,
    /// Minimum |MACD − signal| for a cross to vote.
    pub macd_min_distance: f64,
    pub adx_threshold: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    /// Relative distance to a band that still counts as touching it.
    pub band_tolerance: f64,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            weights: [
                (Indicator::Bollinger, 0.25),
                (Indicator::Rsi, 0.30),
                (Indicator::Macd, 0.20),
                (Indicator::Adx, 0.10),
                (Indicator::Stochastic, 0.15),
            ]
            .into_iter()
            .collect(),
            threshold: 0.2,
            modifier: StatusModifier::default(),
            rsi_buy_below: 35.0,
            rsi_sell_above: 60.0,
            macd_min_distance: 0.1,
            adx_threshold: 25.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            band_tolerance: 0.015,
        }
    }
}

impl CompositeConfig {
    /// Category weights with the status modifier and the stricter 0.25 threshold.
    pub fn for_profile(profile: StockProfile, status: TradingStatus) -> Self {
        Self {
            weights: profile.weights(),
            threshold: 0.25,
            modifier: status.modifier(),
            ..Self::default()
        }
    }

    /// Weight after the status modifier; zero for indicators without a weight.
    pub fn effective_weight(&self, indicator: Indicator) -> f64 {
        self.weights.get(&indicator).copied().unwrap_or(0.0)
            * self.modifier.factor(SignalGroup::of(indicator))
    }
}

// ─── Scoring ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeVote {
    pub indicator: Indicator,
    pub vote: Signal,
    pub label: &'static str,
    pub weight: f64,
    pub issue: Option<InsufficientData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeSignal {
    pub votes: Vec<CompositeVote>,
    pub score: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    config: CompositeConfig,
}

impl CompositeScorer {
    pub fn new(config: CompositeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    pub fn score(&self, window: &SeriesWindow<'_>) -> CompositeSignal {
        let mut votes = Vec::with_capacity(self.config.weights.len());
        let mut score = 0.0;

        for &indicator in self.config.weights.keys() {
            let weight = self.config.effective_weight(indicator);
            let vote = match self.vote(indicator, window) {
                Ok((vote, label)) => CompositeVote {
                    indicator,
                    vote,
                    label,
                    weight,
                    issue: None,
                },
                Err(issue) => CompositeVote {
                    indicator,
                    vote: Signal::Hold,
                    label: "insufficient_data",
                    weight,
                    issue: Some(issue),
                },
            };
            score += f64::from(vote.vote.value()) * weight;
            votes.push(vote);
        }

        CompositeSignal {
            votes,
            score,
            signal: self.signal_for(score),
        }
    }

    pub fn signal_for(&self, score: f64) -> Signal {
        if score > self.config.threshold {
            Signal::Buy
        } else if score < -self.config.threshold {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    fn vote(
        &self,
        indicator: Indicator,
        window: &SeriesWindow<'_>,
    ) -> Result<(Signal, &'static str), InsufficientData> {
        match indicator {
            Indicator::Rsi => self.rsi_vote(window),
            Indicator::Macd => self.macd_vote(window),
            Indicator::Adx => self.adx_vote(window),
            Indicator::Bollinger => self.bollinger_vote(window),
            Indicator::Stochastic => self.stochastic_vote(window),
        }
    }

    fn rsi_vote(&self, window: &SeriesWindow<'_>) -> Result<(Signal, &'static str), InsufficientData> {
        let c = &self.config;
        let bars = trailing(window, Indicator::Rsi, &[Column::Rsi], 1)?;
        let rsi = value(&bars[0], Indicator::Rsi, Column::Rsi)?;
        Ok(if rsi < c.rsi_buy_below {
            (Signal::Buy, "rsi_low")
        } else if rsi > c.rsi_sell_above {
            (Signal::Sell, "rsi_high")
        } else {
            (Signal::Hold, "hold")
        })
    }

    fn macd_vote(&self, window: &SeriesWindow<'_>) -> Result<(Signal, &'static str), InsufficientData> {
        const I: Indicator = Indicator::Macd;
        let bars = trailing(window, I, &[Column::Macd, Column::MacdSignal], 3)?;
        let (prev, last) = (&bars[1], &bars[2]);
        let prev_macd = value(prev, I, Column::Macd)?;
        let prev_signal = value(prev, I, Column::MacdSignal)?;
        let macd = value(last, I, Column::Macd)?;
        let signal = value(last, I, Column::MacdSignal)?;

        let momentum = macd - prev_macd;
        let separated = (macd - signal).abs() > self.config.macd_min_distance;
        Ok(match Cross::detect(prev_macd, prev_signal, macd, signal) {
            Some(Cross::Bullish) if momentum > 0.0 && separated => (Signal::Buy, "strong_bullish_cross"),
            Some(Cross::Bearish) if momentum < 0.0 && separated => (Signal::Sell, "strong_bearish_cross"),
            Some(Cross::Bullish) => (Signal::Hold, "weak_bullish_cross"),
            Some(Cross::Bearish) => (Signal::Hold, "weak_bearish_cross"),
            None => (Signal::Hold, "hold"),
        })
    }

    fn adx_vote(&self, window: &SeriesWindow<'_>) -> Result<(Signal, &'static str), InsufficientData> {
        const I: Indicator = Indicator::Adx;
        let bars = trailing(window, I, &[Column::Adx, Column::PlusDi, Column::MinusDi], 1)?;
        let bar = &bars[0];
        let adx = value(bar, I, Column::Adx)?;
        if adx < self.config.adx_threshold {
            return Ok((Signal::Hold, "no_clear_trend"));
        }
        let plus_di = value(bar, I, Column::PlusDi)?;
        let minus_di = value(bar, I, Column::MinusDi)?;
        Ok(if plus_di > minus_di {
            (Signal::Buy, "uptrend")
        } else {
            (Signal::Sell, "downtrend")
        })
    }

    fn bollinger_vote(&self, window: &SeriesWindow<'_>) -> Result<(Signal, &'static str), InsufficientData> {
        const I: Indicator = Indicator::Bollinger;
        let bars = trailing(window, I, &[Column::Close, Column::BbUpper, Column::BbLower], 2)?;
        let (prev, last) = (&bars[0], &bars[1]);
        let close = last.close;
        let upper = value(last, I, Column::BbUpper)?;
        let lower = value(last, I, Column::BbLower)?;
        let prev_upper = value(prev, I, Column::BbUpper)?;
        let prev_lower = value(prev, I, Column::BbLower)?;

        let tolerance = self.config.band_tolerance;
        let near_lower = (close - lower) / lower <= tolerance;
        let rebound = prev.close < prev_lower && close > lower;
        let near_upper = (upper - close) / upper <= tolerance;
        let fall_back = prev.close > prev_upper && close < upper;

        Ok(if near_lower || rebound {
            (Signal::Buy, "lower_band")
        } else if near_upper || fall_back {
            (Signal::Sell, "upper_band")
        } else {
            (Signal::Hold, "hold")
        })
    }

    fn stochastic_vote(&self, window: &SeriesWindow<'_>) -> Result<(Signal, &'static str), InsufficientData> {
        const I: Indicator = Indicator::Stochastic;
        let c = &self.config;
        let bars = trailing(window, I, &[Column::StochK, Column::StochD], 2)?;
        let (prev, last) = (&bars[0], &bars[1]);
        let prev_k = value(prev, I, Column::StochK)?;
        let prev_d = value(prev, I, Column::StochD)?;
        let k = value(last, I, Column::StochK)?;
        let d = value(last, I, Column::StochD)?;

        Ok(match Cross::detect(prev_k, prev_d, k, d) {
            Some(Cross::Bullish) if k < c.stoch_oversold && d < c.stoch_oversold => {
                (Signal::Buy, "oversold_cross")
            }
            Some(Cross::Bearish) if k > c.stoch_overbought && d > c.stoch_overbought => {
                (Signal::Sell, "overbought_cross")
            }
            _ => (Signal::Hold, "hold"),
        })
    }
}

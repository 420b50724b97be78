//! Decision engine: regime-keyed table from (regime, RSI, MACD) to a trade action.
//!
//! Each call is independent: every branch builds a complete [`Decision`]
//! from scratch, so nothing carries over between days of a replay.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::classify::{AdxReading, Lean, MacdReading, RsiReading, RsiState, Signal};
use crate::regime::{MarketRegime, RegimeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
    Wait,
    NoTrade,
    Reduce,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
            Action::Wait => "WAIT",
            Action::NoTrade => "NO_TRADE",
            Action::Reduce => "REDUCE",
        }
    }

    /// Buy/sell/hold resolution used by the signal tape: only BUY and SELL trade.
    pub fn signal(self) -> Signal {
        match self {
            Action::Buy => Signal::Buy,
            Action::Sell => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    pub fn is_entry(self) -> bool {
        matches!(self, Action::Buy | Action::Sell)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    MeanReversion,
    TrendFollow,
}

impl PositionType {
    pub fn label(self) -> &'static str {
        match self {
            PositionType::MeanReversion => "mean_reversion",
            PositionType::TrendFollow => "trend_follow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown risk level '{0}' (expected low, moderate or high)")]
pub struct UnknownRiskLevel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "moderate" => Ok(RiskLevel::Moderate),
            "high" => Ok(RiskLevel::High),
            other => Err(UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Confidence levels of the fixed-confidence branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub mean_reversion_confidence: f64,
    pub wait_confidence: f64,
    pub hold_confidence: f64,
    pub reduce_confidence: f64,
    /// RSI level that confirms a trend entry: above for longs, below for shorts.
    pub rsi_midline: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            mean_reversion_confidence: 0.55,
            wait_confidence: 0.4,
            hold_confidence: 0.5,
            reduce_confidence: 0.6,
            rsi_midline: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionNarrative {
    pub summary: &'static str,
    pub short: &'static str,
    pub long: &'static str,
    pub action_hint: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub action: Action,
    pub position_type: Option<PositionType>,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub reason: &'static str,
    pub narrative: DecisionNarrative,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// The ADX reading is part of the decision inputs but only reaches the
    /// table through the regime.
    pub fn decide(
        &self,
        regime: &RegimeResult,
        rsi: &RsiReading,
        macd: &MacdReading,
        _adx: &AdxReading,
    ) -> Decision {
        let c = &self.config;
        match regime.market_regime {
            MarketRegime::RangeMarket => match rsi.state {
                RsiState::Oversold => Decision {
                    action: Action::Buy,
                    position_type: Some(PositionType::MeanReversion),
                    confidence: c.mean_reversion_confidence,
                    risk_level: RiskLevel::Moderate,
                    reason: "range market with oversold RSI",
                    narrative: DecisionNarrative {
                        summary: "Sideways market with mean-reversion chances",
                        short: "Buy on oversold signal",
                        long: "The market moves sideways while the RSI is oversold. A counter \
                               move is likely and offers a buying opportunity. Risk is moderate \
                               because no strong trend is present.",
                        action_hint: "Enter long, respect the stop-loss.",
                    },
                },
                RsiState::Overbought => Decision {
                    action: Action::Sell,
                    position_type: Some(PositionType::MeanReversion),
                    confidence: c.mean_reversion_confidence,
                    risk_level: RiskLevel::Moderate,
                    reason: "range market with overbought RSI",
                    narrative: DecisionNarrative {
                        summary: "Sideways market with mean-reversion chances",
                        short: "Sell on overbought signal",
                        long: "The market moves sideways while the RSI is overbought. A short \
                               correction may follow and offer selling opportunities.",
                        action_hint: "Consider a short position or secure profits.",
                    },
                },
                _ => Decision {
                    action: Action::NoTrade,
                    position_type: None,
                    confidence: 0.0,
                    risk_level: RiskLevel::High,
                    reason: "range without extreme",
                    narrative: DecisionNarrative {
                        summary: "Sideways market with mean-reversion chances",
                        short: "No clear signal",
                        long: "The market trades in a range without significant over- or \
                               undervaluation. Act with restraint while clear signals are missing.",
                        action_hint: "Wait or trade the range.",
                    },
                },
            },

            MarketRegime::TransitionPhase => Decision {
                action: Action::Wait,
                position_type: None,
                confidence: c.wait_confidence,
                risk_level: RiskLevel::High,
                reason: "trend forming without confirmation",
                narrative: DecisionNarrative {
                    summary: "Trend formation phase with an uncertain picture",
                    short: "Wait for clear trend confirmation",
                    long: "A trend is emerging but its direction is not confirmed yet. New \
                           positions are risky in this phase.",
                    action_hint: "Keep positions as they are or act with restraint.",
                },
            },

            MarketRegime::TrendMarket => {
                let rsi_value = rsi.value;
                let lean = macd.bias.lean();
                let above_mid = rsi_value.is_some_and(|v| v > c.rsi_midline);
                let below_mid = rsi_value.is_some_and(|v| v < c.rsi_midline);
                match lean {
                    Some(Lean::Long) if above_mid => Decision {
                        action: Action::Buy,
                        position_type: Some(PositionType::TrendFollow),
                        confidence: regime.confidence,
                        risk_level: RiskLevel::Low,
                        reason: "strong uptrend with confirmed momentum",
                        narrative: DecisionNarrative {
                            summary: "Pronounced trend market, trend-following recommended",
                            short: "Buy in a strong uptrend",
                            long: "The market shows a clear uptrend with supporting momentum \
                                   from MACD and RSI, which favours trend continuation.",
                            action_hint: "Open a long position and follow the trend.",
                        },
                    },
                    Some(Lean::Short) if below_mid => Decision {
                        action: Action::Sell,
                        position_type: Some(PositionType::TrendFollow),
                        confidence: regime.confidence,
                        risk_level: RiskLevel::Low,
                        reason: "strong downtrend with confirmed momentum",
                        narrative: DecisionNarrative {
                            summary: "Pronounced trend market, trend-following recommended",
                            short: "Sell in a strong downtrend",
                            long: "The market is in a downtrend with confirmed negative \
                                   momentum. Trend-following strategies make sense here.",
                            action_hint: "Open a short position and follow the trend.",
                        },
                    },
                    _ => Decision {
                        action: Action::Hold,
                        position_type: None,
                        confidence: c.hold_confidence,
                        risk_level: RiskLevel::High,
                        reason: "trend intact but timing unfavorable",
                        narrative: DecisionNarrative {
                            summary: "Pronounced trend market, trend-following recommended",
                            short: "Trend present but no clear entry",
                            long: "A trend exists but the signals do not support an entry. \
                                   Hold and wait for a better opportunity.",
                            action_hint: "Hold the position and wait for better timing.",
                        },
                    },
                }
            }

            MarketRegime::LateTrend => Decision {
                action: Action::Reduce,
                position_type: None,
                confidence: c.reduce_confidence,
                risk_level: RiskLevel::Moderate,
                reason: "late trend phase, reduce risk",
                narrative: DecisionNarrative {
                    summary: "Late trend phase with increased caution",
                    short: "Minimize risk",
                    long: "The trend is far advanced and exhaustion or reversal has become more \
                           likely. Reduce existing positions and secure profits.",
                    action_hint: "Reduce positions and tighten the stop-loss.",
                },
            },

            MarketRegime::Unknown => Decision {
                action: Action::NoTrade,
                position_type: None,
                confidence: 0.0,
                risk_level: RiskLevel::High,
                reason: "unclear market situation",
                narrative: DecisionNarrative {
                    summary: "No clear market situation",
                    short: "unclear market situation",
                    long: "",
                    action_hint: "Wait.",
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{
        AdxClassifier, Bias, Indicator, InsufficientData, MacdClassifier, MacdPoint,
        RsiClassifier,
    };
    use crate::regime::RegimeCombiner;

    struct Inputs {
        rsi: RsiReading,
        macd: MacdReading,
        adx: AdxReading,
    }

    impl Inputs {
        fn new(rsi: (f64, f64), macd_bullish: bool, adx: f64) -> Self {
            let (p, l) = if macd_bullish {
                (
                    MacdPoint { macd: 0.5, signal: 0.4, hist: 0.08 },
                    MacdPoint { macd: 0.7, signal: 0.5, hist: 0.12 },
                )
            } else {
                (
                    MacdPoint { macd: -0.5, signal: -0.4, hist: -0.1 },
                    MacdPoint { macd: -0.7, signal: -0.5, hist: -0.2 },
                )
            };
            Self {
                rsi: RsiClassifier::default().classify_values(rsi.0, rsi.1),
                macd: MacdClassifier::default().classify_points(p, l),
                adx: AdxClassifier::default().classify_values(adx, adx, 25.0, 15.0),
            }
        }

        fn decide(&self) -> Decision {
            let regime = RegimeCombiner::default().combine(&self.rsi, &self.macd, &self.adx);
            DecisionEngine::default().decide(&regime, &self.rsi, &self.macd, &self.adx)
        }
    }

    #[test]
    fn range_oversold_buys_mean_reversion() {
        let d = Inputs::new((32.0, 25.0), true, 15.0).decide();
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.position_type, Some(PositionType::MeanReversion));
        assert_eq!(d.confidence, 0.55);
        assert_eq!(d.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn range_overbought_sells_mean_reversion() {
        let d = Inputs::new((68.0, 75.0), true, 15.0).decide();
        assert_eq!(d.action, Action::Sell);
        assert_eq!(d.position_type, Some(PositionType::MeanReversion));
    }

    #[test]
    fn range_without_extreme_is_no_trade() {
        let d = Inputs::new((45.0, 48.0), true, 15.0).decide();
        assert_eq!(d.action, Action::NoTrade);
        assert_eq!(d.position_type, None);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.reason, "range without extreme");
    }

    #[test]
    fn transition_always_waits() {
        let d = Inputs::new((25.0, 20.0), true, 21.0).decide();
        assert_eq!(d.action, Action::Wait);
        assert_eq!(d.confidence, 0.4);
        assert_eq!(d.risk_level, RiskLevel::High);
    }

    #[test]
    fn trend_buy_requires_bullish_macd_and_rsi_above_50() {
        let d = Inputs::new((55.0, 58.0), true, 30.0).decide();
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.position_type, Some(PositionType::TrendFollow));
        assert_eq!(d.confidence, 0.75);
        assert_eq!(d.risk_level, RiskLevel::Low);
    }

    #[test]
    fn trend_sell_requires_bearish_macd_and_rsi_below_50() {
        let d = Inputs::new((45.0, 42.0), false, 30.0).decide();
        assert_eq!(d.action, Action::Sell);
        assert_eq!(d.position_type, Some(PositionType::TrendFollow));
    }

    #[test]
    fn trend_with_conflicting_rsi_holds() {
        let d = Inputs::new((45.0, 42.0), true, 30.0).decide();
        assert_eq!(d.action, Action::Hold);
        assert_eq!(d.confidence, 0.5);
        assert_eq!(d.reason, "trend intact but timing unfavorable");

        // RSI exactly at the midline confirms neither side
        let d = Inputs::new((50.0, 50.0), true, 30.0).decide();
        assert_eq!(d.action, Action::Hold);
    }

    #[test]
    fn weakening_macd_still_counts_as_bullish() {
        let mut inputs = Inputs::new((55.0, 58.0), true, 30.0);
        inputs.macd = MacdClassifier::default().classify_points(
            MacdPoint { macd: 0.7, signal: 0.5, hist: 0.2 },
            MacdPoint { macd: 0.6, signal: 0.5, hist: 0.1 },
        );
        assert_eq!(inputs.macd.bias, Bias::CautionLong);
        assert_eq!(inputs.decide().action, Action::Buy);
    }

    #[test]
    fn late_trend_reduces() {
        let d = Inputs::new((70.0, 80.0), true, 45.0).decide();
        assert_eq!(d.action, Action::Reduce);
        assert_eq!(d.confidence, 0.6);
        assert_eq!(d.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn unknown_regime_is_no_trade() {
        let mut inputs = Inputs::new((50.0, 50.0), true, 30.0);
        inputs.adx = AdxReading::invalid(InsufficientData::TooFewRows {
            indicator: Indicator::Adx,
            required: 2,
            available: 1,
        });
        let d = inputs.decide();
        assert_eq!(d.action, Action::NoTrade);
        assert_eq!(d.reason, "unclear market situation");
        assert_eq!(d.risk_level, RiskLevel::High);
    }

    #[test]
    fn action_resolution() {
        assert_eq!(Action::Buy.signal(), Signal::Buy);
        assert_eq!(Action::Sell.signal(), Signal::Sell);
        assert_eq!(Action::Reduce.signal(), Signal::Hold);
        assert_eq!(Action::NoTrade.label(), "NO_TRADE");
        assert!(Action::Sell.is_entry());
        assert!(!Action::Wait.is_entry());
    }

    #[test]
    fn risk_level_parsing() {
        assert_eq!("Moderate".parse::<RiskLevel>(), Ok(RiskLevel::Moderate));
        assert!("extreme".parse::<RiskLevel>().is_err());
    }
}

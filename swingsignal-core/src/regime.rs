//! Regime combiner: merges the RSI, MACD and ADX readings into one market regime.
//!
//! Dispatch is on the ADX regime; MACD supplies the trade bias in a strong
//! trend and RSI only shapes the narrative. Every ADX regime, including the
//! sentinel `unknown`, maps to a fully populated [`RegimeResult`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::{AdxReading, AdxRegime, Bias, Lean, MacdReading, RsiReading, RsiState};

/// Overall market regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    RangeMarket,
    TransitionPhase,
    TrendMarket,
    LateTrend,
    Unknown,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 5] = [
        MarketRegime::RangeMarket,
        MarketRegime::TransitionPhase,
        MarketRegime::TrendMarket,
        MarketRegime::LateTrend,
        MarketRegime::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarketRegime::RangeMarket => "range_market",
            MarketRegime::TransitionPhase => "transition_phase",
            MarketRegime::TrendMarket => "trend_market",
            MarketRegime::LateTrend => "late_trend",
            MarketRegime::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence assigned to each regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfidences {
    pub range: f64,
    pub transition: f64,
    pub trend: f64,
    pub late_trend: f64,
}

impl Default for RegimeConfidences {
    fn default() -> Self {
        Self {
            range: 0.4,
            transition: 0.5,
            trend: 0.75,
            late_trend: 0.6,
        }
    }
}

/// Descriptive text of a regime result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegimeNarrative {
    pub summary: &'static str,
    pub short: &'static str,
    pub long: &'static str,
    pub action_hint: &'static str,
}

impl RegimeNarrative {
    const fn new(
        summary: &'static str,
        short: &'static str,
        long: &'static str,
        action_hint: &'static str,
    ) -> Self {
        Self {
            summary,
            short,
            long,
            action_hint,
        }
    }
}

const UNKNOWN: RegimeNarrative = RegimeNarrative::new(
    "Unknown regime",
    "No clear market picture",
    "The indicator combination gives no clear picture of the market regime.",
    "Wait and watch for further signals.",
);

#[derive(Debug, Clone, Serialize)]
pub struct RegimeResult {
    pub market_regime: MarketRegime,
    pub trade_bias: Bias,
    pub confidence: f64,
    pub narrative: RegimeNarrative,
}

/// Whether the RSI state agrees with a MACD lean: neutral or same-side trend strength.
pub fn rsi_confirms(state: RsiState, lean: Lean) -> bool {
    match lean {
        Lean::Long => matches!(state, RsiState::Neutral | RsiState::BullishStrength),
        Lean::Short => matches!(state, RsiState::Neutral | RsiState::BearishWeakness),
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegimeCombiner {
    confidences: RegimeConfidences,
}

impl RegimeCombiner {
    pub fn new(confidences: RegimeConfidences) -> Self {
        Self { confidences }
    }

    pub fn combine(&self, rsi: &RsiReading, macd: &MacdReading, adx: &AdxReading) -> RegimeResult {
        let c = &self.confidences;
        match adx.regime {
            AdxRegime::Range => RegimeResult {
                market_regime: MarketRegime::RangeMarket,
                trade_bias: Bias::MeanReversion,
                confidence: c.range,
                narrative: range_narrative(rsi.state),
            },
            AdxRegime::EmergingTrend => RegimeResult {
                market_regime: MarketRegime::TransitionPhase,
                trade_bias: Bias::WaitForConfirmation,
                confidence: c.transition,
                narrative: RegimeNarrative::new(
                    "Trend building",
                    "A trend is forming but still uncertain",
                    "ADX signals the start of a new trend. Confirmation is still missing, so \
                     positions should be built carefully or not at all yet.",
                    "Small positions or wait.",
                ),
            },
            AdxRegime::StrongTrend => RegimeResult {
                market_regime: MarketRegime::TrendMarket,
                trade_bias: macd.bias,
                confidence: c.trend,
                narrative: trend_narrative(rsi.state, macd.bias.lean()),
            },
            AdxRegime::ExtremeTrend => RegimeResult {
                market_regime: MarketRegime::LateTrend,
                trade_bias: Bias::RiskManagement,
                confidence: c.late_trend,
                narrative: RegimeNarrative::new(
                    "Extreme trend",
                    "Very strong trend with exhaustion risk",
                    "The market is in an extremely strong trend that may continue, but the risk \
                     of a reversal or sharp pullback has risen considerably.",
                    "Secure profits, tighten stops and trade carefully.",
                ),
            },
            AdxRegime::Unknown => RegimeResult {
                market_regime: MarketRegime::Unknown,
                trade_bias: Bias::None,
                confidence: 0.0,
                narrative: UNKNOWN,
            },
        }
    }
}

fn range_narrative(rsi: RsiState) -> RegimeNarrative {
    match rsi {
        RsiState::Oversold => RegimeNarrative::new(
            "Sideways market",
            "RSI oversold in a sideways market",
            "The market moves sideways with an oversold RSI. This can offer a chance for a \
             technical counter move (long reversal).",
            "Long reversal possible, act carefully.",
        ),
        RsiState::Overbought => RegimeNarrative::new(
            "Sideways market",
            "RSI overbought in a sideways market",
            "The market moves sideways with an overbought RSI, pointing to short reversal chances.",
            "Short reversal possible, mind the risk.",
        ),
        _ => RegimeNarrative::new(
            "Sideways market",
            "Sideways market without overextension",
            "The market shows no strong over- or undervaluation and is in a neutral sideways phase.",
            "Range strategies or wait.",
        ),
    }
}

fn trend_narrative(rsi: RsiState, lean: Option<Lean>) -> RegimeNarrative {
    match lean {
        Some(Lean::Long) if rsi_confirms(rsi, Lean::Long) => RegimeNarrative::new(
            "Strong trend",
            "Strong uptrend",
            "The market shows a stable uptrend supported by MACD and RSI. Trend-following \
             has good chances.",
            "Follow the trend and prefer long positions.",
        ),
        Some(Lean::Long) => RegimeNarrative::new(
            "Strong trend",
            "Uptrend with short-term overextension",
            "The trend is intact, but the RSI points to a possible short-term overextension. \
             Be careful with new entries.",
            "Secure profits, be careful with entries.",
        ),
        Some(Lean::Short) if rsi_confirms(rsi, Lean::Short) => RegimeNarrative::new(
            "Strong trend",
            "Strong downtrend",
            "The market shows a stable downtrend supported by MACD and RSI. Short positions \
             are preferred.",
            "Follow the trend and prefer short positions.",
        ),
        Some(Lean::Short) => RegimeNarrative::new(
            "Strong trend",
            "Downtrend with short-term overextension",
            "The trend is intact, but the RSI points to a possible short-term recovery or \
             overextension. Be careful with new entries.",
            "Secure profits, be careful with entries.",
        ),
        None => RegimeNarrative::new(
            "Strong trend",
            "Strong trend without momentum direction",
            "ADX shows a strong trend but MACD gives no direction to follow.",
            "Wait for MACD to pick a side.",
        ),
    }
}

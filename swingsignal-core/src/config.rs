//! Aggregated thresholds of the whole analysis pipeline.
//!
//! Every section defaults to the documented values, so a partial TOML or JSON
//! document only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::classify::{AdxConfig, MacdConfig, RsiConfig, StochasticConfig};
use crate::composite::CompositeConfig;
use crate::decision::DecisionConfig;
use crate::entry::EntryQualityConfig;
use crate::plan::SizeFactorTable;
use crate::regime::RegimeConfidences;
use crate::sizing::{RiskMultipliers, RiskTable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub rsi: RsiConfig,
    pub macd: MacdConfig,
    pub adx: AdxConfig,
    pub stochastic: StochasticConfig,
    pub regime: RegimeConfidences,
    pub entry: EntryQualityConfig,
    pub decision: DecisionConfig,
    pub size_factors: SizeFactorTable,
    pub risk_multipliers: RiskMultipliers,
    pub risk_table: RiskTable,
    pub composite: CompositeConfig,
}

impl AnalysisConfig {
    /// Threshold orderings the classifiers rely on. Returns the first violation.
    pub fn check(&self) -> Result<(), String> {
        let rsi = &self.rsi;
        if rsi.oversold >= rsi.overbought {
            return Err(format!(
                "rsi.oversold ({}) must be below rsi.overbought ({})",
                rsi.oversold, rsi.overbought
            ));
        }
        if rsi.bullish_floor > rsi.bearish_ceiling {
            return Err(format!(
                "rsi.bullish_floor ({}) must not exceed rsi.bearish_ceiling ({})",
                rsi.bullish_floor, rsi.bearish_ceiling
            ));
        }
        let adx = &self.adx;
        if adx.weak > adx.strong || adx.strong > adx.extreme {
            return Err(format!(
                "adx thresholds must be ordered weak <= strong <= extreme, got {} / {} / {}",
                adx.weak, adx.strong, adx.extreme
            ));
        }
        let stoch = &self.stochastic;
        if stoch.oversold >= stoch.overbought {
            return Err(format!(
                "stochastic.oversold ({}) must be below stochastic.overbought ({})",
                stoch.oversold, stoch.overbought
            ));
        }
        let entry = &self.entry;
        if entry.neutral > entry.good || entry.good > entry.excellent {
            return Err("entry grade cut-offs must be ordered neutral <= good <= excellent".into());
        }
        if self.composite.threshold < 0.0 {
            return Err("composite.threshold must be non-negative".into());
        }
        Ok(())
    }
}

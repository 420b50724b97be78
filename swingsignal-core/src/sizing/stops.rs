//! Stop-loss / take-profit levels keyed by trend regime.

use serde::{Deserialize, Serialize};

use super::{PositionSide, SizingError};
use crate::classify::RsiRegime;

/// Stop and target distance as fractions of the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTarget {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl StopTarget {
    pub const fn new(stop_loss: f64, take_profit: f64) -> Self {
        Self {
            stop_loss,
            take_profit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTable {
    pub bullish: StopTarget,
    pub bearish: StopTarget,
    pub sideways: StopTarget,
    /// Used when the regime is unknown.
    pub fallback: StopTarget,
}

impl Default for RiskTable {
    fn default() -> Self {
        Self {
            bullish: StopTarget::new(0.03, 0.06),
            bearish: StopTarget::new(0.02, 0.04),
            sideways: StopTarget::new(0.015, 0.03),
            fallback: StopTarget::new(0.03, 0.05),
        }
    }
}

impl RiskTable {
    pub fn for_regime(&self, regime: RsiRegime) -> StopTarget {
        match regime {
            RsiRegime::Bullish => self.bullish,
            RsiRegime::Bearish => self.bearish,
            RsiRegime::Sideways => self.sideways,
            RsiRegime::Unknown => self.fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub side: PositionSide,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub percentages: StopTarget,
}

#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    table: RiskTable,
}

impl RiskManager {
    pub fn new(table: RiskTable) -> Self {
        Self { table }
    }

    pub fn levels(&self, entry: f64, regime: RsiRegime, side: PositionSide) -> RiskLevels {
        let pct = self.table.for_regime(regime);
        let (stop_loss, take_profit) = match side {
            PositionSide::Long => (entry * (1.0 - pct.stop_loss), entry * (1.0 + pct.take_profit)),
            PositionSide::Short => (entry * (1.0 + pct.stop_loss), entry * (1.0 - pct.take_profit)),
        };
        RiskLevels {
            side,
            entry,
            stop_loss,
            take_profit,
            percentages: pct,
        }
    }

    /// Levels from free-form labels. The regime is matched case-insensitively
    /// and falls back to the unknown row; the side must be `long` or `short`.
    pub fn levels_for(&self, entry: f64, regime: &str, side: &str) -> Result<RiskLevels, SizingError> {
        let side: PositionSide = side.parse()?;
        let regime = regime.parse::<RsiRegime>().unwrap_or(RsiRegime::Unknown);
        Ok(self.levels(entry, regime, side))
    }
}

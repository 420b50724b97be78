//! Sizing and risk: turn an executable plan into a share count and price levels.
//!
//! - [`PositionSizer`]: fixed-fractional risk sizing scaled by risk level and confidence
//! - [`RiskManager`]: regime-keyed stop-loss / take-profit percentages
//!
//! Both are per-call pure functions. Their failures are returned to the
//! caller, who must check them before acting.

pub mod position;
pub mod stops;

pub use position::{PositionSizer, PositionSizing, RiskMultipliers, SizingRequest};
pub use stops::{RiskLevels, RiskManager, RiskTable, StopTarget};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-call sizing/risk failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("stop price equals entry price {entry}: stop distance is zero")]
    ZeroStopDistance { entry: f64 },

    #[error("invalid position type '{0}' (expected long or short)")]
    InvalidPositionType(String),
}

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn label(self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PositionSide {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(PositionSide::Long),
            "short" => Ok(PositionSide::Short),
            _ => Err(SizingError::InvalidPositionType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parsing() {
        assert_eq!("LONG".parse::<PositionSide>(), Ok(PositionSide::Long));
        assert_eq!(" short ".parse::<PositionSide>(), Ok(PositionSide::Short));
        assert_eq!(
            "flat".parse::<PositionSide>(),
            Err(SizingError::InvalidPositionType("flat".into()))
        );
    }

    #[test]
    fn error_messages() {
        let err = SizingError::InvalidPositionType("hedge".into());
        assert_eq!(
            err.to_string(),
            "invalid position type 'hedge' (expected long or short)"
        );
    }
}

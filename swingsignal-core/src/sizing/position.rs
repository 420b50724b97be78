//! Fixed-fractional position sizer.
//!
//! # Formula
//! ```text
//! risk_amount   = account_size * risk_pct / 100
//! stop_distance = |entry - stop|
//! base_size     = risk_amount / stop_distance
//! position_size = base_size * risk_multiplier(risk_level) * confidence
//! ```
//!
//! # Example
//! - Account: $10,000, risk 1% ($100)
//! - Entry $50, stop $48 (distance $2)
//! - Base size: 50 shares; moderate risk (×1.0), confidence 0.55 → 27.5 shares

use serde::{Deserialize, Serialize};

use super::SizingError;
use crate::decision::RiskLevel;

/// Size multiplier per risk level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMultipliers {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
    /// Used for labels that name no known level.
    pub fallback: f64,
}

impl Default for RiskMultipliers {
    fn default() -> Self {
        Self {
            low: 1.2,
            moderate: 1.0,
            high: 0.8,
            fallback: 1.0,
        }
    }
}

impl RiskMultipliers {
    pub fn for_level(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High => self.high,
        }
    }

    /// Multiplier for a free-form label; unrecognized labels get the fallback.
    pub fn for_label(&self, label: &str) -> f64 {
        label
            .parse::<RiskLevel>()
            .map(|level| self.for_level(level))
            .unwrap_or(self.fallback)
    }
}

/// One sizing question. Defaults: 1% risk, full confidence, moderate risk.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingRequest {
    pub entry: f64,
    pub stop: f64,
    pub risk_pct: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

impl SizingRequest {
    pub fn new(entry: f64, stop: f64) -> Self {
        Self {
            entry,
            stop,
            risk_pct: 1.0,
            confidence: 1.0,
            risk_level: RiskLevel::Moderate,
        }
    }

    pub fn risk_pct(mut self, risk_pct: f64) -> Self {
        self.risk_pct = risk_pct;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizing {
    pub position_size: f64,
    pub risk_amount: f64,
    pub stop_loss_distance: f64,
    pub risk_multiplier: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone)]
pub struct PositionSizer {
    account_size: f64,
    multipliers: RiskMultipliers,
}

impl PositionSizer {
    pub fn new(account_size: f64) -> Self {
        Self {
            account_size,
            multipliers: RiskMultipliers::default(),
        }
    }

    pub fn with_multipliers(mut self, multipliers: RiskMultipliers) -> Self {
        self.multipliers = multipliers;
        self
    }

    pub fn account_size(&self) -> f64 {
        self.account_size
    }

    /// Size a position. Fails with `ZeroStopDistance` when entry equals stop.
    pub fn size(&self, request: &SizingRequest) -> Result<PositionSizing, SizingError> {
        let stop_loss_distance = (request.entry - request.stop).abs();
        if stop_loss_distance == 0.0 {
            return Err(SizingError::ZeroStopDistance {
                entry: request.entry,
            });
        }

        let risk_amount = self.account_size * request.risk_pct / 100.0;
        let base_size = risk_amount / stop_loss_distance;
        let risk_multiplier = self.multipliers.for_level(request.risk_level);

        Ok(PositionSizing {
            position_size: base_size * risk_multiplier * request.confidence,
            risk_amount,
            stop_loss_distance,
            risk_multiplier,
            confidence: request.confidence,
            risk_level: request.risk_level,
        })
    }
}

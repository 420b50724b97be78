//! Serializable run configuration, loaded from TOML.
//!
//! Every section is optional in the file; missing values take the defaults
//! below. `validate()` rejects combinations the pipeline cannot run with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use swingsignal_core::composite::{CompositeConfig, StockProfile, TradingStatus};
use swingsignal_core::AnalysisConfig;
use thiserror::Error;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Which signal source the replay evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Regime combiner + decision engine.
    #[default]
    Decision,
    /// Weighted per-indicator vote.
    Composite,
}

impl EvaluationMode {
    pub fn label(self) -> &'static str {
        match self {
            EvaluationMode::Decision => "decision",
            EvaluationMode::Composite => "composite",
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EvaluationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decision" => Ok(EvaluationMode::Decision),
            "composite" => Ok(EvaluationMode::Composite),
            other => Err(ConfigError::Invalid(format!(
                "unknown mode '{other}' (expected decision or composite)"
            ))),
        }
    }
}

/// Historical replay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// First bar index that gets a signal record.
    pub min_window: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { min_window: 20 }
    }
}

/// Period clustering and evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Bars after a period's end date searched for the maximum close.
    pub evaluation_days: usize,
    /// Minimum relative rise that counts as a hit (0.05 = 5%).
    pub min_change: f64,
    /// Buy dates at most this many calendar days apart share a period.
    pub max_gap_days: i64,
    pub mode: EvaluationMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            evaluation_days: 10,
            min_change: 0.05,
            max_gap_days: 5,
            mode: EvaluationMode::Decision,
        }
    }
}

/// Account used for trade setups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub account_size: f64,
    /// Risk per trade in percent of the account (1.0 = 1%).
    pub risk_pct: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            risk_pct: 1.0,
        }
    }
}

/// Composite vote preset for the stock being analyzed.
///
/// A `stock_profile` replaces the composite weights, threshold and modifier
/// with the category preset. A `trading_status` alone only sets the modifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub stock_profile: Option<StockProfile>,
    pub trading_status: TradingStatus,
}

/// Complete configuration of an analysis or backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub analysis: AnalysisConfig,
    pub profile: ProfileConfig,
    pub replay: ReplayConfig,
    pub backtest: BacktestConfig,
    pub account: AccountConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Analysis config with the profile preset applied.
    pub fn analysis_config(&self) -> AnalysisConfig {
        let mut analysis = self.analysis.clone();
        let status = self.profile.trading_status;
        match self.profile.stock_profile {
            Some(profile) => {
                let preset = CompositeConfig::for_profile(profile, status);
                let composite = &mut analysis.composite;
                composite.weights = preset.weights;
                composite.threshold = preset.threshold;
                composite.modifier = preset.modifier;
            }
            None if status != TradingStatus::None => {
                analysis.composite.modifier = status.modifier();
            }
            None => {}
        }
        analysis
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis_config().check().map_err(ConfigError::Invalid)?;

        if self.replay.min_window == 0 {
            return Err(ConfigError::Invalid("replay.min_window must be positive".into()));
        }
        if self.backtest.evaluation_days == 0 {
            return Err(ConfigError::Invalid(
                "backtest.evaluation_days must be positive".into(),
            ));
        }
        if !(self.backtest.min_change >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "backtest.min_change must be non-negative, got {}",
                self.backtest.min_change
            )));
        }
        if self.backtest.max_gap_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.max_gap_days must be non-negative, got {}",
                self.backtest.max_gap_days
            )));
        }
        if !(self.account.account_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "account.account_size must be positive, got {}",
                self.account.account_size
            )));
        }
        if !(self.account.risk_pct > 0.0 && self.account.risk_pct <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "account.risk_pct must be in (0, 100], got {}",
                self.account.risk_pct
            )));
        }
        Ok(())
    }

    /// Deterministic hash of the configuration, for report provenance.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

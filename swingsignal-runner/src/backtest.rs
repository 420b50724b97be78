//! Backtest runner: replay, cluster, evaluate.
//!
//! Two entry points:
//! - `run_backtest_from_file()`: loads a CSV, then runs. Used by the CLI.
//! - `run_backtest()`: takes an already loaded series.
//!
//! The report carries everything needed to reproduce the numbers: schema
//! version, dataset hash, config hash and the full signal tape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use swingsignal_core::Analyzer;

use crate::config::{ConfigError, EvaluationMode, RunConfig};
use crate::data_loader::{load_csv, LoadError, LoadedSeries, SkippedRow};
use crate::evaluate::{
    evaluate_periods, evaluate_signal_dates, EvaluationSummary, LookaheadRule, PeriodEvaluation,
    SignalHitRate,
};
use crate::periods::{cluster_periods, BuyPeriod};
use crate::replay::{buy_dates, SignalGenerator, SignalRecord};

/// Errors from the backtest runner.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub mode: EvaluationMode,
    pub dataset_hash: String,
    pub config_hash: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub bar_count: usize,
    pub min_window: usize,
    pub rule: LookaheadRule,
    pub max_gap_days: i64,
    pub record_count: usize,
    pub buy_signal_count: usize,
    pub periods: Vec<BuyPeriod>,
    pub evaluations: Vec<PeriodEvaluation>,
    pub summary: EvaluationSummary,
    pub signal_hit_rate: SignalHitRate,
    #[serde(default)]
    pub skipped_rows: Vec<SkippedRow>,
    pub records: Vec<SignalRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load `path` and run a backtest on it.
pub fn run_backtest_from_file(
    path: &Path,
    symbol: Option<&str>,
    config: &RunConfig,
) -> Result<BacktestReport, BacktestError> {
    config.validate()?;
    let loaded = load_csv(path, symbol)?;
    info!(
        symbol = loaded.series.symbol(),
        bars = loaded.series.len(),
        skipped = loaded.skipped_rows.len(),
        "loaded {}",
        path.display()
    );
    run_backtest(&loaded, config)
}

/// Replay the pipeline over `loaded`, cluster buy dates and evaluate periods.
pub fn run_backtest(
    loaded: &LoadedSeries,
    config: &RunConfig,
) -> Result<BacktestReport, BacktestError> {
    config.validate()?;
    let series = &loaded.series;
    let bt = &config.backtest;

    let generator = SignalGenerator::new(
        Analyzer::new(config.analysis_config()),
        config.replay.min_window,
        bt.mode,
    );
    let records = generator.generate(series);
    let dates = buy_dates(&records);
    info!(
        mode = %bt.mode,
        records = records.len(),
        buy_signals = dates.len(),
        "replay complete"
    );

    let rule = LookaheadRule::new(bt.evaluation_days, bt.min_change);
    let periods = cluster_periods(&dates, bt.max_gap_days);
    let evaluations = evaluate_periods(series, &periods, &rule);
    let summary = EvaluationSummary::from_evaluations(&evaluations);
    let signal_hit_rate = evaluate_signal_dates(series, &dates, &rule);
    info!(
        periods = summary.periods,
        closed = summary.closed,
        open = summary.open,
        hits = summary.hits,
        hit_rate = ?summary.hit_rate,
        "evaluation complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        symbol: series.symbol().to_string(),
        mode: bt.mode,
        dataset_hash: loaded.dataset_hash.clone(),
        config_hash: config.config_hash()?,
        first_date: series.first_date(),
        last_date: series.last_date(),
        bar_count: series.len(),
        min_window: config.replay.min_window,
        rule,
        max_gap_days: bt.max_gap_days,
        record_count: records.len(),
        buy_signal_count: dates.len(),
        periods,
        evaluations,
        summary,
        signal_hit_rate,
        skipped_rows: loaded.skipped_rows.clone(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::dataset_hash;
    use swingsignal_core::domain::{Column, PriceBar, PriceSeries};

    fn loaded(n: usize) -> LoadedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let phase = i as f64 / 4.0;
                let close = 100.0 + 5.0 * (phase - 1.0).sin();
                let mut bar = PriceBar::from_close(start + chrono::Duration::days(i as i64), close);
                bar.set(Column::Rsi, Some(45.0 + 20.0 * phase.sin()));
                bar.set(Column::Macd, Some(0.0));
                bar.set(Column::MacdSignal, Some(0.1));
                bar.set(Column::MacdHist, Some(-0.1));
                bar.set(Column::Adx, Some(12.0));
                bar.set(Column::PlusDi, Some(20.0));
                bar.set(Column::MinusDi, Some(20.0));
                bar
            })
            .collect();
        let series = PriceSeries::from_bars("SYN", bars).unwrap();
        LoadedSeries {
            dataset_hash: dataset_hash(&series),
            series,
            skipped_rows: vec![],
        }
    }

    #[test]
    fn report_is_consistent() {
        let data = loaded(120);
        let report = run_backtest(&data, &RunConfig::default()).unwrap();

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.bar_count, 120);
        assert_eq!(report.record_count, 100);
        assert_eq!(report.records.len(), 100);
        assert!(report.buy_signal_count > 0);
        assert_eq!(report.periods.len(), report.evaluations.len());
        assert_eq!(report.summary.periods, report.periods.len());
        assert_eq!(
            report.summary.closed + report.summary.open + report.summary.not_found,
            report.summary.periods
        );
        let evaluated = report.signal_hit_rate.evaluated + report.signal_hit_rate.pending;
        assert_eq!(evaluated, report.buy_signal_count);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = RunConfig::default();
        config.backtest.min_change = -1.0;
        assert!(matches!(
            run_backtest(&loaded(30), &config),
            Err(BacktestError::Config(_))
        ));
    }

    #[test]
    fn short_series_has_empty_results() {
        let report = run_backtest(&loaded(15), &RunConfig::default()).unwrap();
        assert_eq!(report.record_count, 0);
        assert!(report.periods.is_empty());
        assert_eq!(report.summary.hit_rate, None);
        assert_eq!(report.signal_hit_rate.hit_rate, None);
    }

    #[test]
    fn composite_mode_is_recorded() {
        let mut config = RunConfig::default();
        config.backtest.mode = EvaluationMode::Composite;
        let report = run_backtest(&loaded(60), &config).unwrap();
        assert_eq!(report.mode, EvaluationMode::Composite);
        assert!(report.records.iter().all(|r| r.composite_score.is_some()));
    }
}

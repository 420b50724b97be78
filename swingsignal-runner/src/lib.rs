//! SwingSignal Runner: data loading, historical replay, backtest, reporting.
//!
//! This crate builds on `swingsignal-core` to provide:
//! - TOML run configuration layered over the core analysis config
//! - CSV loading of the precomputed daily table, with BLAKE3 fingerprint
//! - Latest-bar snapshot with a sized trade setup
//! - Parallel historical replay (decision or composite mode)
//! - Buy-period clustering and forward-lookahead evaluation
//! - JSON / CSV / Markdown report export

pub mod backtest;
pub mod config;
pub mod data_loader;
pub mod evaluate;
pub mod export;
pub mod periods;
pub mod replay;
pub mod snapshot;

pub use backtest::{
    run_backtest, run_backtest_from_file, BacktestError, BacktestReport, SCHEMA_VERSION,
};
pub use config::{
    AccountConfig, BacktestConfig, ConfigError, EvaluationMode, ProfileConfig, ReplayConfig,
    RunConfig,
};
pub use data_loader::{dataset_hash, load_csv, parse_csv, LoadError, LoadedSeries, SkippedRow};
pub use evaluate::{
    evaluate_periods, evaluate_signal_dates, EvaluationSummary, LookaheadRule, PeriodEvaluation,
    PeriodStatus, SignalHitRate,
};
pub use periods::{cluster_periods, BuyPeriod};
pub use replay::{buy_dates, SignalGenerator, SignalRecord};
pub use snapshot::{analyze_latest, Snapshot};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_is_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<Snapshot>();
        assert_sync::<Snapshot>();
    }

    #[test]
    fn generator_is_send_sync() {
        assert_send::<SignalGenerator>();
        assert_sync::<SignalGenerator>();
        assert_send::<SignalRecord>();
        assert_sync::<SignalRecord>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadedSeries>();
        assert_sync::<LoadedSeries>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<BacktestError>();
        assert_sync::<BacktestError>();
    }
}

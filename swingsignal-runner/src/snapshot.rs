//! Latest-bar analysis with a concrete trade setup.

use chrono::NaiveDate;
use serde::Serialize;
use swingsignal_core::classify::RsiHistory;
use swingsignal_core::composite::CompositeSignal;
use swingsignal_core::domain::PriceSeries;
use swingsignal_core::{Analysis, Analyzer, TradeSetup};
use tracing::warn;

use crate::config::RunConfig;

/// Everything the `analyze` command reports for the last bar of a series.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub analysis: Analysis,
    pub composite: CompositeSignal,
    pub rsi_history: Option<RsiHistory>,
    /// Present when the plan executes and sizing succeeds.
    pub setup: Option<TradeSetup>,
    /// Sizing failure for an executable plan.
    pub setup_error: Option<String>,
}

/// Analyse the last bar of `series`, entering at its close.
pub fn analyze_latest(series: &PriceSeries, config: &RunConfig) -> Snapshot {
    let analyzer = Analyzer::new(config.analysis_config());
    let window = series.full();
    let analysis = analyzer.analyze(&window);
    let composite = analyzer.composite(&window);
    let rsi_history = analyzer.rsi_classifier().history(&window);

    let entry_price = series.bars()[series.len() - 1].close;
    let (setup, setup_error) = match analyzer.trade_setup(
        &analysis,
        entry_price,
        config.account.account_size,
        config.account.risk_pct,
    ) {
        Ok(setup) => (setup, None),
        Err(err) => {
            warn!(symbol = series.symbol(), "trade setup failed: {err}");
            (None, Some(err.to_string()))
        }
    };

    Snapshot {
        symbol: series.symbol().to_string(),
        as_of: series.last_date(),
        analysis,
        composite,
        rsi_history,
        setup,
        setup_error,
    }
}

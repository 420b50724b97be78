//! Single-window analysis: classifiers → regime → decision → entry → plan.
//!
//! The [`Analyzer`] owns one instance of every stage, built once from an
//! [`AnalysisConfig`], and evaluates a [`SeriesWindow`] end to end. It only
//! ever sees the window it is handed, so replaying prefixes of a series can
//! never leak future bars into a past decision.

use chrono::NaiveDate;
use serde::Serialize;

use crate::classify::{
    AdxClassifier, AdxReading, BollingerClassifier, BollingerReading, IndicatorReading,
    MacdClassifier, MacdReading, ReadingSummary, RsiClassifier, RsiReading, StochasticClassifier,
    StochasticReading,
};
use crate::composite::{CompositeScorer, CompositeSignal};
use crate::config::AnalysisConfig;
use crate::decision::{Action, Decision, DecisionEngine};
use crate::domain::SeriesWindow;
use crate::entry::{EntryQuality, EntryQualityScorer};
use crate::plan::{TradePlan, TradePlanBuilder};
use crate::regime::{RegimeCombiner, RegimeResult};
use crate::sizing::{
    PositionSide, PositionSizer, PositionSizing, RiskLevels, RiskManager, SizingError,
    SizingRequest,
};

/// Full result of analysing the latest bar of a window.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
    pub rsi: RsiReading,
    pub macd: MacdReading,
    pub adx: AdxReading,
    pub bollinger: BollingerReading,
    pub stochastic: StochasticReading,
    pub regime: RegimeResult,
    pub decision: Decision,
    pub entry: EntryQuality,
    pub plan: TradePlan,
}

impl Analysis {
    /// Uniform summaries in a fixed order: RSI, MACD, ADX, Bollinger, Stochastic.
    pub fn summaries(&self) -> Vec<ReadingSummary> {
        vec![
            self.rsi.summary(),
            self.macd.summary(),
            self.adx.summary(),
            self.bollinger.summary(),
            self.stochastic.summary(),
        ]
    }
}

/// Executable plan with concrete stop/target levels and a share count.
#[derive(Debug, Clone, Serialize)]
pub struct TradeSetup {
    pub plan: TradePlan,
    pub levels: RiskLevels,
    pub sizing: PositionSizing,
    /// Position size after the entry-quality size factor.
    pub scaled_position_size: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
    rsi: RsiClassifier,
    macd: MacdClassifier,
    adx: AdxClassifier,
    bollinger: BollingerClassifier,
    stochastic: StochasticClassifier,
    combiner: RegimeCombiner,
    entry: EntryQualityScorer,
    engine: DecisionEngine,
    planner: TradePlanBuilder,
    composite: CompositeScorer,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            rsi: RsiClassifier::new(config.rsi.clone()),
            macd: MacdClassifier::new(config.macd.clone()),
            adx: AdxClassifier::new(config.adx.clone()),
            bollinger: BollingerClassifier,
            stochastic: StochasticClassifier::new(config.stochastic.clone()),
            combiner: RegimeCombiner::new(config.regime.clone()),
            entry: EntryQualityScorer::new(config.entry.clone()),
            engine: DecisionEngine::new(config.decision.clone()),
            planner: TradePlanBuilder::new(config.size_factors.clone()),
            composite: CompositeScorer::new(config.composite.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn rsi_classifier(&self) -> &RsiClassifier {
        &self.rsi
    }

    pub fn analyze(&self, window: &SeriesWindow<'_>) -> Analysis {
        let rsi = self.rsi.classify(window);
        let macd = self.macd.classify(window);
        let adx = self.adx.classify(window);
        let bollinger = self.bollinger.classify(window);
        let stochastic = self.stochastic.classify(window);

        let regime = self.combiner.combine(&rsi, &macd, &adx);
        let decision = self.engine.decide(&regime, &rsi, &macd, &adx);
        let entry = self.entry.score(&bollinger, &stochastic, regime.market_regime);
        let plan = self.planner.build(&decision, &entry);

        Analysis {
            date: window.as_of(),
            close: window.last().map(|bar| bar.close),
            rsi,
            macd,
            adx,
            bollinger,
            stochastic,
            regime,
            decision,
            entry,
            plan,
        }
    }

    /// Decision only: skips the Bollinger/Stochastic/plan stages.
    pub fn decide(&self, window: &SeriesWindow<'_>) -> Decision {
        let rsi = self.rsi.classify(window);
        let macd = self.macd.classify(window);
        let adx = self.adx.classify(window);
        let regime = self.combiner.combine(&rsi, &macd, &adx);
        self.engine.decide(&regime, &rsi, &macd, &adx)
    }

    pub fn composite(&self, window: &SeriesWindow<'_>) -> CompositeSignal {
        self.composite.score(window)
    }

    /// Stop/target levels and position size for an executable plan.
    ///
    /// The stop table is keyed by the RSI trend regime; BUY trades long and
    /// SELL trades short. Returns `Ok(None)` when the plan skips.
    pub fn trade_setup(
        &self,
        analysis: &Analysis,
        entry_price: f64,
        account_size: f64,
        risk_pct: f64,
    ) -> Result<Option<TradeSetup>, SizingError> {
        let side = match (&analysis.plan, analysis.decision.action) {
            (TradePlan::Skip { .. }, _) => return Ok(None),
            (_, Action::Buy) => PositionSide::Long,
            (_, Action::Sell) => PositionSide::Short,
            (_, other) => return Err(SizingError::InvalidPositionType(other.label().to_string())),
        };

        let levels = RiskManager::new(self.config.risk_table.clone()).levels(
            entry_price,
            analysis.rsi.regime,
            side,
        );
        let request = SizingRequest::new(entry_price, levels.stop_loss)
            .risk_pct(risk_pct)
            .confidence(analysis.decision.confidence)
            .risk_level(analysis.decision.risk_level);
        let sizing = PositionSizer::new(account_size)
            .with_multipliers(self.config.risk_multipliers.clone())
            .size(&request)?;

        Ok(Some(TradeSetup {
            scaled_position_size: sizing.position_size * analysis.plan.size_factor(),
            plan: analysis.plan.clone(),
            levels,
            sizing,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support::series_with;
    use crate::classify::RsiRegime;
    use crate::domain::{Column, PriceBar};
    use crate::regime::MarketRegime;

    const EPS: f64 = 1e-9;

    /// Range market (ADX 15) with oversold RSI and price under the lower band.
    fn oversold_range(bar: &mut PriceBar, i: usize) {
        bar.close = 88.0;
        bar.set(Column::Rsi, Some(if i == 0 { 30.0 } else { 25.0 }));
        bar.set(Column::Macd, Some(-0.5));
        bar.set(Column::MacdSignal, Some(-0.3));
        bar.set(Column::MacdHist, Some(-0.2));
        bar.set(Column::Adx, Some(15.0));
        bar.set(Column::PlusDi, Some(15.0));
        bar.set(Column::MinusDi, Some(25.0));
        bar.set(Column::BbUpper, Some(110.0));
        bar.set(Column::BbMiddle, Some(100.0));
        bar.set(Column::BbLower, Some(90.0));
        bar.set(Column::StochK, Some(if i == 0 { 10.0 } else { 15.0 }));
        bar.set(Column::StochD, Some(if i == 0 { 12.0 } else { 13.0 }));
    }

    #[test]
    fn oversold_range_buys_with_excellent_entry() {
        let series = series_with(3, |i, bar| oversold_range(bar, i.saturating_sub(1)));
        let analysis = Analyzer::default().analyze(&series.full());

        assert_eq!(analysis.regime.market_regime, MarketRegime::RangeMarket);
        assert_eq!(analysis.decision.action, Action::Buy);
        assert!((analysis.decision.confidence - 0.55).abs() < EPS);
        assert_eq!(analysis.plan.size_factor(), 1.0);
        assert_eq!(analysis.date, series.bars().last().map(|b| b.date));
        assert_eq!(analysis.summaries().len(), 5);
    }

    #[test]
    fn decide_matches_full_analysis() {
        let series = series_with(3, |i, bar| oversold_range(bar, i.saturating_sub(1)));
        let analyzer = Analyzer::default();
        let full = analyzer.analyze(&series.full());
        let quick = analyzer.decide(&series.full());
        assert_eq!(full.decision.action, quick.action);
        assert_eq!(full.decision.reason, quick.reason);
    }

    #[test]
    fn empty_columns_produce_no_trade() {
        let series = series_with(5, |_, _| {});
        let analysis = Analyzer::default().analyze(&series.full());
        assert_eq!(analysis.regime.market_regime, MarketRegime::Unknown);
        assert_eq!(analysis.decision.action, Action::NoTrade);
        assert!(!analysis.plan.execute());
        assert!(!analysis.rsi.is_valid());
    }

    #[test]
    fn trade_setup_for_long_entry() {
        let series = series_with(3, |i, bar| oversold_range(bar, i.saturating_sub(1)));
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&series.full());
        assert_eq!(analysis.rsi.regime, RsiRegime::Bearish);

        let setup = analyzer
            .trade_setup(&analysis, 100.0, 10_000.0, 1.0)
            .unwrap()
            .unwrap();
        // bearish row: 2% stop, 4% target
        assert!((setup.levels.stop_loss - 98.0).abs() < EPS);
        assert!((setup.levels.take_profit - 104.0).abs() < EPS);
        // 100 / 2 = 50 shares, moderate ×1.0, confidence 0.55
        assert!((setup.sizing.position_size - 27.5).abs() < EPS);
        assert!((setup.scaled_position_size - 27.5).abs() < EPS);
    }

    #[test]
    fn skipped_plan_has_no_setup() {
        let series = series_with(5, |_, _| {});
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&series.full());
        assert!(analyzer
            .trade_setup(&analysis, 100.0, 10_000.0, 1.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn zero_entry_price_fails_sizing() {
        let series = series_with(3, |i, bar| oversold_range(bar, i.saturating_sub(1)));
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&series.full());
        let err = analyzer.trade_setup(&analysis, 0.0, 10_000.0, 1.0).unwrap_err();
        assert_eq!(err, SizingError::ZeroStopDistance { entry: 0.0 });
    }
}

//! Integration tests for replay, clustering and period evaluation.
//!
//! Scenarios:
//! 1. Clustering of [D1, D1+3, D1+10] with a 5-day gap
//! 2. 9% vs 7% rise against an 8% threshold
//! 3. Open periods reported but excluded from the hit rate
//! 4. Replay of a prefix ignores later bars
//! 5. End-to-end: oversold range market produces an early buy period
//! 6. Clustering properties for arbitrary date sets

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use swingsignal_core::classify::Signal;
use swingsignal_core::decision::Action;
use swingsignal_core::domain::{Column, PriceBar, PriceSeries};
use swingsignal_core::Analyzer;
use swingsignal_runner::backtest::run_backtest;
use swingsignal_runner::config::{EvaluationMode, RunConfig};
use swingsignal_runner::data_loader::{dataset_hash, LoadedSeries};
use swingsignal_runner::evaluate::{
    evaluate_periods, EvaluationSummary, LookaheadRule, PeriodStatus,
};
use swingsignal_runner::periods::{cluster_periods, BuyPeriod};
use swingsignal_runner::replay::SignalGenerator;

fn d1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn day(n: i64) -> NaiveDate {
    d1() + Duration::days(n)
}

fn close_series(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(day(i as i64), c))
        .collect();
    PriceSeries::from_bars("EVAL", bars).unwrap()
}

// ── 1. Clustering ────────────────────────────────────────────────────

#[test]
fn clustering_splits_on_gap_beyond_limit() {
    let periods = cluster_periods(&[day(0), day(3), day(10)], 5);
    assert_eq!(
        periods,
        vec![
            BuyPeriod { start: day(0), end: day(3) },
            BuyPeriod { start: day(10), end: day(10) },
        ]
    );
}

#[test]
fn clustering_empty_input() {
    assert_eq!(cluster_periods(&[], 5), Vec::<BuyPeriod>::new());
}

// ── 2. Threshold ─────────────────────────────────────────────────────

fn peak_series(peak: f64) -> PriceSeries {
    // E = day 0 with close 100; peak inside E..E+5; series runs to E+8
    close_series(&[100.0, 101.0, 104.0, peak, 102.0, 99.0, 98.0, 97.0, 96.0])
}

#[test]
fn nine_percent_is_a_hit_seven_is_not() {
    let rule = LookaheadRule::new(5, 0.08);
    let period = [BuyPeriod { start: day(0), end: day(0) }];

    let hit = evaluate_periods(&peak_series(109.0), &period, &rule);
    assert_eq!(hit[0].status, PeriodStatus::Closed);
    assert_eq!(hit[0].hit, Some(true));

    let miss = evaluate_periods(&peak_series(107.0), &period, &rule);
    assert_eq!(miss[0].status, PeriodStatus::Closed);
    assert_eq!(miss[0].hit, Some(false));
}

// ── 3. Open periods ──────────────────────────────────────────────────

#[test]
fn open_period_is_reported_but_not_counted() {
    let series = close_series(&[100.0; 12]);
    let rule = LookaheadRule::new(5, 0.0);
    let periods = [
        BuyPeriod { start: day(0), end: day(2) },
        BuyPeriod { start: day(9), end: day(10) },
    ];
    let evals = evaluate_periods(&series, &periods, &rule);
    assert_eq!(evals[0].status, PeriodStatus::Closed);
    assert_eq!(evals[1].status, PeriodStatus::Open);

    let summary = EvaluationSummary::from_evaluations(&evals);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.open, 1);
    assert_eq!(summary.hits, 1);
    assert_eq!(summary.hit_rate, Some(1.0));
}

#[test]
fn only_open_periods_have_no_hit_rate() {
    let series = close_series(&[100.0, 120.0, 130.0]);
    let rule = LookaheadRule::new(5, 0.05);
    let evals = evaluate_periods(&series, &[BuyPeriod { start: day(0), end: day(0) }], &rule);
    assert_eq!(evals[0].status, PeriodStatus::Open);
    assert_eq!(EvaluationSummary::from_evaluations(&evals).hit_rate, None);
}

// ── 4. No lookahead in the replay ────────────────────────────────────

fn indicator_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let phase = i as f64 / 5.0;
            let close = 100.0 + 6.0 * phase.sin();
            let mut bar = PriceBar::from_close(day(i as i64), close);
            bar.set(Column::Rsi, Some(50.0 + 28.0 * (phase + 0.5).sin()));
            bar.set(Column::Macd, Some(phase.sin()));
            bar.set(Column::MacdSignal, Some((phase - 0.3).sin()));
            bar.set(Column::MacdHist, Some(phase.sin() - (phase - 0.3).sin()));
            bar.set(Column::Adx, Some(25.0 + 18.0 * (phase / 2.0).sin()));
            bar.set(Column::PlusDi, Some(25.0 + 8.0 * phase.cos()));
            bar.set(Column::MinusDi, Some(25.0 - 8.0 * phase.cos()));
            bar.set(Column::BbUpper, Some(close + 4.0));
            bar.set(Column::BbMiddle, Some(100.0));
            bar.set(Column::BbLower, Some(96.0 - phase.cos()));
            bar.set(Column::StochK, Some(50.0 + 45.0 * (phase * 1.4).sin()));
            bar.set(Column::StochD, Some(50.0 + 45.0 * (phase * 1.4 - 0.4).sin()));
            bar
        })
        .collect()
}

#[test]
fn replay_of_prefix_ignores_later_bars() {
    let bars = indicator_bars(150);
    let full = PriceSeries::from_bars("LA", bars.clone()).unwrap();
    let truncated = PriceSeries::from_bars("LA", bars[..75].to_vec()).unwrap();

    for mode in [EvaluationMode::Decision, EvaluationMode::Composite] {
        let generator = SignalGenerator::new(Analyzer::default(), 20, mode);
        let short = generator.generate(&truncated);
        let long = generator.generate(&full);
        assert_eq!(short.len(), 55);
        assert_eq!(short[..], long[..short.len()], "mode {mode}");
    }
}

// ── 5. End-to-end ────────────────────────────────────────────────────

/// RSI rising 25 → 45 in a range market (ADX 15), price climbing afterwards.
fn rising_rsi_range(n: usize) -> LoadedSeries {
    let bars = (0..n)
        .map(|i| {
            let mut bar = PriceBar::from_close(day(i as i64), 100.0 + i as f64);
            bar.set(Column::Rsi, Some(25.0 + 20.0 * i as f64 / (n - 1) as f64));
            bar.set(Column::Macd, Some(-0.2));
            bar.set(Column::MacdSignal, Some(-0.1));
            bar.set(Column::MacdHist, Some(-0.1));
            bar.set(Column::Adx, Some(15.0));
            bar.set(Column::PlusDi, Some(18.0));
            bar.set(Column::MinusDi, Some(22.0));
            bar
        })
        .collect();
    let series = PriceSeries::from_bars("E2E", bars).unwrap();
    LoadedSeries {
        dataset_hash: dataset_hash(&series),
        series,
        skipped_rows: vec![],
    }
}

#[test]
fn oversold_start_forms_one_closed_hit_period() {
    let mut config = RunConfig::default();
    config.replay.min_window = 1;
    let report = run_backtest(&rising_rsi_range(60), &config).unwrap();

    // buys while RSI <= 30, i.e. the first quarter of the series
    let first_hold = report
        .records
        .iter()
        .position(|r| r.signal == Signal::Hold)
        .unwrap();
    assert!(first_hold > 0);
    assert!(report.records[..first_hold]
        .iter()
        .all(|r| r.action == Some(Action::Buy)));
    assert!(report.records[first_hold..]
        .iter()
        .all(|r| r.action == Some(Action::NoTrade)));

    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].start, day(1));
    assert_eq!(report.summary.closed, 1);
    // period ends at close 114; the 10-day window peaks at 124
    assert_eq!(report.summary.hit_rate, Some(1.0));
    assert_eq!(report.signal_hit_rate.pending, 0);
    assert_eq!(report.signal_hit_rate.hit_rate, Some(1.0));
}

// ── 6. Clustering properties ─────────────────────────────────────────

fn arb_dates() -> impl Strategy<Value = Vec<NaiveDate>> {
    prop::collection::vec(0i64..200, 0..40).prop_map(|offsets| offsets.into_iter().map(day).collect())
}

proptest! {
    #[test]
    fn every_date_lands_in_exactly_one_period(dates in arb_dates(), gap in 0i64..10) {
        let periods = cluster_periods(&dates, gap);
        for date in &dates {
            let n = periods.iter().filter(|p| p.start <= *date && *date <= p.end).count();
            prop_assert_eq!(n, 1);
        }
        prop_assert_eq!(periods.is_empty(), dates.is_empty());
    }

    #[test]
    fn periods_are_ordered_and_separated(dates in arb_dates(), gap in 0i64..10) {
        let periods = cluster_periods(&dates, gap);
        for p in &periods {
            prop_assert!(p.start <= p.end);
            prop_assert!(dates.contains(&p.start));
            prop_assert!(dates.contains(&p.end));
        }
        for pair in periods.windows(2) {
            prop_assert!((pair[1].start - pair[0].end).num_days() > gap);
        }
    }

    #[test]
    fn summary_counts_partition_periods(closes in prop::collection::vec(50.0..150.0_f64, 5..40), days in 1usize..10) {
        let series = close_series(&closes);
        let dates: Vec<NaiveDate> = (0..closes.len() as i64).step_by(3).map(day).collect();
        let periods = cluster_periods(&dates, 2);
        let evals = evaluate_periods(&series, &periods, &LookaheadRule::new(days, 0.05));
        let s = EvaluationSummary::from_evaluations(&evals);
        prop_assert_eq!(s.closed + s.open + s.not_found, s.periods);
        prop_assert!(s.hits <= s.closed);
        if let Some(rate) = s.hit_rate {
            prop_assert!((0.0..=1.0).contains(&rate));
        }
    }
}

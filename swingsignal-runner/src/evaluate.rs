//! Forward-lookahead evaluation of buy periods and single buy signals.
//!
//! For a reference date E with close C, the lookahead maximum M is the highest
//! close over bar indices `[idx(E), idx(E) + evaluation_days]`, clamped to the
//! end of the series. The outcome is a hit when `(M - C) / C >= min_change`.
//!
//! A reference date is *open* when `E + evaluation_days` (calendar days) lies
//! beyond the last date of the series, or when fewer than `evaluation_days`
//! bars follow E (weekends and holidays leave gaps in daily data). Open
//! outcomes are reported but never enter a hit rate.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use swingsignal_core::domain::{PriceLookupError, PriceSeries};
use tracing::{debug, warn};

use crate::periods::BuyPeriod;

/// Lookahead parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookaheadRule {
    pub evaluation_days: usize,
    pub min_change: f64,
}

impl LookaheadRule {
    pub fn new(evaluation_days: usize, min_change: f64) -> Self {
        Self {
            evaluation_days,
            min_change,
        }
    }

    /// Whether the window after `date` has fully elapsed: the calendar span
    /// ends by `last_date` and `bars_after` covers every lookahead bar.
    pub fn is_closed(&self, date: NaiveDate, last_date: NaiveDate, bars_after: usize) -> bool {
        bars_after >= self.evaluation_days
            && date + Duration::days(self.evaluation_days as i64) <= last_date
    }

    /// Evaluate one reference date.
    pub fn outcome(
        &self,
        series: &PriceSeries,
        date: NaiveDate,
    ) -> Result<Outcome, PriceLookupError> {
        let idx = series
            .index_of(date)
            .ok_or(PriceLookupError::DateNotFound { date })?;
        let bars = series.bars();
        let last_idx = (idx + self.evaluation_days).min(bars.len() - 1);

        let price_at_end = bars[idx].close;
        let max_price = bars[idx..=last_idx]
            .iter()
            .map(|b| b.close)
            .fold(f64::NEG_INFINITY, f64::max);
        let pct_change = (max_price - price_at_end) / price_at_end;

        Ok(Outcome {
            price_at_end,
            max_price,
            pct_change,
            hit: pct_change >= self.min_change,
            closed: self.is_closed(date, series.last_date(), bars.len() - 1 - idx),
        })
    }
}

/// Result of the lookahead rule for one reference date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub price_at_end: f64,
    pub max_price: f64,
    pub pct_change: f64,
    pub hit: bool,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Lookahead fully elapsed; counts toward the hit rate.
    Closed,
    /// Lookahead extends past the last date; reported only.
    Open,
    /// End date absent from the series.
    DateNotFound,
}

/// Evaluation of one buy period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEvaluation {
    pub period: BuyPeriod,
    pub status: PeriodStatus,
    pub price_at_end: Option<f64>,
    pub max_price: Option<f64>,
    pub pct_change: Option<f64>,
    pub hit: Option<bool>,
    pub comment: Option<String>,
}

impl PeriodEvaluation {
    fn not_found(period: BuyPeriod, err: &PriceLookupError) -> Self {
        Self {
            period,
            status: PeriodStatus::DateNotFound,
            price_at_end: None,
            max_price: None,
            pct_change: None,
            hit: None,
            comment: Some(err.to_string()),
        }
    }

    /// Closed and hit.
    pub fn is_closed_hit(&self) -> bool {
        self.status == PeriodStatus::Closed && self.hit == Some(true)
    }
}

/// Aggregate over all period evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub periods: usize,
    pub closed: usize,
    pub open: usize,
    pub not_found: usize,
    pub hits: usize,
    /// `hits / closed`, `None` without closed periods.
    pub hit_rate: Option<f64>,
}

impl EvaluationSummary {
    pub fn from_evaluations(evaluations: &[PeriodEvaluation]) -> Self {
        let count = |status| evaluations.iter().filter(|e| e.status == status).count();
        let closed = count(PeriodStatus::Closed);
        let hits = evaluations.iter().filter(|e| e.is_closed_hit()).count();
        Self {
            periods: evaluations.len(),
            closed,
            open: count(PeriodStatus::Open),
            not_found: count(PeriodStatus::DateNotFound),
            hits,
            hit_rate: ratio(hits, closed),
        }
    }
}

/// Evaluate every period. A missing end date is recorded on that period and
/// never aborts the batch.
pub fn evaluate_periods(
    series: &PriceSeries,
    periods: &[BuyPeriod],
    rule: &LookaheadRule,
) -> Vec<PeriodEvaluation> {
    periods
        .iter()
        .map(|&period| match rule.outcome(series, period.end) {
            Ok(outcome) => {
                let status = if outcome.closed {
                    PeriodStatus::Closed
                } else {
                    PeriodStatus::Open
                };
                debug!(
                    start = %period.start,
                    end = %period.end,
                    ?status,
                    pct_change = outcome.pct_change,
                    hit = outcome.hit,
                    "evaluated period"
                );
                PeriodEvaluation {
                    period,
                    status,
                    price_at_end: Some(outcome.price_at_end),
                    max_price: Some(outcome.max_price),
                    pct_change: Some(outcome.pct_change),
                    hit: Some(outcome.hit),
                    comment: None,
                }
            }
            Err(err) => {
                warn!(start = %period.start, end = %period.end, "{err}");
                PeriodEvaluation::not_found(period, &err)
            }
        })
        .collect()
}

/// Hit rate over individual buy-signal dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHitRate {
    /// Closed signals that were evaluated.
    pub evaluated: usize,
    pub hits: usize,
    /// Signals whose lookahead has not elapsed yet.
    pub pending: usize,
    pub not_found: usize,
    pub hit_rate: Option<f64>,
}

pub fn evaluate_signal_dates(
    series: &PriceSeries,
    dates: &[NaiveDate],
    rule: &LookaheadRule,
) -> SignalHitRate {
    let mut result = SignalHitRate {
        evaluated: 0,
        hits: 0,
        pending: 0,
        not_found: 0,
        hit_rate: None,
    };
    for &date in dates {
        match rule.outcome(series, date) {
            Ok(outcome) if outcome.closed => {
                result.evaluated += 1;
                result.hits += usize::from(outcome.hit);
            }
            Ok(_) => result.pending += 1,
            Err(_) => result.not_found += 1,
        }
    }
    result.hit_rate = ratio(result.hits, result.evaluated);
    result
}

fn ratio(hits: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| hits as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingsignal_core::domain::PriceBar;

    fn d(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    fn series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_close(d(i as i64), c))
            .collect();
        PriceSeries::from_bars("TEST", bars).unwrap()
    }

    fn period(start: i64, end: i64) -> BuyPeriod {
        BuyPeriod {
            start: d(start),
            end: d(end),
        }
    }

    #[test]
    fn nine_percent_rise_hits_eight_percent_threshold() {
        // E = day 2, close 100, peak 109 inside E..E+5, series runs past E+5
        let s = series(&[95.0, 98.0, 100.0, 103.0, 109.0, 104.0, 101.0, 100.0, 99.0, 98.0]);
        let rule = LookaheadRule::new(5, 0.08);
        let evals = evaluate_periods(&s, &[period(0, 2)], &rule);
        let e = &evals[0];
        assert_eq!(e.status, PeriodStatus::Closed);
        assert_eq!(e.price_at_end, Some(100.0));
        assert_eq!(e.max_price, Some(109.0));
        assert_eq!(e.hit, Some(true));
        assert!((e.pct_change.unwrap() - 0.09).abs() < 1e-12);
    }

    #[test]
    fn seven_percent_rise_misses() {
        let s = series(&[95.0, 98.0, 100.0, 103.0, 107.0, 104.0, 101.0, 100.0, 99.0, 98.0]);
        let rule = LookaheadRule::new(5, 0.08);
        let evals = evaluate_periods(&s, &[period(2, 2)], &rule);
        assert_eq!(evals[0].hit, Some(false));
        assert_eq!(evals[0].status, PeriodStatus::Closed);
    }

    #[test]
    fn lookahead_ignores_bars_past_the_window() {
        let s = series(&[100.0, 101.0, 102.0, 150.0]);
        let rule = LookaheadRule::new(2, 0.05);
        let outcome = rule.outcome(&s, d(0)).unwrap();
        assert_eq!(outcome.max_price, 102.0);
        assert!(!outcome.hit);
        assert!(outcome.closed);
    }

    #[test]
    fn drop_after_end_is_zero_change() {
        let s = series(&[100.0, 90.0, 80.0, 70.0]);
        let outcome = LookaheadRule::new(2, 0.0).outcome(&s, d(0)).unwrap();
        assert_eq!(outcome.pct_change, 0.0);
        assert!(outcome.hit);
    }

    #[test]
    fn open_period_is_excluded_from_hit_rate() {
        let s = series(&[100.0, 100.0, 100.0, 120.0, 100.0, 130.0]);
        let rule = LookaheadRule::new(2, 0.05);
        // first period ends day 1, window closes on day 3; second needs day 6
        let evals = evaluate_periods(&s, &[period(0, 1), period(4, 4)], &rule);
        assert_eq!(evals[0].status, PeriodStatus::Closed);
        assert_eq!(evals[0].hit, Some(true));
        assert_eq!(evals[1].status, PeriodStatus::Open);
        assert_eq!(evals[1].hit, Some(true));

        let summary = EvaluationSummary::from_evaluations(&evals);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.hit_rate, Some(1.0));
    }

    #[test]
    fn missing_end_date_is_recorded_not_fatal() {
        let bars = [0, 2, 3, 4, 5, 20]
            .iter()
            .map(|&n| PriceBar::from_close(d(n), 100.0))
            .collect();
        let s = PriceSeries::from_bars("GAPPY", bars).unwrap();
        let rule = LookaheadRule::new(3, 0.05);
        let evals = evaluate_periods(&s, &[period(0, 1), period(2, 2)], &rule);

        assert_eq!(evals.len(), 2);
        assert_eq!(evals[0].status, PeriodStatus::DateNotFound);
        assert!(evals[0].comment.as_deref().unwrap().contains("not found"));
        assert_eq!(evals[0].hit, None);
        assert_eq!(evals[1].status, PeriodStatus::Closed);

        let summary = EvaluationSummary::from_evaluations(&evals);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.hit_rate, Some(0.0));
    }

    #[test]
    fn no_closed_periods_has_no_hit_rate() {
        let summary = EvaluationSummary::from_evaluations(&[]);
        assert_eq!(summary.periods, 0);
        assert_eq!(summary.hit_rate, None);
    }

    #[test]
    fn signal_hit_rate_counts_pending_separately() {
        let s = series(&[100.0, 106.0, 100.0, 100.0, 100.0, 100.0]);
        let rule = LookaheadRule::new(2, 0.05);
        let rate = evaluate_signal_dates(&s, &[d(0), d(1), d(4), d(30)], &rule);
        assert_eq!(rate.evaluated, 2);
        assert_eq!(rate.hits, 1);
        assert_eq!(rate.pending, 1);
        assert_eq!(rate.not_found, 1);
        assert_eq!(rate.hit_rate, Some(0.5));
    }

    #[test]
    fn closed_boundary_is_inclusive() {
        let rule = LookaheadRule::new(5, 0.05);
        assert!(rule.is_closed(d(0), d(5), 5));
        assert!(!rule.is_closed(d(1), d(5), 5));
        assert!(!rule.is_closed(d(0), d(9), 4));
    }

    /// Mon 2024-01-01 .. Wed 2024-01-10, weekdays only.
    fn weekday_series() -> PriceSeries {
        let bars = [0, 1, 2, 3, 4, 7, 8, 9]
            .iter()
            .zip([100.0, 100.0, 100.0, 100.0, 100.0, 104.0, 103.0, 102.0])
            .map(|(&n, c)| PriceBar::from_close(d(n), c))
            .collect();
        PriceSeries::from_bars("WEEK", bars).unwrap()
    }

    #[test]
    fn weekend_gap_keeps_period_open_until_enough_bars() {
        let s = weekday_series();
        let rule = LookaheadRule::new(5, 0.08);

        // Fri 01-05: the calendar span ends 01-10 but only 3 bars follow
        let evals = evaluate_periods(&s, &[period(4, 4)], &rule);
        assert_eq!(evals[0].status, PeriodStatus::Open);
        let summary = EvaluationSummary::from_evaluations(&evals);
        assert_eq!(summary.closed, 0);
        assert_eq!(summary.hit_rate, None);

        // Mon 01-01: five bars follow and the span ends 01-06
        let evals = evaluate_periods(&s, &[period(0, 0)], &rule);
        assert_eq!(evals[0].status, PeriodStatus::Closed);
        assert_eq!(evals[0].hit, Some(false));
    }

    #[test]
    fn weekend_gap_signals_stay_pending() {
        let s = weekday_series();
        let rule = LookaheadRule::new(5, 0.03);
        let rate = evaluate_signal_dates(&s, &[d(0), d(4)], &rule);
        assert_eq!(rate.evaluated, 1);
        assert_eq!(rate.pending, 1);
        assert_eq!(rate.hits, 1);
        assert_eq!(rate.hit_rate, Some(1.0));
    }
}

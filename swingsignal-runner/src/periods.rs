//! Gap-tolerant clustering of buy-signal dates into buy periods.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximal run of buy dates whose consecutive gaps are at most `max_gap_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BuyPeriod {
    /// Calendar days covered, inclusive of both ends.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Cluster dates into periods. Input order and duplicates do not matter.
pub fn cluster_periods(dates: &[NaiveDate], max_gap_days: i64) -> Vec<BuyPeriod> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut periods = Vec::new();
    let mut current = BuyPeriod {
        start: first,
        end: first,
    };
    for date in iter {
        if (date - current.end).num_days() <= max_gap_days {
            current.end = date;
        } else {
            periods.push(current);
            current = BuyPeriod {
                start: date,
                end: date,
            };
        }
    }
    periods.push(current);
    periods
}

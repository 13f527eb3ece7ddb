//! Calendar-month aggregation of periodic returns.

use std::collections::BTreeMap;

use chrono::Datelike;

use super::series::ReturnSeries;

/// Compounded returns of one calendar year, January first.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReturnRow {
    pub year: i32,
    pub months: [Option<f64>; 12],
}

impl MonthlyReturnRow {
    /// Compounded return over the months that have data.
    pub fn total(&self) -> Option<f64> {
        let present: Vec<f64> = self.months.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().map(|r| 1.0 + r).product::<f64>() - 1.0)
    }
}

/// One row per year from the first to the last year of the series; months
/// without data are `None`. Values are fractions, not percentages.
pub fn monthly_returns(returns: &ReturnSeries) -> Vec<MonthlyReturnRow> {
    let mut growth: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in returns.points() {
        if !point.value.is_finite() {
            continue;
        }
        let key = (point.date.year(), point.date.month());
        *growth.entry(key).or_insert(1.0) *= 1.0 + point.value;
    }

    let (Some(first), Some(last)) = (growth.keys().next(), growth.keys().next_back()) else {
        return Vec::new();
    };

    (first.0..=last.0)
        .map(|year| {
            let mut months = [None; 12];
            for (month, slot) in (1..=12u32).zip(months.iter_mut()) {
                *slot = growth.get(&(year, month)).map(|g| g - 1.0);
            }
            MonthlyReturnRow { year, months }
        })
        .collect()
}

//! Time-indexed input series: periodic returns, equity values and trade records.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::TearsheetError;

/// What the value column of an input file represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataKind {
    #[default]
    Returns,
    Equity,
    Trades,
}

impl DataKind {
    pub const ALL: [DataKind; 3] = [DataKind::Returns, DataKind::Equity, DataKind::Trades];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Returns => "returns",
            DataKind::Equity => "equity",
            DataKind::Trades => "trades",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = TearsheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "returns" => Ok(DataKind::Returns),
            "equity" => Ok(DataKind::Equity),
            "trades" => Ok(DataKind::Trades),
            other => Err(TearsheetError::UnsupportedDataKind {
                kind: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A single closed trade and its profit or loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub pnl: f64,
}

/// Sort points by date and reject duplicate dates.
pub fn sort_and_check(points: &mut [SeriesPoint]) -> Result<(), TearsheetError> {
    points.sort_by_key(|p| p.date);
    if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(TearsheetError::DuplicateDate { date: w[0].date });
    }
    Ok(())
}

/// Periodic returns with a strictly increasing date index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    points: Vec<SeriesPoint>,
}

impl ReturnSeries {
    pub fn new(mut points: Vec<SeriesPoint>) -> Result<Self, TearsheetError> {
        sort_and_check(&mut points)?;
        Ok(Self { points })
    }

    /// Percentage change of an equity curve. The first point has no previous
    /// value and is dropped; a non-positive previous value yields `0.0`.
    pub fn from_equity(equity: &[SeriesPoint]) -> Self {
        let points = equity
            .windows(2)
            .map(|w| {
                let prev = w[0].value;
                let value = if prev > 0.0 {
                    (w[1].value - prev) / prev
                } else {
                    0.0
                };
                SeriesPoint::new(w[1].date, value)
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Values with NaN and infinities removed.
    pub fn finite_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Growth of one unit: cumulative product of `1 + r`.
    pub fn cumulative(&self) -> Vec<SeriesPoint> {
        let mut growth = 1.0_f64;
        self.points
            .iter()
            .map(|p| {
                if p.value.is_finite() {
                    growth *= 1.0 + p.value;
                }
                SeriesPoint::new(p.date, growth)
            })
            .collect()
    }

    /// Keep only the points dated within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> ReturnSeries {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Keep only the points whose date also appears in `other`.
    pub fn align_to(&self, other: &ReturnSeries) -> ReturnSeries {
        let dates: BTreeSet<NaiveDate> = other.points.iter().map(|p| p.date).collect();
        Self {
            points: self
                .points
                .iter()
                .filter(|p| dates.contains(&p.date))
                .copied()
                .collect(),
        }
    }
}

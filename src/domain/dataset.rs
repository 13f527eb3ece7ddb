//! A loaded input file: the parsed series plus a raw preview for display.

use chrono::NaiveDate;

use super::series::{DataKind, ReturnSeries, SeriesPoint, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum DataSeries {
    Returns(ReturnSeries),
    Equity(Vec<SeriesPoint>),
    Trades(Vec<TradeRecord>),
}

impl DataSeries {
    pub fn kind(&self) -> DataKind {
        match self {
            DataSeries::Returns(_) => DataKind::Returns,
            DataSeries::Equity(_) => DataKind::Equity,
            DataSeries::Trades(_) => DataKind::Trades,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DataSeries::Returns(series) => series.len(),
            DataSeries::Equity(points) => points.len(),
            DataSeries::Trades(trades) => trades.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First and last date of the series, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (first, last) = match self {
            DataSeries::Returns(series) => (series.first_date(), series.last_date()),
            DataSeries::Equity(points) => {
                (points.first().map(|p| p.date), points.last().map(|p| p.date))
            }
            DataSeries::Trades(trades) => {
                (trades.first().map(|t| t.date), trades.last().map(|t| t.date))
            }
        };
        first.zip(last)
    }
}

/// Header and leading rows of the raw file, as they appeared in the CSV.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub series: DataSeries,
    pub preview: Preview,
}

impl Dataset {
    pub fn kind(&self) -> DataKind {
        self.series.kind()
    }

    /// Header plus at most `n` leading raw rows.
    pub fn preview_rows(&self, n: usize) -> (&[String], &[Vec<String>]) {
        let rows = &self.preview.rows;
        (&self.preview.headers, &rows[..n.min(rows.len())])
    }
}

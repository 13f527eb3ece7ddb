//! CSV file data adapter.

use crate::domain::dataset::{DataSeries, Dataset, Preview};
use crate::domain::error::TearsheetError;
use crate::domain::series::{self, DataKind, ReturnSeries, SeriesPoint, TradeRecord};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_PREVIEW_ROWS: usize = 5;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const VALUE_COLUMNS: [&str; 5] = ["returns", "return", "equity", "value", "close"];
const PNL_COLUMNS: [&str; 4] = ["pnl", "profit", "p&l", "profit_loss"];

/// Reads a date-indexed CSV: the first column is the date, the value comes from
/// a named column or the second column.
pub struct CsvAdapter {
    preview_rows: usize,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_ROWS)
    }
}

impl CsvAdapter {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    pub fn parse(&self, content: &str, kind: DataKind) -> Result<Dataset, TearsheetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let column = match kind {
            DataKind::Returns | DataKind::Equity => value_column(&headers)?,
            DataKind::Trades => find_column(&headers, &PNL_COLUMNS).ok_or_else(|| {
                TearsheetError::MissingColumn {
                    column: "PnL".into(),
                }
            })?,
        };
        let column_name = headers[column].clone();

        let mut preview = Preview {
            headers,
            ..Preview::default()
        };
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(csv_error)?;
            let line = record.position().map_or(0, |p| p.line() as usize);

            if preview.rows.len() < self.preview_rows {
                preview.rows.push(record.iter().map(str::to_string).collect());
            }
            preview.total_rows += 1;

            let date_str = record.get(0).unwrap_or_default();
            let value_str = record.get(column).unwrap_or_default();
            if date_str.is_empty() && value_str.is_empty() {
                continue;
            }
            // Rows without a value are dropped rather than rejected.
            if value_str.is_empty() {
                continue;
            }

            let date = parse_date(date_str).ok_or_else(|| TearsheetError::InvalidDate {
                line,
                value: date_str.to_string(),
            })?;
            let value = parse_number(value_str).ok_or_else(|| TearsheetError::InvalidValue {
                line,
                column: column_name.clone(),
                value: value_str.to_string(),
            })?;
            points.push(SeriesPoint::new(date, value));
        }

        let series = match kind {
            DataKind::Returns => DataSeries::Returns(ReturnSeries::new(points)?),
            DataKind::Equity => {
                series::sort_and_check(&mut points)?;
                DataSeries::Equity(points)
            }
            DataKind::Trades => {
                let mut trades: Vec<TradeRecord> = points
                    .into_iter()
                    .map(|p| TradeRecord {
                        date: p.date,
                        pnl: p.value,
                    })
                    .collect();
                trades.sort_by_key(|t| t.date);
                DataSeries::Trades(trades)
            }
        };

        debug!(kind = %kind, rows = series.len(), column = %column_name, "parsed CSV");
        Ok(Dataset { series, preview })
    }

    /// Load a periodic returns file, as used for benchmarks.
    pub fn load_returns(&self, path: &Path) -> Result<ReturnSeries, TearsheetError> {
        match self.load(path, DataKind::Returns)?.series {
            DataSeries::Returns(series) => Ok(series),
            _ => Err(TearsheetError::UnsupportedDataKind {
                kind: DataKind::Returns.to_string(),
            }),
        }
    }
}

impl DataPort for CsvAdapter {
    fn load(&self, path: &Path, kind: DataKind) -> Result<Dataset, TearsheetError> {
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = content.len(), "read input file");
        self.parse(&content, kind)
    }
}

/// Parse a date in any of the accepted formats; datetimes keep only the date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Plain float, or a float with well-formed thousands grouping
/// (`1,234,567.89`). Any other comma, such as a decimal comma, is invalid.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s.contains(',') {
        return s.parse().ok();
    }
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let integer = unsigned.split('.').next().unwrap_or_default();
    let mut groups = integer.split(',');
    let first_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let rest_ok = groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
    if !(first_ok && rest_ok) || unsigned[integer.len()..].contains(',') {
        return None;
    }
    s.replace(',', "").parse().ok()
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn value_column(headers: &[String]) -> Result<usize, TearsheetError> {
    if let Some(idx) = find_column(headers, &VALUE_COLUMNS).filter(|idx| *idx > 0) {
        return Ok(idx);
    }
    if headers.len() >= 2 {
        Ok(1)
    } else {
        Err(TearsheetError::MissingColumn {
            column: "value".into(),
        })
    }
}

fn csv_error(e: csv::Error) -> TearsheetError {
    TearsheetError::CsvParse {
        reason: e.to_string(),
    }
}

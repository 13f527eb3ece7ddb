//! Analysis entry point: turns a loaded dataset into a returns series and
//! computes everything the report needs from it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::dataset::DataSeries;
use super::distribution::{self, HistogramBin};
use super::drawdown;
use super::error::TearsheetError;
use super::metrics::{self, Metrics};
use super::monthly::{self, MonthlyReturnRow};
use super::series::{self, DataKind, ReturnSeries, SeriesPoint, TradeRecord};
use super::settings::AnalysisSettings;

#[derive(Debug, Clone)]
pub struct Analyzer {
    kind: DataKind,
    returns: ReturnSeries,
    equity_curve: Option<Vec<SeriesPoint>>,
    trades: Option<Vec<TradeRecord>>,
    benchmark: Option<ReturnSeries>,
    settings: AnalysisSettings,
}

impl Analyzer {
    /// Build an analyzer from a parsed input series.
    ///
    /// Equity curves are converted to percentage changes. Trade records are
    /// summed per closing date and applied to `settings.initial_capital` to
    /// form an equity curve, which is then converted the same way. Fails with
    /// [`TearsheetError::EmptySeries`] when no finite return remains.
    pub fn load(data: DataSeries, settings: AnalysisSettings) -> Result<Self, TearsheetError> {
        let kind = data.kind();
        let (returns, equity_curve, trades) = match data {
            DataSeries::Returns(returns) => (returns, None, None),
            DataSeries::Equity(mut points) => {
                series::sort_and_check(&mut points)?;
                (ReturnSeries::from_equity(&points), Some(points), None)
            }
            DataSeries::Trades(mut trades) => {
                trades.sort_by_key(|t| t.date);
                let equity = equity_from_trades(&trades, settings.initial_capital);
                let returns = returns_from_equity(&equity, settings.initial_capital);
                (returns, Some(equity), Some(trades))
            }
        };

        if returns.finite_values().is_empty() {
            return Err(TearsheetError::EmptySeries);
        }
        debug!(kind = %kind, periods = returns.len(), "loaded returns");

        Ok(Self {
            kind,
            returns,
            equity_curve,
            trades,
            benchmark: None,
            settings,
        })
    }

    pub fn with_benchmark(mut self, benchmark: ReturnSeries) -> Self {
        self.benchmark = Some(benchmark);
        self
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    pub fn trades(&self) -> Option<&[TradeRecord]> {
        self.trades.as_deref()
    }

    pub fn has_benchmark(&self) -> bool {
        self.benchmark.is_some()
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// The loaded equity curve, or the growth of one unit when the input was
    /// plain returns.
    pub fn equity_curve(&self) -> Vec<SeriesPoint> {
        match &self.equity_curve {
            Some(curve) => curve.clone(),
            None => self.returns.cumulative(),
        }
    }

    /// Benchmark growth over the portfolio's date range, on the same scale as
    /// [`Analyzer::equity_curve`].
    pub fn benchmark_curve(&self) -> Option<Vec<SeriesPoint>> {
        let benchmark = self.benchmark_in_range()?;
        let base = self.curve_base();
        Some(
            benchmark
                .cumulative()
                .into_iter()
                .map(|p| SeriesPoint::new(p.date, p.value * base))
                .collect(),
        )
    }

    /// Average win over average absolute loss. Uses trade PnL when trade
    /// records were loaded, periodic returns otherwise.
    pub fn rr_ratio(&self) -> f64 {
        match &self.trades {
            Some(trades) => {
                let pnl: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|v| v.is_finite()).collect();
                metrics::rr_ratio(&pnl)
            }
            None => metrics::rr_ratio(&self.returns.finite_values()),
        }
    }

    pub fn compute_all(&self) -> Metrics {
        Metrics::compute(&self.returns, self.rr_ratio(), &self.settings)
    }

    /// Metrics of the benchmark over the portfolio's date range.
    pub fn benchmark_metrics(&self) -> Option<Metrics> {
        let benchmark = self.benchmark_in_range()?;
        let rr = metrics::rr_ratio(&benchmark.finite_values());
        Some(Metrics::compute(&benchmark, rr, &self.settings))
    }

    pub fn drawdowns(&self) -> Vec<SeriesPoint> {
        drawdown::drawdown_series(&self.returns)
    }

    pub fn monthly_returns(&self) -> Vec<MonthlyReturnRow> {
        monthly::monthly_returns(&self.returns)
    }

    pub fn histogram(&self) -> Vec<HistogramBin> {
        distribution::histogram(&self.returns.finite_values(), self.settings.histogram_bins)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.returns.first_date().zip(self.returns.last_date())
    }

    fn benchmark_in_range(&self) -> Option<ReturnSeries> {
        let benchmark = self.benchmark.as_ref()?;
        let (start, end) = self.date_range()?;
        let window = benchmark.between(start, end);
        if window.is_empty() { None } else { Some(window) }
    }

    fn curve_base(&self) -> f64 {
        match self.kind {
            DataKind::Returns => 1.0,
            DataKind::Equity => self
                .equity_curve
                .as_ref()
                .and_then(|c| c.first())
                .map(|p| p.value)
                .unwrap_or(1.0),
            DataKind::Trades => self.settings.initial_capital,
        }
    }
}

/// Capital plus cumulative PnL, one point per closing date.
fn equity_from_trades(trades: &[TradeRecord], initial_capital: f64) -> Vec<SeriesPoint> {
    let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.pnl.is_finite()) {
        *per_date.entry(trade.date).or_insert(0.0) += trade.pnl;
    }

    let mut equity = initial_capital;
    per_date
        .into_iter()
        .map(|(date, pnl)| {
            equity += pnl;
            SeriesPoint::new(date, equity)
        })
        .collect()
}

/// Like [`ReturnSeries::from_equity`] but the first point is measured against
/// `start` instead of being dropped.
fn returns_from_equity(equity: &[SeriesPoint], start: f64) -> ReturnSeries {
    let mut prev = start;
    let points = equity
        .iter()
        .map(|p| {
            let value = if prev > 0.0 { (p.value - prev) / prev } else { 0.0 };
            prev = p.value;
            SeriesPoint::new(p.date, value)
        })
        .collect();
    // Dates come from a BTreeMap, so they are already unique and sorted.
    ReturnSeries::new(points).unwrap_or_default()
}

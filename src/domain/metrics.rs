//! Performance metrics and statistics.
//!
//! All functions take plain slices of periodic returns (fractions, `0.01` is
//! one percent). Non-finite values are expected to be filtered out by the
//! caller; [`Metrics::compute`] does this via
//! [`ReturnSeries::finite_values`].

use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, Normal};

use super::drawdown;
use super::series::ReturnSeries;
use super::settings::AnalysisSettings;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub periods: usize,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub volatility: f64,
    pub var: f64,
    pub cvar: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub omega: f64,
    pub recovery_factor: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub best_period: f64,
    pub worst_period: f64,
    pub rr_ratio: f64,
}

impl Metrics {
    /// Compute every statistic of `returns`. `rr_ratio` is passed in because it
    /// may come from trade records rather than from the returns.
    pub fn compute(returns: &ReturnSeries, rr_ratio: f64, settings: &AnalysisSettings) -> Self {
        let values = returns.finite_values();
        if values.is_empty() {
            return Metrics {
                rr_ratio,
                ..Metrics::default()
            };
        }

        let periods = settings.periods_per_year as f64;
        let rf = settings.risk_free_rate;

        let cagr = match (returns.first_date(), returns.last_date()) {
            (Some(start), Some(end)) => cagr(&values, (end - start).num_days()),
            _ => 0.0,
        };
        let max_drawdown = drawdown::max_drawdown(&values);
        let var = value_at_risk(&values, settings.var_confidence);

        Metrics {
            start_date: returns.first_date(),
            end_date: returns.last_date(),
            periods: values.len(),
            total_return: total_return(&values),
            cagr,
            sharpe: sharpe(&values, rf, periods),
            sortino: sortino(&values, rf, periods),
            calmar: ratio_to_drawdown(cagr, max_drawdown),
            max_drawdown,
            max_drawdown_duration: drawdown::longest_drawdown(&values),
            volatility: volatility(&values, periods),
            var,
            cvar: conditional_value_at_risk(&values, var),
            win_rate: win_rate(&values),
            profit_factor: profit_factor(&values),
            omega: omega(&values, 0.0),
            recovery_factor: ratio_to_drawdown(values.iter().sum::<f64>() - rf, max_drawdown)
                .abs(),
            skewness: skewness(&values),
            kurtosis: kurtosis(&values),
            best_period: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst_period: values.iter().copied().fold(f64::INFINITY, f64::min),
            rr_ratio,
        }
    }

    /// Every metric in display order.
    pub fn rows(&self) -> Vec<MetricRow> {
        use MetricFormat::*;
        vec![
            MetricRow::new("Total Return", self.total_return, Percent),
            MetricRow::new("CAGR", self.cagr, Percent),
            MetricRow::new("Sharpe", self.sharpe, Ratio),
            MetricRow::new("Sortino", self.sortino, Ratio),
            MetricRow::new("Calmar", self.calmar, Ratio),
            MetricRow::new("Max Drawdown", self.max_drawdown, Percent),
            MetricRow::new(
                "Max Drawdown Duration",
                self.max_drawdown_duration as f64,
                Periods,
            ),
            MetricRow::new("Volatility", self.volatility, Percent),
            MetricRow::new("VaR", self.var, Percent),
            MetricRow::new("CVaR", self.cvar, Percent),
            MetricRow::new("Win Rate", self.win_rate, Percent),
            MetricRow::new("Profit Factor", self.profit_factor, Ratio),
            MetricRow::new("Omega Ratio", self.omega, Ratio),
            MetricRow::new("Recovery Factor", self.recovery_factor, Ratio),
            MetricRow::new("Skewness", self.skewness, Decimal),
            MetricRow::new("Kurtosis", self.kurtosis, Decimal),
            MetricRow::new("Best Period", self.best_period, Percent),
            MetricRow::new("Worst Period", self.worst_period, Percent),
            MetricRow::new("R/R Ratio Avg", self.rr_ratio, Ratio),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFormat {
    Percent,
    Ratio,
    Decimal,
    Periods,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: f64,
    pub format: MetricFormat,
}

impl MetricRow {
    pub fn new(label: &'static str, value: f64, format: MetricFormat) -> Self {
        Self {
            label,
            value,
            format,
        }
    }

    pub fn formatted(&self) -> String {
        match self.format {
            MetricFormat::Percent => fmt_percent(self.value),
            MetricFormat::Ratio => fmt_ratio(self.value),
            MetricFormat::Decimal => fmt_decimal(self.value),
            MetricFormat::Periods => format!("{:.0}", self.value),
        }
    }
}

fn fmt_non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("-".to_string())
    } else if value == f64::INFINITY {
        Some("∞".to_string())
    } else if value == f64::NEG_INFINITY {
        Some("-∞".to_string())
    } else {
        None
    }
}

pub fn fmt_percent(value: f64) -> String {
    fmt_non_finite(value).unwrap_or_else(|| format!("{:.2}%", value * 100.0))
}

pub fn fmt_ratio(value: f64) -> String {
    fmt_non_finite(value).unwrap_or_else(|| format!("{:.2}", value))
}

pub fn fmt_decimal(value: f64) -> String {
    fmt_non_finite(value).unwrap_or_else(|| format!("{:.4}", value))
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation (`ddof = 1`).
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    var.sqrt()
}

pub fn total_return(values: &[f64]) -> f64 {
    values.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
}

/// Compound annual growth over `days` calendar days.
pub fn cagr(values: &[f64], days: i64) -> f64 {
    let years = days as f64 / DAYS_PER_YEAR;
    if years <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + total_return(values);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Per-period equivalent of an annual rate.
fn deannualize(rate: f64, periods: f64) -> f64 {
    if rate == 0.0 {
        0.0
    } else {
        (1.0 + rate).powf(1.0 / periods) - 1.0
    }
}

pub fn sharpe(values: &[f64], risk_free_rate: f64, periods: f64) -> f64 {
    let rf = deannualize(risk_free_rate, periods);
    let excess: Vec<f64> = values.iter().map(|r| r - rf).collect();
    let std = std_dev(&excess);
    if std > 0.0 {
        mean(&excess) / std * periods.sqrt()
    } else {
        0.0
    }
}

pub fn sortino(values: &[f64], risk_free_rate: f64, periods: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let rf = deannualize(risk_free_rate, periods);
    let excess: Vec<f64> = values.iter().map(|r| r - rf).collect();
    let downside = (excess
        .iter()
        .filter(|r| **r < 0.0)
        .map(|r| r * r)
        .sum::<f64>()
        / excess.len() as f64)
        .sqrt();
    if downside > 0.0 {
        mean(&excess) / downside * periods.sqrt()
    } else {
        0.0
    }
}

pub fn volatility(values: &[f64], periods: f64) -> f64 {
    std_dev(values) * periods.sqrt()
}

/// `numerator / |max_drawdown|`, zero when there was no drawdown.
fn ratio_to_drawdown(numerator: f64, max_drawdown: f64) -> f64 {
    if max_drawdown < 0.0 {
        numerator / max_drawdown.abs()
    } else {
        0.0
    }
}

/// Parametric (normal) value at risk at the given confidence.
///
/// `confidence` outside `(0, 1)` yields NaN.
pub fn value_at_risk(values: &[f64], confidence: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return f64::NAN;
    }
    let z = match Normal::new(0.0, 1.0) {
        Ok(standard) => standard.inverse_cdf(1.0 - confidence),
        Err(_) => return f64::NAN,
    };
    mean(values) + z * std_dev(values)
}

/// Mean of the returns below `var`, or `var` itself when none are.
pub fn conditional_value_at_risk(values: &[f64], var: f64) -> f64 {
    let tail: Vec<f64> = values.iter().copied().filter(|v| *v < var).collect();
    if tail.is_empty() { var } else { mean(&tail) }
}

/// Share of non-zero periods that were positive.
pub fn win_rate(values: &[f64]) -> f64 {
    let active = values.iter().filter(|v| **v != 0.0).count();
    if active == 0 {
        return 0.0;
    }
    values.iter().filter(|v| **v > 0.0).count() as f64 / active as f64
}

pub fn profit_factor(values: &[f64]) -> f64 {
    let wins: f64 = values.iter().filter(|v| **v >= 0.0).sum();
    let losses: f64 = values.iter().filter(|v| **v < 0.0).map(|v| v.abs()).sum();
    if losses > 0.0 {
        wins / losses
    } else if wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

pub fn omega(values: &[f64], threshold: f64) -> f64 {
    let mut gains = 0.0_f64;
    let mut losses = 0.0_f64;
    for v in values {
        let diff = v - threshold;
        if diff > 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }
    if losses > 0.0 { gains / losses } else { 0.0 }
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0_f64, 0.0_f64, 0.0_f64);
    for x in values {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Adjusted Fisher-Pearson sample skewness.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 <= 0.0 {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Unbiased sample excess kurtosis.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 <= 0.0 {
        return 0.0;
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Average winning outcome divided by average absolute losing outcome.
///
/// Zeros count as neither. When there are no wins or no losses the ratio is
/// `0.0`.
pub fn rr_ratio(outcomes: &[f64]) -> f64 {
    let wins: Vec<f64> = outcomes.iter().copied().filter(|v| *v > 0.0).collect();
    let losses: Vec<f64> = outcomes
        .iter()
        .copied()
        .filter(|v| *v < 0.0)
        .map(f64::abs)
        .collect();
    if wins.is_empty() || losses.is_empty() {
        return 0.0;
    }
    mean(&wins) / mean(&losses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::SeriesPoint;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    fn daily_series(values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        ReturnSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| SeriesPoint::new(start + chrono::Duration::days(i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn rr_ratio_only_positive_is_zero() {
        assert_eq!(rr_ratio(&[0.01, 0.02, 0.03]), 0.0);
    }

    #[test]
    fn rr_ratio_only_negative_is_zero() {
        assert_eq!(rr_ratio(&[-0.01, -0.02]), 0.0);
    }

    #[test]
    fn rr_ratio_empty_is_zero() {
        assert_eq!(rr_ratio(&[]), 0.0);
    }

    #[test]
    fn rr_ratio_mixed_signs() {
        // mean(pos) = 0.02, mean(|neg|) = 0.01
        let ratio = rr_ratio(&[0.01, 0.03, -0.005, -0.015, 0.0]);
        assert_relative_eq!(ratio, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rr_ratio_on_pnl_values() {
        let ratio = rr_ratio(&[300.0, 100.0, -50.0, -150.0]);
        assert_relative_eq!(ratio, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn std_dev_is_sample() {
        assert_relative_eq!(std_dev(&[1.0, 2.0, 3.0, 4.0]), 1.2909944487358056, epsilon = 1e-12);
        assert_eq!(std_dev(&[1.0]), 0.0);
    }

    #[test]
    fn cagr_one_year_matches_total() {
        let values = [0.10, 0.0];
        assert_relative_eq!(cagr(&values, 365), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn cagr_two_years() {
        assert_relative_eq!(cagr(&[0.21], 730), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn cagr_zero_span_is_zero() {
        assert_eq!(cagr(&[0.5], 0), 0.0);
    }

    #[test]
    fn cagr_total_loss() {
        assert_eq!(cagr(&[-1.0], 365), -1.0);
    }

    #[test]
    fn sharpe_known_value() {
        let values = [0.01, -0.01, 0.02, 0.0];
        let expected = mean(&values) / std_dev(&values) * 252f64.sqrt();
        assert_relative_eq!(sharpe(&values, 0.0, 252.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_constant_returns_is_zero() {
        assert_eq!(sharpe(&[0.01, 0.01, 0.01], 0.0, 252.0), 0.0);
    }

    #[test]
    fn sharpe_lower_with_risk_free_rate() {
        let values = [0.01, -0.005, 0.007, 0.002, -0.001];
        assert!(sharpe(&values, 0.05, 252.0) < sharpe(&values, 0.0, 252.0));
    }

    #[test]
    fn sortino_uses_downside_only() {
        let values = [0.02, -0.01, 0.03, -0.02];
        let downside = ((0.01f64.powi(2) + 0.02f64.powi(2)) / 4.0).sqrt();
        let expected = mean(&values) / downside * 252f64.sqrt();
        assert_relative_eq!(sortino(&values, 0.0, 252.0), expected, epsilon = 1e-12);
        assert_eq!(sortino(&[0.01, 0.02], 0.0, 252.0), 0.0);
    }

    #[test]
    fn volatility_annualizes() {
        let values = [0.01, -0.01, 0.02, 0.0];
        assert_relative_eq!(
            volatility(&values, 252.0),
            std_dev(&values) * 252f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn var_uses_normal_quantile() {
        let values = [0.02, -0.03, 0.01, -0.01, 0.005, -0.04, 0.03, 0.0];
        let (m, sd) = (mean(&values), std_dev(&values));
        assert_abs_diff_eq!(
            value_at_risk(&values, 0.95),
            m - 1.6448536269514722 * sd,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            value_at_risk(&values, 0.99),
            m - 2.3263478740408408 * sd,
            epsilon = 1e-9
        );
        assert!(value_at_risk(&values, 1.0).is_nan());
    }

    #[test]
    fn var_is_below_mean_and_cvar_below_var() {
        let values = [0.02, -0.03, 0.01, -0.01, 0.005, -0.04, 0.03, 0.0];
        let var = value_at_risk(&values, 0.95);
        assert!(var < mean(&values));
        let cvar = conditional_value_at_risk(&values, var);
        assert!(cvar <= var);
    }

    #[test]
    fn cvar_falls_back_to_var() {
        assert_eq!(conditional_value_at_risk(&[0.01, 0.02], -0.5), -0.5);
    }

    #[test]
    fn win_rate_ignores_zero_periods() {
        assert_relative_eq!(win_rate(&[0.01, 0.0, -0.01, 0.02]), 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(win_rate(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn profit_factor_cases() {
        assert_relative_eq!(profit_factor(&[0.03, -0.01, 0.03]), 6.0, epsilon = 1e-12);
        assert_eq!(profit_factor(&[0.01, 0.02]), f64::INFINITY);
        assert_eq!(profit_factor(&[0.0]), 0.0);
    }

    #[test]
    fn omega_ratio_of_gains_to_losses() {
        assert_relative_eq!(omega(&[0.03, -0.01, 0.01, -0.02], 0.0), 4.0 / 3.0, epsilon = 1e-12);
        assert_eq!(omega(&[0.01, 0.02], 0.0), 0.0);
    }

    #[test]
    fn skewness_symmetric_is_zero() {
        assert_abs_diff_eq!(skewness(&[1.0, 2.0, 3.0]), 0.0, epsilon = 1e-12);
        assert!(skewness(&[1.0, 2.0, 10.0]) > 0.0);
        assert_eq!(skewness(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn kurtosis_matches_unbiased_excess() {
        assert_relative_eq!(kurtosis(&[1.0, 2.0, 3.0, 4.0]), -1.2, epsilon = 1e-12);
        assert_eq!(kurtosis(&[1.0, 1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn metrics_empty_series() {
        let metrics = Metrics::compute(&ReturnSeries::default(), 1.5, &AnalysisSettings::default());
        assert_eq!(metrics.periods, 0);
        assert_eq!(metrics.cagr, 0.0);
        assert_eq!(metrics.rr_ratio, 1.5);
    }

    #[test]
    fn metrics_compute_populates_fields() {
        let series = daily_series(&[0.01, -0.02, 0.015, 0.005, -0.01, 0.02]);
        let metrics = Metrics::compute(&series, 1.0, &AnalysisSettings::default());

        assert_eq!(metrics.periods, 6);
        assert_eq!(metrics.start_date, series.first_date());
        assert!(metrics.max_drawdown < 0.0);
        assert_abs_diff_eq!(metrics.max_drawdown, -0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.best_period, 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.worst_period, -0.02, epsilon = 1e-12);
        assert_relative_eq!(metrics.calmar, metrics.cagr / 0.02, epsilon = 1e-9);
        assert_relative_eq!(
            metrics.recovery_factor,
            (0.01 - 0.02 + 0.015 + 0.005 - 0.01 + 0.02) / 0.02,
            epsilon = 1e-9
        );
        // Below the 1.01 peak from the second period until the last.
        assert_eq!(metrics.max_drawdown_duration, 4);
    }

    #[test]
    fn metrics_without_drawdown() {
        let series = daily_series(&[0.01, 0.02]);
        let metrics = Metrics::compute(&series, 0.0, &AnalysisSettings::default());
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.calmar, 0.0);
        assert_eq!(metrics.recovery_factor, 0.0);
        assert_eq!(metrics.profit_factor, f64::INFINITY);
    }

    #[test]
    fn rows_cover_every_metric() {
        let rows = Metrics::default().rows();
        let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
        for expected in [
            "CAGR",
            "Sharpe",
            "Sortino",
            "Calmar",
            "Max Drawdown",
            "Volatility",
            "VaR",
            "CVaR",
            "Win Rate",
            "Profit Factor",
            "Omega Ratio",
            "Recovery Factor",
            "Skewness",
            "Kurtosis",
            "R/R Ratio Avg",
        ] {
            assert!(labels.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn row_formatting() {
        assert_eq!(MetricRow::new("CAGR", 0.1234, MetricFormat::Percent).formatted(), "12.34%");
        assert_eq!(MetricRow::new("Sharpe", 1.5, MetricFormat::Ratio).formatted(), "1.50");
        assert_eq!(MetricRow::new("Skewness", -0.25, MetricFormat::Decimal).formatted(), "-0.2500");
        assert_eq!(MetricRow::new("Duration", 12.0, MetricFormat::Periods).formatted(), "12");
        assert_eq!(fmt_ratio(f64::INFINITY), "∞");
        assert_eq!(fmt_percent(f64::NAN), "-");
    }

    proptest! {
        #[test]
        fn rr_ratio_is_non_negative(values in proptest::collection::vec(-1.0f64..1.0, 0..100)) {
            let ratio = rr_ratio(&values);
            prop_assert!(ratio >= 0.0);
            prop_assert!(ratio.is_finite());
        }

        #[test]
        fn win_rate_in_unit_interval(values in proptest::collection::vec(-1.0f64..1.0, 0..100)) {
            let rate = win_rate(&values);
            prop_assert!((0.0..=1.0).contains(&rate));
        }
    }
}

//! Display-ready view of an analysis, shared by the static report and the
//! dashboard templates.

use chrono::Local;

use crate::adapters::chart_svg;
use crate::domain::analyzer::Analyzer;
use crate::domain::metrics::{MetricRow, Metrics};
use crate::domain::monthly::MonthlyReturnRow;

pub const RR_LABEL: &str = "R/R Ratio Avg";

/// Headline cards of the static report.
pub const REPORT_CARDS: [&str; 6] = [
    "CAGR",
    "Sharpe",
    "Max Drawdown",
    RR_LABEL,
    "Win Rate",
    "Profit Factor",
];

/// Headline cards of the dashboard.
pub const DASHBOARD_CARDS: [&str; 8] = [
    "CAGR",
    "Sharpe",
    "Max Drawdown",
    "Sortino",
    "Win Rate",
    "Profit Factor",
    RR_LABEL,
    "Volatility",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    pub highlight: bool,
    pub tone: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTableRow {
    pub label: &'static str,
    pub value: String,
    pub benchmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCell {
    pub text: String,
    pub tone: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRowView {
    pub year: i32,
    pub cells: Vec<MonthlyCell>,
    pub total: MonthlyCell,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSet {
    pub equity: String,
    pub drawdown: String,
    pub monthly: String,
    pub distribution: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub title: String,
    pub generated_at: String,
    pub kind: &'static str,
    pub period: String,
    pub periods: usize,
    pub cards: Vec<MetricCard>,
    pub table: Vec<MetricTableRow>,
    pub has_benchmark: bool,
    pub charts: ChartSet,
    pub monthly: Vec<MonthlyRowView>,
}

impl ReportView {
    /// Compute metrics and charts for `analyzer`; `cards` picks the headline
    /// metrics by label.
    pub fn build(analyzer: &Analyzer, title: &str, cards: &[&str]) -> Self {
        let metrics = analyzer.compute_all();
        let rows = metrics.rows();
        let bench_rows = analyzer.benchmark_metrics().map(|m| m.rows());

        let table = rows
            .iter()
            .enumerate()
            .map(|(i, row)| MetricTableRow {
                label: row.label,
                value: row.formatted(),
                benchmark: bench_rows
                    .as_ref()
                    .and_then(|b| b.get(i))
                    .map(MetricRow::formatted),
            })
            .collect();

        let cards = cards
            .iter()
            .filter_map(|label| rows.iter().find(|r| r.label == *label))
            .map(card)
            .collect();

        let monthly_rows = analyzer.monthly_returns();
        let benchmark_curve = analyzer.benchmark_curve();
        let charts = ChartSet {
            equity: chart_svg::equity_svg(&analyzer.equity_curve(), benchmark_curve.as_deref()),
            drawdown: chart_svg::drawdown_svg(&analyzer.drawdowns()),
            monthly: chart_svg::monthly_heatmap_svg(&monthly_rows),
            distribution: chart_svg::distribution_svg(&analyzer.histogram()),
        };

        Self {
            title: title.to_string(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: analyzer.kind().as_str(),
            period: period(&metrics),
            periods: metrics.periods,
            cards,
            table,
            has_benchmark: bench_rows.is_some(),
            charts,
            monthly: monthly_rows.iter().map(monthly_row).collect(),
        }
    }
}

fn card(row: &MetricRow) -> MetricCard {
    let highlight = row.label == RR_LABEL;
    MetricCard {
        label: if highlight { "R/R Ratio" } else { row.label },
        value: row.formatted(),
        highlight,
        tone: match row.label {
            "Max Drawdown" | "Volatility" => "",
            _ => tone(row.value),
        },
    }
}

fn tone(value: f64) -> &'static str {
    if value > 0.0 {
        "positive"
    } else if value < 0.0 {
        "negative"
    } else {
        ""
    }
}

fn period(metrics: &Metrics) -> String {
    match (metrics.start_date, metrics.end_date) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => String::new(),
    }
}

fn monthly_cell(value: Option<f64>) -> MonthlyCell {
    match value {
        Some(v) => MonthlyCell {
            text: format!("{:.2}", v * 100.0),
            tone: tone(v),
        },
        None => MonthlyCell {
            text: String::new(),
            tone: "",
        },
    }
}

fn monthly_row(row: &MonthlyReturnRow) -> MonthlyRowView {
    MonthlyRowView {
        year: row.year,
        cells: row.months.iter().copied().map(monthly_cell).collect(),
        total: monthly_cell(row.total()),
    }
}

//! End-to-end tests of the analysis pipeline: CSV parsing, metrics, charts
//! and the rendered HTML report.

mod common;

use approx::assert_relative_eq;
use common::*;
use tearsheet::adapters::csv_adapter::CsvAdapter;
use tearsheet::adapters::html_report_adapter::HtmlReportAdapter;
use tearsheet::domain::analyzer::Analyzer;
use tearsheet::domain::dataset::DataSeries;
use tearsheet::domain::error::TearsheetError;
use tearsheet::domain::series::DataKind;
use tearsheet::domain::settings::AnalysisSettings;
use tearsheet::ports::data_port::DataPort;
use tearsheet::ports::report_port::ReportPort;

fn analyze(content: &str, kind: DataKind) -> Result<Analyzer, TearsheetError> {
    let dataset = CsvAdapter::default().parse(content, kind)?;
    Analyzer::load(dataset.series, AnalysisSettings::default())
}

mod returns_pipeline {
    use super::*;

    #[test]
    fn metrics_from_returns_file() {
        let analyzer = analyze(&returns_csv("2023-01-02", &sample_returns(300)), DataKind::Returns)
            .unwrap();
        let metrics = analyzer.compute_all();

        assert_eq!(metrics.periods, 300);
        assert!(metrics.max_drawdown <= 0.0);
        assert!(metrics.volatility > 0.0);
        assert!(metrics.cvar <= metrics.var);
        assert!((0.0..=1.0).contains(&metrics.win_rate));
        assert!(metrics.rr_ratio > 0.0);
    }

    #[test]
    fn all_positive_returns_have_zero_rr() {
        let analyzer =
            analyze(&returns_csv("2024-01-01", &[0.01, 0.02, 0.005]), DataKind::Returns).unwrap();
        assert_eq!(analyzer.compute_all().rr_ratio, 0.0);
        assert_eq!(analyzer.compute_all().max_drawdown, 0.0);
    }

    #[test]
    fn rr_ratio_from_mixed_returns() {
        let analyzer = analyze(
            &returns_csv("2024-01-01", &[0.02, -0.01, 0.04, -0.03]),
            DataKind::Returns,
        )
        .unwrap();
        // mean win 0.03, mean loss 0.02
        assert_relative_eq!(analyzer.rr_ratio(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn header_only_file_is_empty_series() {
        let err = analyze("date,returns\n", DataKind::Returns).unwrap_err();
        assert!(matches!(err, TearsheetError::EmptySeries));
    }
}

mod equity_pipeline {
    use super::*;

    #[test]
    fn equity_is_converted_to_returns() {
        let analyzer = analyze(
            &equity_csv("2024-01-01", &[100.0, 110.0, 99.0, 108.9]),
            DataKind::Equity,
        )
        .unwrap();
        assert_eq!(analyzer.returns().len(), 3);
        assert_eq!(analyzer.returns().first_date(), Some(date("2024-01-02")));

        let metrics = analyzer.compute_all();
        assert_relative_eq!(metrics.total_return, 0.089, epsilon = 1e-9);
        assert_relative_eq!(metrics.max_drawdown, -0.1, epsilon = 1e-9);
        assert_relative_eq!(analyzer.rr_ratio(), 1.0, epsilon = 1e-9);
    }
}

mod trades_pipeline {
    use super::*;

    #[test]
    fn rr_ratio_uses_trade_pnl() {
        let content = trades_csv(&[
            ("2024-01-05", 300.0),
            ("2024-01-05", -100.0),
            ("2024-01-12", 100.0),
            ("2024-01-19", -100.0),
        ]);
        let analyzer = analyze(&content, DataKind::Trades).unwrap();
        assert_relative_eq!(analyzer.rr_ratio(), 2.0, epsilon = 1e-12);
        // Same-day trades collapse into one period.
        assert_eq!(analyzer.returns().len(), 3);
    }

    #[test]
    fn trades_without_pnl_column_fail() {
        let err = analyze("date,symbol,qty\n2024-01-05,BHP,3\n", DataKind::Trades).unwrap_err();
        assert!(matches!(err, TearsheetError::MissingColumn { .. }));
        assert!(err.to_string().contains("PnL"));
    }
}

mod benchmark {
    use super::*;

    #[test]
    fn benchmark_metrics_follow_portfolio_range() {
        let analyzer = analyze(&returns_csv("2024-01-10", &sample_returns(20)), DataKind::Returns)
            .unwrap();
        let bench = CsvAdapter::default()
            .parse(&returns_csv("2024-01-01", &sample_returns(60)), DataKind::Returns)
            .unwrap();
        let DataSeries::Returns(bench) = bench.series else {
            panic!("expected returns");
        };

        let analyzer = analyzer.with_benchmark(bench);
        let metrics = analyzer.benchmark_metrics().unwrap();
        assert_eq!(metrics.periods, 20);
        assert_eq!(analyzer.benchmark_curve().unwrap().len(), 20);
    }
}

mod report_generation {
    use super::*;

    #[test]
    fn report_file_contains_charts_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "returns.csv", &returns_csv("2023-06-01", &sample_returns(120)));

        let dataset = CsvAdapter::default().load(&input, DataKind::Returns).unwrap();
        let analyzer = Analyzer::load(dataset.series, AnalysisSettings::default()).unwrap();
        let output = dir.path().join("out/report.html");
        HtmlReportAdapter::new("Integration").write(&analyzer, &output).unwrap();

        let html = std::fs::read_to_string(&output).unwrap();
        assert_eq!(html.matches("<svg").count(), 4);
        for row in analyzer.compute_all().rows() {
            assert!(contains_label(&html, row.label), "missing {}", row.label);
        }
        assert!(html.contains("Integration"));
        assert!(html.contains("2023"));
    }

    #[test]
    fn report_with_benchmark_has_extra_column() {
        let analyzer = analyze(&returns_csv("2024-01-01", &sample_returns(40)), DataKind::Returns)
            .unwrap()
            .with_benchmark(
                match CsvAdapter::default()
                    .parse(&returns_csv("2024-01-01", &[0.001; 40]), DataKind::Returns)
                    .unwrap()
                    .series
                {
                    DataSeries::Returns(r) => r,
                    _ => unreachable!(),
                },
            );
        let html = HtmlReportAdapter::default().render(&analyzer).unwrap();
        assert!(html.contains("<th>Benchmark</th>"));
        assert!(html.contains("stroke-dasharray"));
    }
}

//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::{DEFAULT_TITLE, HtmlReportAdapter};
use crate::domain::analyzer::Analyzer;
use crate::domain::dataset::Dataset;
use crate::domain::error::TearsheetError;
use crate::domain::metrics::Metrics;
use crate::domain::series::DataKind;
use crate::domain::settings::AnalysisSettings;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT: &str = "backtest_report.html";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "tearsheet",
    about = "Performance statistics and HTML reports for backtest results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute metrics and write an HTML report
    Analyze(AnalyzeArgs),
    /// Show row count, date range and the first rows of an input file
    Info {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, default_value = "returns")]
        kind: DataKind,
    },
    /// Start the web dashboard
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Address to bind, overrides `[web] listen`
        #[arg(long)]
        listen: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// CSV file with a date column and returns, equity or trade PnL
    #[arg(short, long)]
    pub input: PathBuf,
    #[arg(short, long, default_value = "returns")]
    pub kind: DataKind,
    /// CSV file of benchmark returns
    #[arg(short, long)]
    pub benchmark: Option<PathBuf>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub title: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze(args) => run_analyze(&args).map(|_| ()),
        Command::Info { input, kind } => run_info(&input, kind),
        Command::Serve { config, listen } => run_serve(config.as_deref(), listen.as_deref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Config from `path`, or an empty config when none was given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TearsheetError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// `--output`, then `[report] output`, then the default file name.
pub fn resolve_output(args: &AnalyzeArgs, config: &dyn ConfigPort) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.get_string_or("report", "output", DEFAULT_OUTPUT)))
}

/// `--title`, then `[report] title`, then the default title.
pub fn resolve_title(args: &AnalyzeArgs, config: &dyn ConfigPort) -> String {
    args.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.get_string_or("report", "title", DEFAULT_TITLE))
}

pub fn build_analyzer(
    args: &AnalyzeArgs,
    settings: AnalysisSettings,
) -> Result<Analyzer, TearsheetError> {
    let adapter = CsvAdapter::default();

    eprintln!("Loading {} from {}", args.kind, args.input.display());
    let dataset = adapter.load(&args.input, args.kind)?;
    let mut analyzer = Analyzer::load(dataset.series, settings)?;

    if let Some(path) = &args.benchmark {
        eprintln!("Loading benchmark from {}", path.display());
        analyzer = analyzer.with_benchmark(adapter.load_returns(path)?);
    }
    Ok(analyzer)
}

/// Load, analyse, print the summary and write the report. Returns the report
/// path.
pub fn run_analyze(args: &AnalyzeArgs) -> Result<PathBuf, TearsheetError> {
    let config = load_config(args.config.as_deref())?;
    let settings = AnalysisSettings::from_config(&config)?;
    let analyzer = build_analyzer(args, settings)?;

    let metrics = analyzer.compute_all();
    for line in summary_lines(&metrics) {
        eprintln!("{line}");
    }

    let output = resolve_output(args, &config);
    let report = HtmlReportAdapter::new(resolve_title(args, &config));
    report.write(&analyzer, &output)?;
    info!(path = %output.display(), periods = metrics.periods, "report written");
    println!("Report written to {}", output.display());
    Ok(output)
}

/// Console summary: period line followed by one aligned line per metric.
pub fn summary_lines(metrics: &Metrics) -> Vec<String> {
    let mut lines = Vec::new();
    if let (Some(start), Some(end)) = (metrics.start_date, metrics.end_date) {
        lines.push(format!(
            "Period: {start} to {end} ({} periods)",
            metrics.periods
        ));
    }
    lines.extend(
        metrics
            .rows()
            .iter()
            .map(|row| format!("  {:<24}{:>14}", row.label, row.formatted())),
    );
    lines
}

pub fn info_lines(dataset: &Dataset) -> Vec<String> {
    let mut lines = vec![
        format!("Kind: {}", dataset.kind()),
        format!("Rows: {}", dataset.series.len()),
    ];
    match dataset.series.date_range() {
        Some((start, end)) => lines.push(format!("Range: {start} to {end}")),
        None => lines.push("Range: (empty)".to_string()),
    }
    let (headers, rows) = dataset.preview_rows(PREVIEW_ROWS);
    lines.push(String::new());
    lines.push(headers.join(","));
    lines.extend(rows.iter().map(|row| row.join(",")));
    lines
}

fn run_info(input: &Path, kind: DataKind) -> Result<(), TearsheetError> {
    let dataset = CsvAdapter::default().load(input, kind)?;
    for line in info_lines(&dataset) {
        println!("{line}");
    }
    Ok(())
}

/// `--listen`, then `[web] listen`, then the default address.
pub fn resolve_listen(
    listen: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<SocketAddr, TearsheetError> {
    let addr = match listen {
        Some(addr) => addr.to_string(),
        None => config.get_string_or("web", "listen", DEFAULT_LISTEN),
    };
    addr.trim()
        .parse()
        .map_err(|_| TearsheetError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: format!("'{addr}' is not a socket address"),
        })
}

fn run_serve(config_path: Option<&Path>, listen: Option<&str>) -> Result<(), TearsheetError> {
    let config = load_config(config_path)?;
    let addr = resolve_listen(listen, &config)?;

    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};

        let state = AppState::from_config(&config)?;
        let router = build_router(state);

        eprintln!("Starting web server on http://{addr}");
        tokio::runtime::Runtime::new()?.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "listening");
            axum::serve(listener, router).await?;
            Ok(())
        })
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = addr;
        Err(TearsheetError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: "built without the web feature".into(),
        })
    }
}

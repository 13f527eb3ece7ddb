//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for tearsheet.
///
/// Every failure aborts the current action: the CLI prints the message and
/// exits with the code from [`std::process::ExitCode::from`], the dashboard
/// renders it as an error page.
#[derive(Debug, thiserror::Error)]
pub enum TearsheetError {
    #[error("CSV parse error: {reason}")]
    CsvParse { reason: String },

    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: invalid number '{value}' in column '{column}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("duplicate date {date} in series")]
    DuplicateDate { date: NaiveDate },

    #[error("series is empty, nothing to analyse")]
    EmptySeries,

    #[error("unsupported data type '{kind}' (expected returns, equity or trades)")]
    UnsupportedDataKind { kind: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report rendering failed: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TearsheetError {
    /// True for errors caused by the content of an input file.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TearsheetError::CsvParse { .. }
                | TearsheetError::InvalidDate { .. }
                | TearsheetError::InvalidValue { .. }
                | TearsheetError::MissingColumn { .. }
                | TearsheetError::DuplicateDate { .. }
                | TearsheetError::UnsupportedDataKind { .. }
        )
    }
}

impl From<&TearsheetError> for std::process::ExitCode {
    fn from(err: &TearsheetError) -> Self {
        let code: u8 = match err {
            TearsheetError::Io(_) | TearsheetError::Render { .. } => 1,
            TearsheetError::ConfigParse { .. } | TearsheetError::ConfigInvalid { .. } => 2,
            TearsheetError::CsvParse { .. }
            | TearsheetError::InvalidDate { .. }
            | TearsheetError::InvalidValue { .. }
            | TearsheetError::MissingColumn { .. }
            | TearsheetError::DuplicateDate { .. }
            | TearsheetError::UnsupportedDataKind { .. } => 3,
            TearsheetError::EmptySeries => 4,
        };
        std::process::ExitCode::from(code)
    }
}

//! Report generation port trait.

use std::fs;
use std::path::Path;

use crate::domain::analyzer::Analyzer;
use crate::domain::error::TearsheetError;

/// Port for turning an analysis into a report document.
pub trait ReportPort {
    fn render(&self, analyzer: &Analyzer) -> Result<String, TearsheetError>;

    /// Default implementation: renders, creates missing parent directories
    /// and writes the document to `output_path`.
    fn write(&self, analyzer: &Analyzer, output_path: &Path) -> Result<(), TearsheetError> {
        let document = self.render(analyzer)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, document)?;
        Ok(())
    }
}

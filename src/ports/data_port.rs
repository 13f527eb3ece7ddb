//! Data access port trait.

use std::path::Path;

use crate::domain::dataset::Dataset;
use crate::domain::error::TearsheetError;
use crate::domain::series::DataKind;

/// Port for loading an input series from storage.
pub trait DataPort {
    fn load(&self, path: &Path, kind: DataKind) -> Result<Dataset, TearsheetError>;
}

//! Configuration access port trait.

use std::str::FromStr;

use crate::domain::error::TearsheetError;

/// String lookups of `[section] key` values.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Non-empty trimmed string value, or `default`.
    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

/// Numeric `[section] key`: `default` when missing or blank, `ConfigInvalid`
/// when present but unparsable.
pub fn get_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TearsheetError> {
    let Some(raw) = config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(default);
    };
    raw.parse().map_err(|_| TearsheetError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("'{raw}' is not a number"),
    })
}

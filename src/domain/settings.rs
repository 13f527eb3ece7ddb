//! Analysis settings and their validation.
//!
//! Values come from the `[analysis]` section of the INI config. Missing keys
//! take the defaults below; malformed or out-of-range values are rejected.

use crate::domain::error::TearsheetError;
use crate::ports::config_port::{ConfigPort, get_number};

pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

const SECTION: &str = "analysis";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Annual risk-free rate used for Sharpe and Sortino.
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    pub var_confidence: f64,
    /// Starting capital for equity derived from trade PnL.
    pub initial_capital: f64,
    pub histogram_bins: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            var_confidence: DEFAULT_VAR_CONFIDENCE,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl AnalysisSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TearsheetError> {
        let risk_free_rate: f64 = get_number(config, SECTION, "risk_free_rate", 0.0)?;
        if !risk_free_rate.is_finite() || risk_free_rate <= -1.0 {
            return Err(invalid("risk_free_rate", "must be a finite rate above -1"));
        }

        let periods: i64 = get_number(
            config,
            SECTION,
            "periods_per_year",
            i64::from(DEFAULT_PERIODS_PER_YEAR),
        )?;
        let periods_per_year = u32::try_from(periods)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| invalid("periods_per_year", "must be a positive integer"))?;

        let var_confidence: f64 =
            get_number(config, SECTION, "var_confidence", DEFAULT_VAR_CONFIDENCE)?;
        if !(var_confidence > 0.0 && var_confidence < 1.0) {
            return Err(invalid("var_confidence", "must be strictly between 0 and 1"));
        }

        let initial_capital: f64 =
            get_number(config, SECTION, "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(invalid("initial_capital", "must be positive"));
        }

        let bins: i64 = get_number(
            config,
            SECTION,
            "histogram_bins",
            DEFAULT_HISTOGRAM_BINS as i64,
        )?;
        let histogram_bins = usize::try_from(bins)
            .ok()
            .filter(|b| *b >= 1)
            .ok_or_else(|| invalid("histogram_bins", "must be at least 1"))?;

        Ok(Self {
            risk_free_rate,
            periods_per_year,
            var_confidence,
            initial_capital,
            histogram_bins,
        })
    }
}

fn invalid(key: &str, reason: &str) -> TearsheetError {
    TearsheetError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn settings(ini: &str) -> Result<AnalysisSettings, TearsheetError> {
        AnalysisSettings::from_config(&FileConfigAdapter::from_string(ini).unwrap())
    }

    #[test]
    fn defaults_when_section_missing() {
        let s = settings("[report]\ntitle = x\n").unwrap();
        assert_eq!(s, AnalysisSettings::default());
    }

    #[test]
    fn reads_all_keys() {
        let s = settings(
            "[analysis]\nrisk_free_rate = 0.02\nperiods_per_year = 52\nvar_confidence = 0.99\ninitial_capital = 5000\nhistogram_bins = 20\n",
        )
        .unwrap();
        assert_eq!(s.risk_free_rate, 0.02);
        assert_eq!(s.periods_per_year, 52);
        assert_eq!(s.var_confidence, 0.99);
        assert_eq!(s.initial_capital, 5000.0);
        assert_eq!(s.histogram_bins, 20);
    }

    #[test]
    fn rejects_zero_periods() {
        let err = settings("[analysis]\nperiods_per_year = 0\n").unwrap_err();
        assert!(matches!(err, TearsheetError::ConfigInvalid { key, .. } if key == "periods_per_year"));
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let err = settings("[analysis]\nvar_confidence = 1.5\n").unwrap_err();
        assert!(matches!(err, TearsheetError::ConfigInvalid { key, .. } if key == "var_confidence"));
    }

    #[test]
    fn rejects_non_positive_capital() {
        let err = settings("[analysis]\ninitial_capital = -1\n").unwrap_err();
        assert!(matches!(err, TearsheetError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn rejects_zero_bins() {
        let err = settings("[analysis]\nhistogram_bins = 0\n").unwrap_err();
        assert!(matches!(err, TearsheetError::ConfigInvalid { key, .. } if key == "histogram_bins"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for (ini, key) in [
            ("[analysis]\nperiods_per_year = 12.5\n", "periods_per_year"),
            ("[analysis]\nrisk_free_rate = 5%\n", "risk_free_rate"),
            ("[analysis]\nvar_confidence = 0.99x\n", "var_confidence"),
            ("[analysis]\ninitial_capital = lots\n", "initial_capital"),
            ("[analysis]\nhistogram_bins = ten\n", "histogram_bins"),
        ] {
            let err = settings(ini).unwrap_err();
            assert!(
                matches!(&err, TearsheetError::ConfigInvalid { key: k, reason, .. } if k == key && reason.contains("not a number")),
                "{ini}: {err}"
            );
        }
    }

    #[test]
    fn blank_value_takes_default() {
        let s = settings("[analysis]\nperiods_per_year =\n").unwrap();
        assert_eq!(s.periods_per_year, DEFAULT_PERIODS_PER_YEAR);
    }

    #[test]
    fn negative_risk_free_rate_is_allowed() {
        let s = settings("[analysis]\nrisk_free_rate = -0.005\n").unwrap();
        assert_eq!(s.risk_free_rate, -0.005);
        assert!(settings("[analysis]\nrisk_free_rate = -1\n").is_err());
        assert!(settings("[analysis]\nrisk_free_rate = inf\n").is_err());
    }
}

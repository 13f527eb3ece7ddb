//! Drawdown of the compounded equity path.
//!
//! Equity starts at a base of 1.0 before the first return, so a loss in the
//! first period already counts as a drawdown.

use super::series::{ReturnSeries, SeriesPoint};

/// `equity / running_peak - 1` for each return, always `<= 0`.
pub fn drawdowns(values: &[f64]) -> Vec<f64> {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    values
        .iter()
        .map(|r| {
            if r.is_finite() {
                equity *= 1.0 + r;
            }
            if equity > peak {
                peak = equity;
            }
            if peak > 0.0 {
                (equity / peak - 1.0).min(0.0)
            } else {
                -1.0
            }
        })
        .collect()
}

/// Dated drawdown series for charting.
pub fn drawdown_series(returns: &ReturnSeries) -> Vec<SeriesPoint> {
    let dd = drawdowns(&returns.values());
    returns
        .points()
        .iter()
        .zip(dd)
        .map(|(p, value)| SeriesPoint::new(p.date, value))
        .collect()
}

/// Deepest drawdown as a non-positive fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdowns(values).into_iter().fold(0.0, f64::min)
}

/// Longest run of consecutive periods spent below a previous peak.
pub fn longest_drawdown(values: &[f64]) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    for dd in drawdowns(values) {
        if dd < 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Daily returns CSV starting at `start`, one row per value.
pub fn returns_csv(start: &str, values: &[f64]) -> String {
    let start = date(start);
    let mut csv = String::from("date,returns\n");
    for (i, v) in values.iter().enumerate() {
        csv.push_str(&format!("{},{}\n", start + Duration::days(i as i64), v));
    }
    csv
}

/// Equity CSV starting at `start`, one row per value.
pub fn equity_csv(start: &str, values: &[f64]) -> String {
    let start = date(start);
    let mut csv = String::from("date,equity\n");
    for (i, v) in values.iter().enumerate() {
        csv.push_str(&format!("{},{}\n", start + Duration::days(i as i64), v));
    }
    csv
}

/// Trade log CSV with `(exit date, pnl)` rows.
pub fn trades_csv(trades: &[(&str, f64)]) -> String {
    let mut csv = String::from("exit_date,symbol,pnl\n");
    for (d, pnl) in trades {
        csv.push_str(&format!("{d},BHP,{pnl}\n"));
    }
    csv
}

/// Deterministic mixed-sign daily returns spanning several months.
pub fn sample_returns(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = ((i * 37 + 11) % 23) as f64 - 10.0;
            x / 1000.0
        })
        .collect()
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// The template engine escapes '/' in text content.
pub fn contains_label(html: &str, label: &str) -> bool {
    html.contains(label) || html.contains(&label.replace('/', "&#x2f;"))
}

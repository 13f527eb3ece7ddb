//! Core domain types and analytics.

pub mod analyzer;
pub mod dataset;
pub mod distribution;
pub mod drawdown;
pub mod error;
pub mod metrics;
pub mod monthly;
pub mod series;
pub mod settings;

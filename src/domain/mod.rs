//! Core domain types and logic.

pub mod series;
pub mod universe;
pub mod window;
pub mod portfolio;
pub mod metrics;
pub mod aggregate;
pub mod backtest;
pub mod config_validation;
pub mod error;

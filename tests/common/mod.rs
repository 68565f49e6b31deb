#![allow(dead_code)]

use memeindex::domain::aggregate::AggregateReport;
use memeindex::domain::error::MemeindexError;
use memeindex::domain::series::{SeriesStore, TokenSeries};
use memeindex::ports::data_port::DataPort;
use memeindex::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// In-memory periods in insertion order.
pub struct MockDataPort {
    pub periods: Vec<(String, Vec<TokenSeries>)>,
    pub errors: Vec<(String, String)>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            periods: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_period(mut self, period: &str, series: Vec<TokenSeries>) -> Self {
        self.periods.push((period.to_string(), series));
        self
    }

    pub fn with_error(mut self, period: &str, reason: &str) -> Self {
        self.errors.push((period.to_string(), reason.to_string()));
        self
    }
}

impl DataPort for MockDataPort {
    fn list_periods(&self) -> Result<Vec<String>, MemeindexError> {
        Ok(self.periods.iter().map(|(p, _)| p.clone()).collect())
    }

    fn load_period(&self, period: &str) -> Result<SeriesStore, MemeindexError> {
        if let Some((_, reason)) = self.errors.iter().find(|(p, _)| p == period) {
            return Err(MemeindexError::Data {
                reason: reason.clone(),
            });
        }
        match self.periods.iter().find(|(p, _)| p == period) {
            Some((_, series)) => Ok(SeriesStore::from_series(series.clone())?),
            None => Err(MemeindexError::NoData {
                period: period.to_string(),
            }),
        }
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(AggregateReport, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, report: &AggregateReport, output_dir: &Path) -> Result<(), MemeindexError> {
        self.calls
            .borrow_mut()
            .push((report.clone(), output_dir.to_path_buf()));
        Ok(())
    }
}

/// Series with a price and volume on every day.
pub fn token(name: &str, closes: &[f64], volume: f64) -> TokenSeries {
    TokenSeries::from_rows(
        name,
        closes.iter().map(|&c| (Some(c), Some(volume))).collect(),
    )
}

/// Series with per-day volumes.
pub fn token_with_volumes(name: &str, closes: &[f64], volumes: &[f64]) -> TokenSeries {
    TokenSeries::from_rows(
        name,
        closes
            .iter()
            .zip(volumes)
            .map(|(&c, &v)| (Some(c), Some(v)))
            .collect(),
    )
}

/// Price path growing by `daily` each day from `start`.
pub fn compounding(start: f64, daily: f64, days: usize) -> Vec<f64> {
    (0..days)
        .map(|d| start * (1.0 + daily).powi(d as i32))
        .collect()
}

pub fn store(series: Vec<TokenSeries>) -> SeriesStore {
    SeriesStore::from_series(series).unwrap()
}

pub fn exit_code_eq(actual: ExitCode, expected: u8) -> bool {
    format!("{actual:?}") == format!("{:?}", ExitCode::from(expected))
}

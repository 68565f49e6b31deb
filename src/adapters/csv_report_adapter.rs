//! CSV report export.
//!
//! Writes three files into the output directory:
//! `period_metrics.csv` (one row per period and bias mode),
//! `combined_metrics.csv` (one row per bias mode) and
//! `combined_equity.csv` (cumulative return per sequential trading day).

use crate::domain::aggregate::{AggregateReport, CombinedCurve, RunOutcome};
use crate::domain::backtest::BiasMode;
use crate::domain::error::{MemeindexError, RunError};
use crate::domain::metrics::MetricsRecord;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const PERIOD_METRICS_FILE: &str = "period_metrics.csv";
pub const COMBINED_METRICS_FILE: &str = "combined_metrics.csv";
pub const COMBINED_EQUITY_FILE: &str = "combined_equity.csv";

const UNDEFINED: &str = "undefined";

#[derive(Debug, Serialize)]
struct PeriodRow<'a> {
    period: &'a str,
    bias: &'static str,
    status: &'static str,
    window: String,
    tokens: usize,
    observations: Option<usize>,
    total_return: Option<f64>,
    annualized_return: Option<f64>,
    volatility: Option<String>,
    sharpe_ratio: Option<String>,
    max_drawdown: Option<f64>,
    max_drawdown_duration: Option<usize>,
    error: String,
}

#[derive(Debug, Serialize)]
struct CombinedRow {
    bias: &'static str,
    periods: usize,
    observations: Option<usize>,
    total_return: Option<f64>,
    annualized_return: Option<f64>,
    volatility: Option<String>,
    sharpe_ratio: Option<String>,
    max_drawdown: Option<f64>,
    max_drawdown_duration: Option<usize>,
}

/// Metric cells; all blank when there is no record.
#[derive(Debug, Default)]
struct MetricCells {
    observations: Option<usize>,
    total_return: Option<f64>,
    annualized_return: Option<f64>,
    volatility: Option<String>,
    sharpe_ratio: Option<String>,
    max_drawdown: Option<f64>,
    max_drawdown_duration: Option<usize>,
}

impl From<Option<&MetricsRecord>> for MetricCells {
    fn from(metrics: Option<&MetricsRecord>) -> Self {
        let Some(m) = metrics else {
            return Self::default();
        };
        let or_undefined =
            |v: Option<f64>| Some(v.map_or_else(|| UNDEFINED.to_string(), |x| x.to_string()));
        Self {
            observations: Some(m.observations),
            total_return: Some(m.total_return),
            annualized_return: Some(m.annualized_return),
            volatility: or_undefined(m.volatility),
            sharpe_ratio: or_undefined(m.sharpe_ratio),
            max_drawdown: Some(m.max_drawdown),
            max_drawdown_duration: Some(m.max_drawdown_duration),
        }
    }
}

#[derive(Debug, Serialize)]
struct EquityRow {
    day: usize,
    privileged: Option<f64>,
    honest: Option<f64>,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_period_metrics(report: &AggregateReport, path: &Path) -> Result<(), MemeindexError> {
        let mut wtr = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
        for period in &report.periods {
            for bias in BiasMode::ALL {
                let (status, window, tokens, metrics, error) = match period.outcome(bias) {
                    RunOutcome::Completed(run) => (
                        "completed",
                        run.window.to_string(),
                        run.tokens.len(),
                        MetricCells::from(Some(&run.metrics)),
                        String::new(),
                    ),
                    RunOutcome::Skipped(err) => (
                        "skipped",
                        String::new(),
                        skipped_tokens(err),
                        MetricCells::default(),
                        err.to_string(),
                    ),
                };
                let row = PeriodRow {
                    period: &period.period,
                    bias: bias.label(),
                    status,
                    window,
                    tokens,
                    observations: metrics.observations,
                    total_return: metrics.total_return,
                    annualized_return: metrics.annualized_return,
                    volatility: metrics.volatility,
                    sharpe_ratio: metrics.sharpe_ratio,
                    max_drawdown: metrics.max_drawdown,
                    max_drawdown_duration: metrics.max_drawdown_duration,
                    error,
                };
                wtr.serialize(row).map_err(std::io::Error::from)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_combined_metrics(report: &AggregateReport, path: &Path) -> Result<(), MemeindexError> {
        let mut wtr = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
        for bias in BiasMode::ALL {
            let curve = report.combined(bias);
            let metrics = MetricCells::from(curve.metrics.as_ref());
            wtr.serialize(CombinedRow {
                bias: bias.label(),
                periods: curve.periods.len(),
                observations: metrics.observations,
                total_return: metrics.total_return,
                annualized_return: metrics.annualized_return,
                volatility: metrics.volatility,
                sharpe_ratio: metrics.sharpe_ratio,
                max_drawdown: metrics.max_drawdown,
                max_drawdown_duration: metrics.max_drawdown_duration,
            })
            .map_err(std::io::Error::from)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_combined_equity(report: &AggregateReport, path: &Path) -> Result<(), MemeindexError> {
        let privileged = report.privileged.series.cumulative_returns();
        let honest = report.honest.series.cumulative_returns();
        let mut wtr = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
        for day in 0..privileged.len().max(honest.len()) {
            wtr.serialize(EquityRow {
                day,
                privileged: privileged.get(day).copied(),
                honest: honest.get(day).copied(),
            })
            .map_err(std::io::Error::from)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &AggregateReport, output_dir: &Path) -> Result<(), MemeindexError> {
        fs::create_dir_all(output_dir)?;
        Self::write_period_metrics(report, &output_dir.join(PERIOD_METRICS_FILE))?;
        Self::write_combined_metrics(report, &output_dir.join(COMBINED_METRICS_FILE))?;
        Self::write_combined_equity(report, &output_dir.join(COMBINED_EQUITY_FILE))?;
        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}

/// One-line summary of a combined curve for console output.
pub fn summarize(curve: &CombinedCurve) -> String {
    match &curve.metrics {
        Some(m) => format!(
            "{:<10} {:>3} periods  total {:>9.2}%  sharpe {:>6}  max dd {:>7.2}%",
            curve.bias.label(),
            curve.periods.len(),
            m.total_return * 100.0,
            m.sharpe_ratio
                .map_or_else(|| UNDEFINED.to_string(), |s| format!("{:.2}", s)),
            m.max_drawdown * 100.0,
        ),
        None => format!("{:<10} no completed periods", curve.bias.label()),
    }
}

/// Tokens that passed the window filter before the run was skipped.
fn skipped_tokens(err: &RunError) -> usize {
    match err {
        RunError::NoQualifyingTokens { qualifying, .. } => *qualifying,
        _ => 0,
    }
}

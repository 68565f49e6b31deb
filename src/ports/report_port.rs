//! Report generation port trait.

use crate::domain::aggregate::AggregateReport;
use crate::domain::error::MemeindexError;
use std::path::Path;

/// Port for exporting an aggregate backtest report.
pub trait ReportPort {
    fn write(&self, report: &AggregateReport, output_dir: &Path) -> Result<(), MemeindexError>;
}

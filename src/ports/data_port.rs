//! Data access port trait.
//!
//! A data port hands the core fully materialised, day-indexed series. Any
//! fetch or parse failure for a single token is the port's to isolate.

use crate::domain::error::MemeindexError;
use crate::domain::series::SeriesStore;

pub trait DataPort {
    /// Period labels in chronological order.
    fn list_periods(&self) -> Result<Vec<String>, MemeindexError>;

    fn load_period(&self, period: &str) -> Result<SeriesStore, MemeindexError>;
}

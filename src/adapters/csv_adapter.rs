//! Staged CSV data adapter.
//!
//! Layout: `<base_path>/<period>/<token>.csv`, one directory per period and
//! one OHLCV file per token. Required columns (case-insensitive) are
//! `timestamp`, `close` and `volume`; rows are ordered by timestamp and the
//! row position becomes the token-relative day index.

use crate::domain::error::MemeindexError;
use crate::domain::series::{SeriesStore, TokenSeries};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn period_path(&self, period: &str) -> PathBuf {
        self.base_path.join(period)
    }
}

impl DataPort for CsvAdapter {
    fn list_periods(&self) -> Result<Vec<String>, MemeindexError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MemeindexError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut periods = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                periods.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        periods.sort();
        Ok(periods)
    }

    fn load_period(&self, period: &str) -> Result<SeriesStore, MemeindexError> {
        let dir = self.period_path(period);
        if !dir.is_dir() {
            return Err(MemeindexError::NoData {
                period: period.to_string(),
            });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        files.sort();

        let mut store = SeriesStore::new();
        for path in files {
            let Some(token) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            match read_token_file(&path, &token) {
                Ok(series) => {
                    debug!(period, token = %token, days = series.day_count(), "loaded series");
                    store.insert(series)?;
                }
                Err(e) => warn!(period, token = %token, error = %e, "skipping token file"),
            }
        }

        Ok(store)
    }
}

fn read_token_file(path: &Path, token: &str) -> Result<TokenSeries, MemeindexError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| MemeindexError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let headers = rdr.headers().map_err(|e| MemeindexError::Data {
        reason: format!("CSV header error: {}", e),
    })?;
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| MemeindexError::Data {
                reason: format!("missing {} column", name),
            })
    };
    let ts_col = column("timestamp")?;
    let close_col = column("close")?;
    let volume_col = column("volume")?;

    let mut rows: Vec<(NaiveDateTime, Option<f64>, Option<f64>)> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| MemeindexError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let raw_ts = record.get(ts_col).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| MemeindexError::Data {
            reason: format!("invalid timestamp: {:?}", raw_ts),
        })?;
        let close = parse_cell(record.get(close_col), "close")?;
        let volume = parse_cell(record.get(volume_col), "volume")?;
        rows.push((timestamp, close, volume));
    }

    rows.sort_by_key(|(ts, _, _)| *ts);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(MemeindexError::Data {
            reason: format!("duplicate timestamp {}", pair[0].0),
        });
    }

    Ok(TokenSeries::from_rows(
        token,
        rows.into_iter().map(|(_, close, volume)| (close, volume)).collect(),
    ))
}

/// Empty and `NaN` cells are gaps.
fn parse_cell(cell: Option<&str>, name: &str) -> Result<Option<f64>, MemeindexError> {
    let raw = cell.unwrap_or_default().trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| MemeindexError::Data {
            reason: format!("invalid {} value {:?}: {}", name, raw, e),
        })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

//! Per-token day-indexed price/volume series and the store that holds them.
//!
//! Day indices are offsets from each token's own day-zero, never calendar
//! dates. Series are dense: every day up to the last observation has a slot,
//! and days without an observation are gaps (`None`).

use crate::domain::backtest::DayWindow;
use crate::domain::error::SeriesError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSeries {
    pub token: String,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

impl TokenSeries {
    /// Builds a series from rows already ordered by day.
    pub fn from_rows(token: impl Into<String>, rows: Vec<(Option<f64>, Option<f64>)>) -> Self {
        let (close, volume) = rows.into_iter().unzip();
        Self {
            token: token.into(),
            close,
            volume,
        }
    }

    pub fn day_count(&self) -> usize {
        self.close.len()
    }

    /// Close on `day`, or `None` for a gap. Non-finite and non-positive
    /// prices are gaps.
    pub fn close_on(&self, day: usize) -> Option<f64> {
        self.close
            .get(day)
            .copied()
            .flatten()
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Volume on `day`; gaps and non-finite values count as zero.
    pub fn volume_on(&self, day: usize) -> f64 {
        self.volume
            .get(day)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Summed volume over `window`, stopping at the last recorded day.
    pub fn volume_sum(&self, window: DayWindow) -> f64 {
        self.volume
            .iter()
            .skip(window.start)
            .take(window.len())
            .filter_map(|v| v.filter(|v| v.is_finite()))
            .sum()
    }
}

/// Token series for one period, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: Vec<TokenSeries>,
    index: HashMap<String, usize>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series<I>(series: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = TokenSeries>,
    {
        let mut store = Self::new();
        for s in series {
            store.insert(s)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, series: TokenSeries) -> Result<(), SeriesError> {
        if self.index.contains_key(&series.token) {
            return Err(SeriesError::DuplicateToken(series.token));
        }
        self.index.insert(series.token.clone(), self.series.len());
        self.series.push(series);
        Ok(())
    }

    pub fn get(&self, token: &str) -> Option<&TokenSeries> {
        self.index.get(token).map(|&i| &self.series[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

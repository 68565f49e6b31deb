//! Equal-weight portfolio return construction.

use crate::domain::backtest::{BiasMode, DayWindow};
use crate::domain::error::RunError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::series::SeriesStore;

/// Daily portfolio returns and the matching growth-of-1.0 curve.
///
/// `equity_curve[i]` is the value after `daily_returns[i]`; the implicit
/// baseline of 1.0 sits on the day before the first return.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub daily_returns: Vec<f64>,
    pub equity_curve: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_returns(daily_returns: Vec<f64>) -> Self {
        let equity_curve = daily_returns
            .iter()
            .scan(1.0_f64, |equity, r| {
                *equity *= 1.0 + r;
                Some(*equity)
            })
            .collect();
        Self {
            daily_returns,
            equity_curve,
        }
    }

    pub fn len(&self) -> usize {
        self.daily_returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_returns.is_empty()
    }

    /// Cumulative return at each day, i.e. `equity - 1`.
    pub fn cumulative_returns(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|e| e - 1.0).collect()
    }

    pub fn total_return(&self) -> f64 {
        self.equity_curve.last().map(|e| e - 1.0).unwrap_or(0.0)
    }
}

/// Equal-weight daily returns of `tokens` over `window`.
///
/// Days on which any token lacks a price are dropped before returns are
/// taken, so the first surviving day only anchors the first return. Weights
/// are `1 / tokens.len()` for the whole window.
pub fn equal_weight_returns(
    tokens: &[String],
    store: &SeriesStore,
    window: DayWindow,
) -> Result<ReturnSeries, RunError> {
    if tokens.is_empty() {
        return Err(RunError::NoQualifyingTokens {
            qualifying: 0,
            required: 1,
        });
    }

    let insufficient = |observations: usize| RunError::InsufficientWindow {
        window,
        observations,
    };
    if window.len() < 2 {
        return Err(insufficient(0));
    }

    let series: Vec<_> = tokens.iter().map(|t| store.get(t)).collect();
    let aligned: Vec<Vec<f64>> = (window.start..=window.end)
        .filter_map(|day| {
            series
                .iter()
                .map(|s| s.and_then(|s| s.close_on(day)))
                .collect::<Option<Vec<f64>>>()
        })
        .collect();

    if aligned.len() < 2 {
        return Err(insufficient(aligned.len().saturating_sub(1)));
    }

    let weight = 1.0 / tokens.len() as f64;
    let daily_returns = aligned
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(prev, curr)| curr / prev - 1.0)
                .sum::<f64>()
                * weight
        })
        .collect();

    Ok(ReturnSeries::from_returns(daily_returns))
}

/// One measured basket: who was held, over which window, and how it did.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRun {
    pub bias: BiasMode,
    pub window: DayWindow,
    pub tokens: Vec<String>,
    pub series: ReturnSeries,
    pub metrics: MetricsRecord,
}

impl PortfolioRun {
    pub fn compute(
        bias: BiasMode,
        tokens: Vec<String>,
        store: &SeriesStore,
        window: DayWindow,
    ) -> Result<Self, RunError> {
        let series = equal_weight_returns(&tokens, store, window)?;
        let metrics =
            MetricsRecord::compute(&series.daily_returns).ok_or(RunError::InsufficientWindow {
                window,
                observations: 0,
            })?;
        Ok(Self {
            bias,
            window,
            tokens,
            series,
            metrics,
        })
    }
}

//! Universe selection: rank a period's tokens by aggregate volume.

use crate::domain::backtest::DayWindow;
use crate::domain::error::RunError;
use crate::domain::series::SeriesStore;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedToken {
    pub token: String,
    pub total_volume: f64,
}

/// Top-N tokens of one period, highest aggregate volume first.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub members: Vec<RankedToken>,
    pub ranking_window: DayWindow,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.members.iter().map(|m| m.token.clone()).collect()
    }
}

/// Ranks every token in `store` by summed volume over `window` and keeps
/// the first `top_n`.
///
/// Missing volume days contribute zero. Equal totals keep store insertion
/// order: the comparator falls back to each token's insertion position.
pub fn select_universe(
    store: &SeriesStore,
    window: DayWindow,
    top_n: usize,
) -> Result<Universe, RunError> {
    if store.is_empty() {
        return Err(RunError::EmptyUniverse);
    }

    let mut ranked: Vec<(usize, RankedToken)> = store
        .iter()
        .enumerate()
        .map(|(position, series)| {
            (
                position,
                RankedToken {
                    token: series.token.clone(),
                    total_volume: series.volume_sum(window),
                },
            )
        })
        .collect();

    ranked.sort_by(|(pos_a, a), (pos_b, b)| by_volume_desc(a, b).then(pos_a.cmp(pos_b)));
    ranked.truncate(top_n);

    Ok(Universe {
        members: ranked.into_iter().map(|(_, member)| member).collect(),
        ranking_window: window,
    })
}

fn by_volume_desc(a: &RankedToken, b: &RankedToken) -> Ordering {
    b.total_volume.total_cmp(&a.total_volume)
}

//! Window validity filter.

use crate::domain::backtest::DayWindow;
use crate::domain::series::SeriesStore;

/// Keeps the candidates whose close series covers every day of `window`.
///
/// A token must have at least `window.end + 1` recorded days and no gap
/// inside the window. Unknown tokens are dropped. Candidate order is kept.
pub fn filter_valid(candidates: &[String], store: &SeriesStore, window: DayWindow) -> Vec<String> {
    candidates
        .iter()
        .filter(|token| is_valid(store, token, window))
        .cloned()
        .collect()
}

pub fn is_valid(store: &SeriesStore, token: &str, window: DayWindow) -> bool {
    let Some(series) = store.get(token) else {
        return false;
    };
    if window.is_empty() || series.day_count() <= window.end {
        return false;
    }
    (window.start..=window.end).all(|day| series.close_on(day).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::TokenSeries;

    fn store(entries: Vec<(&str, Vec<Option<f64>>)>) -> SeriesStore {
        let mut store = SeriesStore::new();
        for (token, closes) in entries {
            let rows = closes.into_iter().map(|c| (c, Some(1.0))).collect();
            store.insert(TokenSeries::from_rows(token, rows)).unwrap();
        }
        store
    }

    fn full(days: usize) -> Vec<Option<f64>> {
        (0..days).map(|d| Some(1.0 + d as f64)).collect()
    }

    #[test]
    fn too_short_series_is_excluded() {
        let s = store(vec![("A", full(6))]);
        let kept = filter_valid(&["A".to_string()], &s, DayWindow::new(3, 10));
        assert!(kept.is_empty());
    }

    #[test]
    fn gap_inside_window_excludes() {
        let mut closes = full(12);
        closes[5] = None;
        let s = store(vec![("A", closes), ("B", full(12))]);
        let candidates = vec!["A".to_string(), "B".to_string()];

        assert_eq!(filter_valid(&candidates, &s, DayWindow::new(3, 10)), vec!["B"]);
        // The gap is outside this window.
        assert_eq!(
            filter_valid(&candidates, &s, DayWindow::new(6, 11)),
            vec!["A", "B"]
        );
    }

    #[test]
    fn exact_length_is_enough() {
        let s = store(vec![("A", full(11))]);
        assert_eq!(
            filter_valid(&["A".to_string()], &s, DayWindow::new(3, 10)),
            vec!["A"]
        );
    }

    #[test]
    fn keeps_candidate_order_and_drops_unknown() {
        let s = store(vec![("A", full(5)), ("B", full(5))]);
        let candidates = vec!["B".to_string(), "ghost".to_string(), "A".to_string()];
        assert_eq!(
            filter_valid(&candidates, &s, DayWindow::new(0, 4)),
            vec!["B", "A"]
        );
    }

    #[test]
    fn empty_window_keeps_nothing() {
        let s = store(vec![("A", full(5))]);
        assert!(filter_valid(&["A".to_string()], &s, DayWindow::new(4, 3)).is_empty());
    }
}

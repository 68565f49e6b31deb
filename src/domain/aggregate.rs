//! Multi-period aggregation of privileged and honest runs.
//!
//! Each period gets a fresh universe ranked over its own reference window.
//! Both bias modes are measured independently; a failure in one never
//! prevents the other, and no period failure stops later periods. Completed
//! runs are chained per bias mode in period order, which models a full
//! equal-weight rebalance into the new universe at every period boundary.

use crate::domain::backtest::{BacktestConfig, BiasMode};
use crate::domain::error::RunError;
use crate::domain::metrics::MetricsRecord;
use crate::domain::portfolio::{PortfolioRun, ReturnSeries};
use crate::domain::series::SeriesStore;
use crate::domain::universe::{select_universe, Universe};
use crate::domain::window::filter_valid;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(PortfolioRun),
    Skipped(RunError),
}

impl RunOutcome {
    pub fn run(&self) -> Option<&PortfolioRun> {
        match self {
            RunOutcome::Completed(run) => Some(run),
            RunOutcome::Skipped(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RunError> {
        match self {
            RunOutcome::Completed(_) => None,
            RunOutcome::Skipped(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodResult {
    pub period: String,
    pub universe: Option<Universe>,
    pub privileged: RunOutcome,
    pub honest: RunOutcome,
}

impl PeriodResult {
    pub fn outcome(&self, bias: BiasMode) -> &RunOutcome {
        match bias {
            BiasMode::Privileged => &self.privileged,
            BiasMode::Honest => &self.honest,
        }
    }
}

/// A run that contributed nothing to its bias mode's combined curve.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRun {
    pub period: String,
    pub bias: BiasMode,
    pub error: RunError,
}

/// Returns of one bias mode chained across periods.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedCurve {
    pub bias: BiasMode,
    /// Periods that contributed, in order.
    pub periods: Vec<String>,
    pub series: ReturnSeries,
    /// `None` when no period contributed.
    pub metrics: Option<MetricsRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub periods: Vec<PeriodResult>,
    pub skipped: Vec<SkippedRun>,
    pub privileged: CombinedCurve,
    pub honest: CombinedCurve,
}

impl AggregateReport {
    pub fn combined(&self, bias: BiasMode) -> &CombinedCurve {
        match bias {
            BiasMode::Privileged => &self.privileged,
            BiasMode::Honest => &self.honest,
        }
    }

    pub fn completed_runs(&self) -> usize {
        self.periods
            .iter()
            .flat_map(|p| BiasMode::ALL.map(|b| p.outcome(b).run().is_some()))
            .filter(|&done| done)
            .count()
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    periods: Vec<String>,
    returns: Vec<f64>,
}

impl Accumulator {
    fn finish(self, bias: BiasMode) -> CombinedCurve {
        let metrics = MetricsRecord::compute(&self.returns);
        CombinedCurve {
            bias,
            periods: self.periods,
            series: ReturnSeries::from_returns(self.returns),
            metrics,
        }
    }
}

/// Drives the per-period pipeline and owns the combined-curve accumulators.
pub struct MultiPeriodAggregator<'a> {
    config: &'a BacktestConfig,
    periods: Vec<PeriodResult>,
    skipped: Vec<SkippedRun>,
    privileged: Accumulator,
    honest: Accumulator,
}

impl<'a> MultiPeriodAggregator<'a> {
    pub fn new(config: &'a BacktestConfig) -> Self {
        Self {
            config,
            periods: Vec::new(),
            skipped: Vec::new(),
            privileged: Accumulator::default(),
            honest: Accumulator::default(),
        }
    }

    /// Runs both bias modes for one period. Periods must arrive in
    /// chronological order.
    pub fn process_period(&mut self, period: &str, store: &SeriesStore) -> &PeriodResult {
        let result = match select_universe(store, self.config.ranking_window, self.config.top_n)
        {
            Ok(universe) => {
                info!(
                    period,
                    tokens = store.len(),
                    selected = universe.count(),
                    "ranked universe"
                );
                debug!(period, members = ?universe.tokens(), "universe members");
                let privileged = self.measure(BiasMode::Privileged, &universe, store);
                let honest = self.measure(BiasMode::Honest, &universe, store);
                PeriodResult {
                    period: period.to_string(),
                    universe: Some(universe),
                    privileged,
                    honest,
                }
            }
            Err(err) => PeriodResult {
                period: period.to_string(),
                universe: None,
                privileged: RunOutcome::Skipped(err.clone()),
                honest: RunOutcome::Skipped(err),
            },
        };

        for bias in BiasMode::ALL {
            self.record(&result, bias);
        }
        self.periods.push(result);
        &self.periods[self.periods.len() - 1]
    }

    fn measure(&self, bias: BiasMode, universe: &Universe, store: &SeriesStore) -> RunOutcome {
        let window = self.config.window_for(bias);
        let tokens = filter_valid(&universe.tokens(), store, window);
        if tokens.is_empty() || tokens.len() < self.config.min_tokens {
            return RunOutcome::Skipped(RunError::NoQualifyingTokens {
                qualifying: tokens.len(),
                required: self.config.min_tokens.max(1),
            });
        }
        match PortfolioRun::compute(bias, tokens, store, window) {
            Ok(run) => RunOutcome::Completed(run),
            Err(err) => RunOutcome::Skipped(err),
        }
    }

    fn record(&mut self, result: &PeriodResult, bias: BiasMode) {
        let period = result.period.as_str();
        let error = match result.outcome(bias) {
            RunOutcome::Completed(run) if run.metrics.has_volatility() => {
                info!(
                    period,
                    %bias,
                    tokens = run.tokens.len(),
                    total_return = run.metrics.total_return,
                    "run completed"
                );
                let acc = self.accumulator(bias);
                acc.periods.push(period.to_string());
                acc.returns.extend_from_slice(&run.series.daily_returns);
                return;
            }
            RunOutcome::Completed(_) => RunError::UndefinedVolatility,
            RunOutcome::Skipped(err) => err.clone(),
        };

        warn!(period, %bias, error = %error, "run excluded from combined curve");
        self.skipped.push(SkippedRun {
            period: period.to_string(),
            bias,
            error,
        });
    }

    fn accumulator(&mut self, bias: BiasMode) -> &mut Accumulator {
        match bias {
            BiasMode::Privileged => &mut self.privileged,
            BiasMode::Honest => &mut self.honest,
        }
    }

    pub fn finish(self) -> AggregateReport {
        AggregateReport {
            periods: self.periods,
            skipped: self.skipped,
            privileged: self.privileged.finish(BiasMode::Privileged),
            honest: self.honest.finish(BiasMode::Honest),
        }
    }
}

/// Runs every `(label, store)` period in order.
pub fn run_periods<'s, I>(config: &BacktestConfig, periods: I) -> AggregateReport
where
    I: IntoIterator<Item = (&'s str, &'s SeriesStore)>,
{
    let mut aggregator = MultiPeriodAggregator::new(config);
    for (label, store) in periods {
        aggregator.process_period(label, store);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::DayWindow;
    use crate::domain::series::TokenSeries;
    use approx::assert_relative_eq;

    fn config() -> BacktestConfig {
        BacktestConfig::new(10, 3, 0)
    }

    fn constant_store(token: &str, days: usize, price: f64) -> SeriesStore {
        let rows = (0..days).map(|_| (Some(price), Some(1.0))).collect();
        SeriesStore::from_series(vec![TokenSeries::from_rows(token, rows)]).unwrap()
    }

    #[test]
    fn zero_periods_give_empty_curves() {
        let report = MultiPeriodAggregator::new(&config()).finish();
        assert!(report.periods.is_empty());
        assert!(report.privileged.series.is_empty());
        assert!(report.honest.series.is_empty());
        assert!(report.privileged.metrics.is_none());
        assert_eq!(report.completed_runs(), 0);
    }

    #[test]
    fn empty_store_skips_both_runs() {
        let cfg = config();
        let mut agg = MultiPeriodAggregator::new(&cfg);
        let result = agg.process_period("jan24", &SeriesStore::new());
        assert!(result.universe.is_none());
        assert_eq!(result.privileged, RunOutcome::Skipped(RunError::EmptyUniverse));
        assert_eq!(result.honest, RunOutcome::Skipped(RunError::EmptyUniverse));

        let report = agg.finish();
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn short_series_only_completes_privileged() {
        let cfg = config();
        let store = constant_store("A", 4, 1.0);
        let report = run_periods(&cfg, [("jan24", &store)]);

        let period = &report.periods[0];
        assert!(period.privileged.run().is_some());
        assert!(matches!(
            period.honest.error(),
            Some(RunError::NoQualifyingTokens { qualifying: 0, .. })
        ));
        assert_eq!(report.privileged.series.len(), 2);
        assert!(report.honest.series.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].bias, BiasMode::Honest);
    }

    #[test]
    fn combined_curve_chains_periods_in_order() {
        let cfg = config();
        let rising = SeriesStore::from_series(vec![TokenSeries::from_rows(
            "A",
            [1.0, 1.1, 1.21, 1.0, 1.0, 1.0]
                .iter()
                .map(|&p| (Some(p), Some(1.0)))
                .collect(),
        )])
        .unwrap();
        let falling = SeriesStore::from_series(vec![TokenSeries::from_rows(
            "B",
            [2.0, 1.0, 1.0, 1.0, 1.0, 0.5]
                .iter()
                .map(|&p| (Some(p), Some(1.0)))
                .collect(),
        )])
        .unwrap();

        let report = run_periods(&cfg, [("jan24", &rising), ("feb24", &falling)]);

        let privileged = &report.privileged;
        assert_eq!(privileged.periods, vec!["jan24", "feb24"]);
        assert_eq!(privileged.series.len(), 4);
        assert_relative_eq!(privileged.series.daily_returns[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(privileged.series.daily_returns[2], -0.5, epsilon = 1e-12);
        assert_relative_eq!(
            privileged.series.total_return(),
            1.21 * 0.5 - 1.0,
            epsilon = 1e-12
        );

        let honest = &report.honest;
        assert_eq!(honest.series.len(), 4);
        assert_relative_eq!(honest.series.daily_returns[3], -0.5, epsilon = 1e-12);
        assert!(honest.metrics.is_some());
    }

    #[test]
    fn undefined_volatility_is_reported_and_excluded() {
        let cfg = BacktestConfig::new(10, 2, 0);
        let store = constant_store("A", 4, 1.0);
        let report = run_periods(&cfg, [("d1", &store)]);

        let run = report.periods[0].privileged.run().unwrap();
        assert_eq!(run.metrics.observations, 1);
        assert!(run.metrics.volatility.is_none());
        assert!(report.privileged.series.is_empty());
        assert!(report
            .skipped
            .iter()
            .all(|s| s.error == RunError::UndefinedVolatility));
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn min_tokens_skips_thin_baskets() {
        let cfg = config().with_min_tokens(2);
        let store = constant_store("A", 6, 1.0);
        let report = run_periods(&cfg, [("jan24", &store)]);
        assert_eq!(
            report.periods[0].privileged.error(),
            Some(&RunError::NoQualifyingTokens {
                qualifying: 1,
                required: 2
            })
        );
    }

    #[test]
    fn ranking_window_controls_membership() {
        let cfg = BacktestConfig::new(1, 3, 0).with_ranking_window(DayWindow::new(3, 5));
        let a = TokenSeries::from_rows(
            "A",
            (0..6).map(|d| (Some(1.0), Some(if d < 3 { 100.0 } else { 0.0 }))).collect(),
        );
        let b = TokenSeries::from_rows(
            "B",
            (0..6).map(|d| (Some(1.0), Some(if d < 3 { 0.0 } else { 10.0 }))).collect(),
        );
        let store = SeriesStore::from_series(vec![a, b]).unwrap();
        let report = run_periods(&cfg, [("jan24", &store)]);

        let universe = report.periods[0].universe.as_ref().unwrap();
        assert_eq!(universe.tokens(), vec!["B"]);
        assert_eq!(
            report.periods[0].privileged.run().unwrap().tokens,
            vec!["B".to_string()]
        );
    }
}

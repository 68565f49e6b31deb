//! Performance metrics of a daily return series.

/// Tokens trade every calendar day.
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    pub observations: usize,
    pub total_return: f64,
    pub annualized_return: f64,
    pub mean_daily_return: f64,
    /// Sample standard deviation; `None` with a single observation.
    pub volatility: Option<f64>,
    /// `None` whenever volatility is undefined.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
}

impl MetricsRecord {
    /// Returns `None` for an empty series.
    pub fn compute(returns: &[f64]) -> Option<Self> {
        if returns.is_empty() {
            return None;
        }

        let observations = returns.len();
        let n = observations as f64;
        let total_return = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
        let annualized_return = (1.0 + total_return).powf(DAYS_PER_YEAR / n) - 1.0;
        let mean_daily_return = returns.iter().sum::<f64>() / n;
        let volatility = sample_std(returns, mean_daily_return);
        let sharpe_ratio = volatility.map(|vol| sharpe(mean_daily_return, vol));
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(returns);

        Some(Self {
            observations,
            total_return,
            annualized_return,
            mean_daily_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
        })
    }

    pub fn has_volatility(&self) -> bool {
        self.volatility.is_some()
    }
}

fn sample_std(returns: &[f64], mean: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    Some(variance.sqrt())
}

fn sharpe(mean: f64, volatility: f64) -> f64 {
    if volatility == 0.0 {
        0.0
    } else {
        mean / volatility * DAYS_PER_YEAR.sqrt()
    }
}

/// Deepest fall below the running peak of the growth curve, and the longest
/// stretch of consecutive days spent below a peak. The peak starts at the
/// 1.0 baseline.
fn compute_drawdown(returns: &[f64]) -> (f64, usize) {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for r in returns {
        equity *= 1.0 + r;
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else {
            max_dd = max_dd.min(equity / peak - 1.0);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn metrics_empty_series() {
        assert!(MetricsRecord::compute(&[]).is_none());
    }

    #[test]
    fn metrics_all_zero_returns() {
        let m = MetricsRecord::compute(&[0.0; 29]).unwrap();
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.annualized_return, 0.0);
        assert_eq!(m.volatility, Some(0.0));
        assert_eq!(m.sharpe_ratio, Some(0.0));
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.max_drawdown_duration, 0);
    }

    #[test]
    fn metrics_single_observation_has_undefined_volatility() {
        let m = MetricsRecord::compute(&[0.05]).unwrap();
        assert_eq!(m.observations, 1);
        assert!(!m.has_volatility());
        assert_eq!(m.sharpe_ratio, None);
        assert_relative_eq!(m.total_return, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn metrics_known_series() {
        let m = MetricsRecord::compute(&[0.1, -0.05, 0.02]).unwrap();
        assert_relative_eq!(m.total_return, 0.0659, epsilon = 1e-12);
        assert_relative_eq!(m.annualized_return, 2354.968984181749, max_relative = 1e-9);
        assert_relative_eq!(m.mean_daily_return, 0.07 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.volatility.unwrap(), 0.07505553499465135, epsilon = 1e-12);
        assert_relative_eq!(m.sharpe_ratio.unwrap(), 5.939371525867696, epsilon = 1e-9);
        assert_relative_eq!(m.max_drawdown, -0.05, epsilon = 1e-12);
        assert_eq!(m.max_drawdown_duration, 2);
    }

    #[test]
    fn metrics_drawdown_measured_from_baseline() {
        // Prices 10, 9, 9, 12.
        let m = MetricsRecord::compute(&[-0.1, 0.0, 1.0 / 3.0]).unwrap();
        assert_relative_eq!(m.max_drawdown, -0.1, epsilon = 1e-12);
        assert_eq!(m.max_drawdown_duration, 2);
        assert_relative_eq!(m.total_return, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn metrics_max_drawdown_from_later_peak() {
        // Equity 1.1, 0.88, 0.968
        let m = MetricsRecord::compute(&[0.1, -0.2, 0.1]).unwrap();
        assert_relative_eq!(m.max_drawdown, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn metrics_monotonic_curve_has_no_drawdown() {
        let m = MetricsRecord::compute(&[0.01, 0.0, 0.02, 0.0]).unwrap();
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn metrics_annualized_full_year() {
        let m = MetricsRecord::compute(&vec![0.0; 365]).unwrap();
        assert_eq!(m.annualized_return, 0.0);

        let daily = 1.1_f64.powf(1.0 / 365.0) - 1.0;
        let m = MetricsRecord::compute(&vec![daily; 365]).unwrap();
        assert_relative_eq!(m.annualized_return, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn metrics_negative_sharpe() {
        let m = MetricsRecord::compute(&[-0.01, -0.02, -0.03]).unwrap();
        assert!(m.sharpe_ratio.unwrap() < 0.0);
    }

    proptest! {
        #[test]
        fn drawdown_never_positive(returns in prop::collection::vec(-0.9f64..1.0, 1..60)) {
            let m = MetricsRecord::compute(&returns).unwrap();
            prop_assert!(m.max_drawdown <= 0.0);
            prop_assert!(m.max_drawdown >= -1.0);
        }

        #[test]
        fn non_negative_returns_have_zero_drawdown(returns in prop::collection::vec(0.0f64..1.0, 1..60)) {
            let m = MetricsRecord::compute(&returns).unwrap();
            prop_assert_eq!(m.max_drawdown, 0.0);
        }

        #[test]
        fn any_loss_gives_negative_drawdown(
            head in prop::collection::vec(0.0f64..0.5, 0..20),
            loss in -0.9f64..-0.001,
        ) {
            let mut returns = head;
            returns.push(loss);
            let m = MetricsRecord::compute(&returns).unwrap();
            prop_assert!(m.max_drawdown < 0.0);
        }
    }
}

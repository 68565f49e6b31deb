//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::backtest::{
    BacktestConfig, DayWindow, DEFAULT_HONEST_GAP, DEFAULT_MIN_TOKENS, DEFAULT_TOP_N,
    DEFAULT_WINDOW_LENGTH, MAX_DAY_INDEX,
};
use crate::domain::error::MemeindexError;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    match config.get_string("data", "base_path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MemeindexError::ConfigMissing {
            section: "data".to_string(),
            key: "base_path".to_string(),
        }),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    validate_top_n(config)?;
    validate_window_length(config)?;
    validate_honest_gap(config)?;
    validate_min_tokens(config)?;
    validate_ranking_window(config)?;
    let backtest = build_backtest_config(config)?;
    validate_no_overlap(&backtest)?;
    Ok(())
}

/// Builds a [`BacktestConfig`] from the `[backtest]` section, applying
/// defaults for absent keys.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, MemeindexError> {
    let top_n = non_negative(config, "top_n", DEFAULT_TOP_N)?;
    let window_length = day_count(config, "window_length", DEFAULT_WINDOW_LENGTH)?;
    let honest_gap = day_count(config, "honest_gap", DEFAULT_HONEST_GAP)?;
    let min_tokens = non_negative(config, "min_tokens", DEFAULT_MIN_TOKENS)?;

    let mut backtest = BacktestConfig::new(top_n, window_length, honest_gap).with_min_tokens(min_tokens);
    if let Some(window) = ranking_window(config)? {
        backtest = backtest.with_ranking_window(window);
    }
    Ok(backtest)
}

fn invalid(key: &str, reason: &str) -> MemeindexError {
    MemeindexError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Present values must parse as integers; absent keys take `default`.
fn non_negative(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MemeindexError> {
    let Some(raw) = config.get_string("backtest", key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(key, &format!("{} is not an integer: {:?}", key, raw.trim())))?;
    usize::try_from(value).map_err(|_| invalid(key, &format!("{} must be non-negative", key)))
}

/// A day offset or length, capped at [`MAX_DAY_INDEX`].
fn day_count(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MemeindexError> {
    let value = non_negative(config, key, default)?;
    if value > MAX_DAY_INDEX {
        return Err(invalid(
            key,
            &format!("{} must not exceed {} days", key, MAX_DAY_INDEX),
        ));
    }
    Ok(value)
}

fn validate_top_n(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    if non_negative(config, "top_n", DEFAULT_TOP_N)? == 0 {
        return Err(invalid("top_n", "top_n must be at least 1"));
    }
    Ok(())
}

fn validate_window_length(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    if day_count(config, "window_length", DEFAULT_WINDOW_LENGTH)? < 2 {
        return Err(invalid(
            "window_length",
            "window_length must be at least 2 days",
        ));
    }
    Ok(())
}

fn validate_honest_gap(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    day_count(config, "honest_gap", DEFAULT_HONEST_GAP)?;
    Ok(())
}

fn validate_min_tokens(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    if non_negative(config, "min_tokens", DEFAULT_MIN_TOKENS)? == 0 {
        return Err(invalid("min_tokens", "min_tokens must be at least 1"));
    }
    Ok(())
}

fn validate_ranking_window(config: &dyn ConfigPort) -> Result<(), MemeindexError> {
    ranking_window(config)?;
    Ok(())
}

/// `ranking_start`/`ranking_end` must be given together.
fn ranking_window(config: &dyn ConfigPort) -> Result<Option<DayWindow>, MemeindexError> {
    let start = config.get_string("backtest", "ranking_start");
    let end = config.get_string("backtest", "ranking_end");
    match (start, end) {
        (None, None) => Ok(None),
        (Some(_), Some(_)) => {
            let start = day_count(config, "ranking_start", 0)?;
            let end = day_count(config, "ranking_end", 0)?;
            if start > end {
                return Err(invalid(
                    "ranking_start",
                    "ranking_start must not be after ranking_end",
                ));
            }
            Ok(Some(DayWindow::new(start, end)))
        }
        (Some(_), None) => Err(MemeindexError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ranking_end".to_string(),
        }),
        (None, Some(_)) => Err(MemeindexError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ranking_start".to_string(),
        }),
    }
}

/// The honest window must share no day with the ranking window.
fn validate_no_overlap(backtest: &BacktestConfig) -> Result<(), MemeindexError> {
    if backtest.honest_window.overlaps(&backtest.ranking_window) {
        return Err(invalid(
            "ranking_end",
            &format!(
                "ranking window {} overlaps honest window {}",
                backtest.ranking_window, backtest.honest_window
            ),
        ));
    }
    Ok(())
}

//! Domain error types.
//!
//! [`RunError`] covers the expected, recoverable conditions of a single
//! (period, bias) run. [`MemeindexError`] is the process-level error used by
//! the adapters and the CLI.

use crate::domain::backtest::DayWindow;

/// Why one (period, bias) run produced no usable return series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    #[error("no candidate tokens to rank")]
    EmptyUniverse,

    #[error("only {qualifying} tokens have complete data, need {required}")]
    NoQualifyingTokens { qualifying: usize, required: usize },

    #[error("window {window} yields {observations} return observations, need at least 1")]
    InsufficientWindow {
        window: DayWindow,
        observations: usize,
    },

    #[error("volatility is undefined for a single return observation")]
    UndefinedVolatility,
}

/// Errors raised while constructing a time series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("duplicate token {0}")]
    DuplicateToken(String),
}

/// Top-level error type for memeindex.
#[derive(Debug, thiserror::Error)]
pub enum MemeindexError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("no data for period {period}")]
    NoData { period: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MemeindexError> for std::process::ExitCode {
    fn from(err: &MemeindexError) -> Self {
        let code: u8 = match err {
            MemeindexError::Io(_) => 1,
            MemeindexError::ConfigParse { .. }
            | MemeindexError::ConfigMissing { .. }
            | MemeindexError::ConfigInvalid { .. } => 2,
            MemeindexError::Data { .. } | MemeindexError::Series(_) => 3,
            MemeindexError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_error_messages() {
        assert_eq!(
            RunError::EmptyUniverse.to_string(),
            "no candidate tokens to rank"
        );
        let err = RunError::InsufficientWindow {
            window: DayWindow::new(3, 3),
            observations: 0,
        };
        assert_eq!(
            err.to_string(),
            "window [3, 3] yields 0 return observations, need at least 1"
        );
        let err = RunError::NoQualifyingTokens {
            qualifying: 1,
            required: 2,
        };
        assert_eq!(err.to_string(), "only 1 tokens have complete data, need 2");
    }

    #[test]
    fn series_error_converts_to_top_level() {
        let err: MemeindexError = SeriesError::DuplicateToken("PEPE".into()).into();
        assert_eq!(err.to_string(), "duplicate token PEPE");
    }
}

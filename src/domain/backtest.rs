//! Backtest parameters: day windows, bias modes and `BacktestConfig`.

use std::fmt;

/// Inclusive `[start, end]` range of token-relative day indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    pub start: usize,
    pub end: usize,
}

impl DayWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of days covered; zero when `end < start`.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &DayWindow) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start <= other.end
            && other.start <= self.end
    }
}

impl fmt::Display for DayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Which measurement window a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiasMode {
    /// Measured from day 0, overlapping the ranking window.
    Privileged,
    /// Measured strictly after the privileged window.
    Honest,
}

impl BiasMode {
    pub const ALL: [BiasMode; 2] = [BiasMode::Privileged, BiasMode::Honest];

    pub fn label(&self) -> &'static str {
        match self {
            BiasMode::Privileged => "privileged",
            BiasMode::Honest => "honest",
        }
    }
}

impl fmt::Display for BiasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_WINDOW_LENGTH: usize = 30;
pub const DEFAULT_HONEST_GAP: usize = 0;
pub const DEFAULT_MIN_TOKENS: usize = 1;
/// Upper bound for configured day offsets and window lengths (100 years).
pub const MAX_DAY_INDEX: usize = 36_500;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub top_n: usize,
    pub ranking_window: DayWindow,
    pub privileged_window: DayWindow,
    pub honest_window: DayWindow,
    pub min_tokens: usize,
}

impl BacktestConfig {
    /// Privileged window `[0, len-1]`, honest window starting `gap` days after
    /// it, ranking over the privileged window. Day indices saturate at
    /// `usize::MAX`.
    pub fn new(top_n: usize, window_length: usize, honest_gap: usize) -> Self {
        let length = window_length.max(1);
        let privileged_window = DayWindow::new(0, length - 1);
        let honest_start = length.saturating_add(honest_gap);
        Self {
            top_n,
            ranking_window: privileged_window,
            privileged_window,
            honest_window: DayWindow::new(honest_start, honest_start.saturating_add(length - 1)),
            min_tokens: DEFAULT_MIN_TOKENS,
        }
    }

    pub fn with_ranking_window(mut self, window: DayWindow) -> Self {
        self.ranking_window = window;
        self
    }

    pub fn with_min_tokens(mut self, min_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    pub fn window_for(&self, bias: BiasMode) -> DayWindow {
        match bias {
            BiasMode::Privileged => self.privileged_window,
            BiasMode::Honest => self.honest_window,
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N, DEFAULT_WINDOW_LENGTH, DEFAULT_HONEST_GAP)
    }
}

//! Windowed cooperation statistics
//!
//! Nothing here is stored: every figure is recomputed from a ledger suffix
//! when asked for. Partial windows divide by the rounds actually available,
//! and an empty window reports the neutral 0.5 prior.

use serde::{Deserialize, Serialize};
use crate::ledger::{Action, HistoryLedger, Side};

/// Commonly used trailing window sizes.
pub const WINDOW_SHORT: usize = 5;
pub const WINDOW_RECENT: usize = 10;
pub const WINDOW_MEDIUM: usize = 20;
pub const WINDOW_LONG: usize = 50;
pub const WINDOW_EXTENDED: usize = 200;

/// Rate reported when a window holds no rounds.
pub const NEUTRAL_RATE: f64 = 0.5;

/// Span of history a statistic covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    /// The trailing `n` rounds (fewer if the match is younger).
    Last(usize),
    /// Every round played so far.
    Whole,
}

impl Window {
    fn take<'a>(&self, ledger: &'a HistoryLedger, of: Side) -> &'a [Action] {
        match *self {
            Window::Last(n) => ledger.suffix(n, of),
            Window::Whole => ledger.moves(of),
        }
    }
}

/// Cooperation count over a window; `0 <= cooperations <= length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowStat {
    pub cooperations: usize,
    pub length: usize,
}

impl WindowStat {
    pub fn of(moves: &[Action]) -> Self {
        Self {
            cooperations: moves.iter().filter(|m| m.is_cooperate()).count(),
            length: moves.len(),
        }
    }

    pub fn defections(&self) -> usize {
        self.length - self.cooperations
    }

    pub fn cooperation_rate(&self) -> f64 {
        if self.length == 0 {
            NEUTRAL_RATE
        } else {
            self.cooperations as f64 / self.length as f64
        }
    }

    pub fn defection_rate(&self) -> f64 {
        1.0 - self.cooperation_rate()
    }
}

pub fn window_stat(ledger: &HistoryLedger, window: Window, of: Side) -> WindowStat {
    WindowStat::of(window.take(ledger, of))
}

/// Cooperation rate in [0, 1]; 0.5 when the window is empty.
pub fn cooperation_rate(ledger: &HistoryLedger, window: Window, of: Side) -> f64 {
    window_stat(ledger, window, of).cooperation_rate()
}

pub fn defection_rate(ledger: &HistoryLedger, window: Window, of: Side) -> f64 {
    window_stat(ledger, window, of).defection_rate()
}

//! Match phase classification

use serde::{Deserialize, Serialize};

/// Stage of the match; ordered so that `Opening < Main < Endgame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Opening,
    Main,
    Endgame,
}

/// How long the endgame lasts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EndgameSpan {
    /// A fixed number of final rounds.
    Rounds(u32),
    /// A share of the horizon, rounded up (0.02 = final 2%).
    Fraction(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Rounds `0..opening_len` are the Opening.
    pub opening_len: u32,
    pub endgame: EndgameSpan,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            opening_len: 3,
            endgame: EndgameSpan::Rounds(10),
        }
    }
}

impl PhaseConfig {
    /// Endgame length in rounds for a given horizon, never above it.
    pub fn endgame_len(&self, horizon: u32) -> u32 {
        let len = match self.endgame {
            EndgameSpan::Rounds(n) => n,
            // tolerance keeps 1000 * 0.025 at 25 despite float error
            EndgameSpan::Fraction(f) => {
                (horizon as f64 * f.clamp(0.0, 1.0) - 1e-9).ceil().max(0.0) as u32
            }
        };
        len.min(horizon)
    }

    /// First round index of the Endgame.
    pub fn endgame_start(&self, horizon: u32) -> u32 {
        horizon - self.endgame_len(horizon)
    }

    /// Pure classification of a round index. Opening wins if the two
    /// spans overlap on a short horizon.
    pub fn classify(&self, round: u32, horizon: u32) -> Phase {
        if round < self.opening_len {
            Phase::Opening
        } else if round >= self.endgame_start(horizon) {
            Phase::Endgame
        } else {
            Phase::Main
        }
    }

    /// True if some round of the match falls in the Opening.
    pub fn opening_reachable(&self, horizon: u32) -> bool {
        self.opening_len > 0 && horizon > 0
    }
}

/// Phase state machine held by an agent for one match.
///
/// Only moves forward: a round index that would classify earlier than the
/// current phase leaves it unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTracker {
    current: Phase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self { current: Phase::Opening }
    }
}

impl PhaseTracker {
    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn advance(&mut self, config: &PhaseConfig, round: u32, horizon: u32) -> Phase {
        self.current = self.current.max(config.classify(round, horizon));
        self.current
    }
}

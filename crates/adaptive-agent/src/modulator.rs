//! Cooperation probability modulation
//!
//! Starts from a base probability and applies the configured adjustments
//! in `order`. With `ClampMode::Final` the shifts are summed and clamped
//! once; with `ClampMode::EachStep` the running value is clamped after
//! every adjustment, which makes the order observable near the limits.

use serde::{Deserialize, Serialize};

use crate::context::ScoreState;
use crate::ledger::{Action, HistoryLedger, Side};
use crate::phase::Phase;
use crate::random::RandomSource;
use crate::stats::{cooperation_rate, Window};

/// One additive term of the modulated probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjustment {
    Phase,
    ShortWindow,
    LongWindow,
    Score,
    Caution,
}

impl Adjustment {
    pub const DEFAULT_ORDER: [Adjustment; 5] = [
        Adjustment::Phase,
        Adjustment::ShortWindow,
        Adjustment::LongWindow,
        Adjustment::Score,
        Adjustment::Caution,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampMode {
    #[default]
    Final,
    EachStep,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseShift {
    pub opening: f64,
    pub main: f64,
    pub endgame: f64,
}

impl PhaseShift {
    fn for_phase(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Opening => self.opening,
            Phase::Main => self.main,
            Phase::Endgame => self.endgame,
        }
    }
}

/// Reward high and penalize low opponent cooperation over a window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowShift {
    pub window: usize,
    /// Rate at or above which `reward` is added.
    pub high: f64,
    /// Rate at or below which `penalty` is subtracted.
    pub low: f64,
    pub reward: f64,
    pub penalty: f64,
}

impl WindowShift {
    pub fn new(window: usize, high: f64, low: f64, reward: f64, penalty: f64) -> Self {
        Self { window, high, low, reward, penalty }
    }

    fn shift(&self, ledger: &HistoryLedger) -> f64 {
        if ledger.is_empty() {
            return 0.0;
        }
        let rate = cooperation_rate(ledger, Window::Last(self.window), Side::Opponent);
        if rate >= self.high {
            self.reward
        } else if rate <= self.low {
            -self.penalty
        } else {
            0.0
        }
    }
}

/// Signed shifts applied when the score gap exceeds `margin`.
///
/// Directions are data: a cooperative agent typically has a positive
/// `leading` and a negative `trailing`, an aggressive one the reverse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreShift {
    pub margin: u32,
    pub leading: f64,
    pub trailing: f64,
}

impl ScoreShift {
    fn shift(&self, scores: &ScoreState) -> f64 {
        let diff = scores.differential();
        let margin = self.margin as i64;
        if diff > margin {
            self.leading
        } else if diff < -margin {
            self.trailing
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModulatorConfig {
    /// Starting probability; `None` takes the disposition's default.
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default)]
    pub phase: PhaseShift,
    pub short: WindowShift,
    pub long: WindowShift,
    #[serde(default)]
    pub score: ScoreShift,
    /// Subtracted while a caution flag is raised.
    #[serde(default)]
    pub caution: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_order")]
    pub order: Vec<Adjustment>,
    #[serde(default)]
    pub clamp_mode: ClampMode,
}

fn default_order() -> Vec<Adjustment> {
    Adjustment::DEFAULT_ORDER.to_vec()
}

impl Default for ModulatorConfig {
    fn default() -> Self {
        Self {
            base: None,
            phase: PhaseShift::default(),
            short: WindowShift::new(10, 0.7, 0.3, 0.1, 0.1),
            long: WindowShift::new(50, 0.7, 0.3, 0.05, 0.05),
            score: ScoreShift::default(),
            caution: 0.05,
            min: 0.1,
            max: 0.9,
            order: default_order(),
            clamp_mode: ClampMode::Final,
        }
    }
}

/// What the modulator reads for one round.
#[derive(Clone, Copy, Debug)]
pub struct ModulatorInput<'a> {
    pub phase: Phase,
    pub ledger: &'a HistoryLedger,
    pub scores: ScoreState,
    pub caution: bool,
}

impl ModulatorConfig {
    fn term(&self, adjustment: Adjustment, input: &ModulatorInput<'_>) -> f64 {
        match adjustment {
            Adjustment::Phase => self.phase.for_phase(input.phase),
            Adjustment::ShortWindow => self.short.shift(input.ledger),
            Adjustment::LongWindow => self.long.shift(input.ledger),
            Adjustment::Score => self.score.shift(&input.scores),
            Adjustment::Caution if input.caution => -self.caution,
            Adjustment::Caution => 0.0,
        }
    }

    /// Cooperation probability for this round, always within `[min, max]`.
    pub fn probability(&self, base: f64, input: &ModulatorInput<'_>) -> f64 {
        let mut p = base;
        for adjustment in &self.order {
            p += self.term(*adjustment, input);
            if self.clamp_mode == ClampMode::EachStep {
                p = p.clamp(self.min, self.max);
            }
        }
        p.clamp(self.min, self.max)
    }
}

/// Cooperate with probability `p`.
pub fn choose(p: f64, rng: &mut dyn RandomSource) -> Action {
    if rng.next_unit() < p {
        Action::Cooperate
    } else {
        Action::Defect
    }
}

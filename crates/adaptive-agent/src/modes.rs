//! Mode/counter bank
//!
//! Every mode an agent can enter is declared as a `ModeRule` in its
//! configuration, in priority order. The bank keeps the mutable side of
//! those rules: one countdown `Counter`, one `Flag`, and whatever scratch
//! the rule needs (probe schedule, score snapshot).
//!
//! Per round the composer calls, in order:
//! 1. `evaluate_triggers` before deciding, which arms inactive counters
//!    and sets flags;
//! 2. `active_override` to ask for the highest-priority override;
//! 3. `end_round` after deciding, which ticks every counter and clears
//!    flags whose exit condition holds.
//!
//! A counter armed with `k` therefore overrides exactly `k` rounds,
//! counting the round that armed it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RoundContext;
use crate::ledger::{Action, Side};
use crate::patterns::{mutual_run, trailing_run};
use crate::phase::{Phase, PhaseConfig};
use crate::random::RandomSource;
use crate::stats::{cooperation_rate, Window};

/// Declaration of one mode: trigger, duration and contribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModeRule {
    /// Defect after the opponent defects `after_defections` times in a row.
    ///
    /// Each activation lasts `length + escalation * previous_activations`
    /// rounds, or `lenient_length` when the opponent's whole-match
    /// cooperation rate is above `lenient_above`.
    Retaliation {
        after_defections: u32,
        length: u32,
        #[serde(default)]
        escalation: u32,
        #[serde(default)]
        lenient_above: Option<f64>,
        #[serde(default = "one")]
        lenient_length: u32,
    },
    /// Defect against an opponent that cooperated `after_cooperations`
    /// times in a row.
    Exploit { after_cooperations: u32, length: u32 },
    /// Cooperate after `after_mutual_defections` rounds of mutual defection.
    PeaceOffering { after_mutual_defections: u32, length: u32 },
    /// Single-round defection at randomized intervals during the Main
    /// phase, only while the opponent's windowed cooperation rate is at
    /// least `min_opponent_rate`.
    Probe {
        interval_min: u32,
        interval_max: u32,
        min_opponent_rate: f64,
        window: usize,
    },
    /// Flag raised while the opponent is mostly defecting. Carries no
    /// override; the modulator applies its caution shift instead.
    Caution {
        window: usize,
        enter_below: f64,
        exit_above: f64,
    },
    /// Every `check_every` rounds, compare the score deficit with the last
    /// snapshot and defect for `length` rounds if it grew by at least
    /// `deficit_growth`.
    ScoreRecovery {
        check_every: u32,
        deficit_growth: u32,
        length: u32,
    },
}

fn one() -> u32 {
    1
}

/// Fieldless tag for a `ModeRule`, used in traces and decision reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    Retaliation,
    Exploit,
    PeaceOffering,
    Probe,
    Caution,
    ScoreRecovery,
}

impl ModeRule {
    pub fn kind(&self) -> ModeKind {
        match self {
            ModeRule::Retaliation { .. } => ModeKind::Retaliation,
            ModeRule::Exploit { .. } => ModeKind::Exploit,
            ModeRule::PeaceOffering { .. } => ModeKind::PeaceOffering,
            ModeRule::Probe { .. } => ModeKind::Probe,
            ModeRule::Caution { .. } => ModeKind::Caution,
            ModeRule::ScoreRecovery { .. } => ModeKind::ScoreRecovery,
        }
    }

    /// Action forced while the mode's counter is running.
    pub fn override_action(&self) -> Option<Action> {
        match self {
            ModeRule::Retaliation { .. }
            | ModeRule::Exploit { .. }
            | ModeRule::Probe { .. }
            | ModeRule::ScoreRecovery { .. } => Some(Action::Defect),
            ModeRule::PeaceOffering { .. } => Some(Action::Cooperate),
            ModeRule::Caution { .. } => None,
        }
    }
}

/// Countdown that never goes below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counter {
    remaining: u32,
}

impl Counter {
    pub fn arm(&mut self, rounds: u32) {
        self.remaining = rounds;
    }

    /// One round elapsed. A no-op at zero.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

/// Boolean mode state without decay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flag {
    set: bool,
}

impl Flag {
    pub fn set(&mut self) {
        self.set = true;
    }

    pub fn clear(&mut self) {
        self.set = false;
    }

    pub fn is_set(&self) -> bool {
        self.set
    }
}

/// Next scheduled probe and the interval that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeSchedule {
    pub next_round: u32,
    pub last_interval: u32,
}

/// Mutable state behind one declared mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSlot {
    pub counter: Counter,
    pub flag: Flag,
    /// Times the counter has been armed this match.
    pub activations: u32,
    pub probe: Option<ProbeSchedule>,
    /// Score deficit (opponent minus own) at the last recovery check.
    pub deficit_snapshot: i64,
}

impl ModeSlot {
    fn initial(rule: &ModeRule, phases: &PhaseConfig) -> Self {
        let probe = match *rule {
            ModeRule::Probe { interval_min, .. } => Some(ProbeSchedule {
                next_round: phases.opening_len.saturating_add(interval_min),
                last_interval: interval_min,
            }),
            _ => None,
        };
        Self {
            counter: Counter::default(),
            flag: Flag::default(),
            activations: 0,
            probe,
            deficit_snapshot: 0,
        }
    }
}

/// Mode states for one agent, parallel to its declared `ModeRule` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeBank {
    slots: Vec<ModeSlot>,
}

impl ModeBank {
    pub fn new(rules: &[ModeRule], phases: &PhaseConfig) -> Self {
        Self {
            slots: rules.iter().map(|r| ModeSlot::initial(r, phases)).collect(),
        }
    }

    pub fn slots(&self) -> &[ModeSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ModeSlot> {
        self.slots.get(index)
    }

    /// Arm counters and set flags whose trigger holds this round.
    pub fn evaluate_triggers(
        &mut self,
        rules: &[ModeRule],
        ctx: &RoundContext<'_>,
        phase: Phase,
        rng: &mut dyn RandomSource,
    ) {
        let opponent = ctx.ledger.moves(Side::Opponent);

        for (rule, slot) in rules.iter().zip(self.slots.iter_mut()) {
            match *rule {
                ModeRule::Retaliation {
                    after_defections,
                    length,
                    escalation,
                    lenient_above,
                    lenient_length,
                } => {
                    if slot.counter.is_active()
                        || after_defections == 0
                        || trailing_run(opponent, Action::Defect) < after_defections as usize
                    {
                        continue;
                    }
                    let overall = cooperation_rate(ctx.ledger, Window::Whole, Side::Opponent);
                    let rounds = match lenient_above {
                        Some(threshold) if overall > threshold => lenient_length,
                        _ => length.saturating_add(escalation.saturating_mul(slot.activations)),
                    };
                    arm(slot, rule.kind(), rounds, ctx.round);
                }
                ModeRule::Exploit { after_cooperations, length } => {
                    if !slot.counter.is_active()
                        && after_cooperations > 0
                        && trailing_run(opponent, Action::Cooperate) >= after_cooperations as usize
                    {
                        arm(slot, rule.kind(), length, ctx.round);
                    }
                }
                ModeRule::PeaceOffering { after_mutual_defections, length } => {
                    if !slot.counter.is_active()
                        && after_mutual_defections > 0
                        && mutual_run(ctx.ledger, Action::Defect) >= after_mutual_defections as usize
                    {
                        arm(slot, rule.kind(), length, ctx.round);
                    }
                }
                ModeRule::Probe {
                    interval_min,
                    interval_max,
                    min_opponent_rate,
                    window,
                } => {
                    let Some(schedule) = slot.probe else { continue };
                    if phase != Phase::Main
                        || slot.counter.is_active()
                        || ctx.round < schedule.next_round
                    {
                        continue;
                    }
                    let interval = rng.next_in_range(interval_min, interval_max);
                    slot.probe = Some(ProbeSchedule {
                        next_round: ctx.round.saturating_add(interval),
                        last_interval: interval,
                    });
                    let rate = cooperation_rate(ctx.ledger, Window::Last(window), Side::Opponent);
                    if rate >= min_opponent_rate {
                        arm(slot, rule.kind(), 1, ctx.round);
                    } else {
                        debug!(round = ctx.round, rate, next = ctx.round.saturating_add(interval), "probe deferred");
                    }
                }
                ModeRule::Caution { window, enter_below, .. } => {
                    if !slot.flag.is_set()
                        && ctx.ledger.len() >= window
                        && cooperation_rate(ctx.ledger, Window::Last(window), Side::Opponent)
                            < enter_below
                    {
                        slot.flag.set();
                        debug!(round = ctx.round, mode = ?rule.kind(), "flag set");
                    }
                }
                ModeRule::ScoreRecovery { check_every, deficit_growth, length } => {
                    if check_every == 0 || ctx.round == 0 || ctx.round % check_every != 0 {
                        continue;
                    }
                    let deficit = -ctx.scores.differential();
                    let growth = deficit - slot.deficit_snapshot;
                    slot.deficit_snapshot = deficit;
                    if !slot.counter.is_active() && growth >= deficit_growth as i64 {
                        arm(slot, rule.kind(), length, ctx.round);
                    }
                }
            }
        }
    }

    /// Highest-priority running override, as `(rule index, action)`.
    pub fn active_override(&self, rules: &[ModeRule]) -> Option<(usize, Action)> {
        rules
            .iter()
            .zip(self.slots.iter())
            .enumerate()
            .find_map(|(i, (rule, slot))| {
                if slot.counter.is_active() {
                    rule.override_action().map(|a| (i, a))
                } else {
                    None
                }
            })
    }

    /// Any caution flag currently raised.
    pub fn caution_active(&self, rules: &[ModeRule]) -> bool {
        rules
            .iter()
            .zip(self.slots.iter())
            .any(|(rule, slot)| rule.kind() == ModeKind::Caution && slot.flag.is_set())
    }

    /// Post-decision bookkeeping: tick every counter, clear exited flags.
    pub fn end_round(&mut self, rules: &[ModeRule], ctx: &RoundContext<'_>) {
        for (rule, slot) in rules.iter().zip(self.slots.iter_mut()) {
            slot.counter.tick();

            if let ModeRule::Caution { window, exit_above, .. } = *rule {
                if slot.flag.is_set()
                    && cooperation_rate(ctx.ledger, Window::Last(window), Side::Opponent) > exit_above
                {
                    slot.flag.clear();
                    debug!(round = ctx.round, mode = ?rule.kind(), "flag cleared");
                }
            }
        }
    }
}

fn arm(slot: &mut ModeSlot, kind: ModeKind, rounds: u32, round: u32) {
    if rounds == 0 {
        return;
    }
    slot.counter.arm(rounds);
    slot.activations += 1;
    debug!(round, mode = ?kind, rounds, activation = slot.activations, "mode armed");
}

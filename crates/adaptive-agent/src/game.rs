//! Reference match host
//!
//! A minimal engine around the agents: it owns one ledger per seat, hands
//! each player its own per-round random stream, collects both moves before
//! revealing either, scores the round and records it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::Agent;
use crate::classic::ClassicStrategy;
use crate::config::{AgentConfig, Disposition};
use crate::context::{RoundContext, ScoreState};
use crate::error::ConfigError;
use crate::ledger::{Action, HistoryLedger};
use crate::random::{RandomSource, SeededRng};

/// Payoff matrix for the Prisoner's Dilemma
/// Returns (score_a, score_b)
pub fn payoff(a: Action, b: Action) -> (u8, u8) {
    match (a, b) {
        (Action::Cooperate, Action::Cooperate) => (3, 3),
        (Action::Cooperate, Action::Defect) => (0, 5),
        (Action::Defect, Action::Cooperate) => (5, 0),
        (Action::Defect, Action::Defect) => (1, 1),
    }
}

/// Anything that can sit at the table.
pub trait Participant {
    fn name(&self) -> &str;

    fn decide(&mut self, ctx: &RoundContext<'_>, rng: &mut dyn RandomSource) -> Action;

    /// Forget everything from the previous match.
    fn reset(&mut self) {}
}

impl Participant for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    fn decide(&mut self, ctx: &RoundContext<'_>, rng: &mut dyn RandomSource) -> Action {
        Agent::decide(self, ctx, rng)
    }

    fn reset(&mut self) {
        Agent::reset(self)
    }
}

impl Participant for ClassicStrategy {
    fn name(&self) -> &str {
        match self {
            ClassicStrategy::TitForTat => "tit-for-tat",
            ClassicStrategy::AlwaysDefect => "always-defect",
            ClassicStrategy::AlwaysCooperate => "always-cooperate",
            ClassicStrategy::GrimTrigger => "grim-trigger",
            ClassicStrategy::Pavlov => "pavlov",
            ClassicStrategy::SuspiciousTitForTat => "suspicious-tit-for-tat",
            ClassicStrategy::Random { .. } => "random",
            ClassicStrategy::TitForTwoTats => "tit-for-two-tats",
            ClassicStrategy::Gradual => "gradual",
            ClassicStrategy::Alternator => "alternator",
            ClassicStrategy::Scripted(_) => "scripted",
        }
    }

    fn decide(&mut self, ctx: &RoundContext<'_>, rng: &mut dyn RandomSource) -> Action {
        ClassicStrategy::decide(self, ctx.ledger, rng)
    }
}

/// Serializable description of a seat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlayerSpec {
    Agent(AgentConfig),
    Preset { disposition: Disposition },
    Classic(ClassicStrategy),
}

impl PlayerSpec {
    /// Build a ready-to-play participant for a match of `horizon` rounds.
    ///
    /// An explicit agent configuration has its horizon replaced by the
    /// match's, since the host is the authority on match length.
    pub fn build(&self, horizon: u32) -> Result<Box<dyn Participant>, ConfigError> {
        Ok(match self {
            PlayerSpec::Agent(config) => {
                let config = AgentConfig { horizon, ..config.clone() };
                Box::new(Agent::initialize(config)?)
            }
            PlayerSpec::Preset { disposition } => {
                Box::new(Agent::initialize(AgentConfig::preset(*disposition, horizon))?)
            }
            PlayerSpec::Classic(strategy) => Box::new(strategy.clone()),
        })
    }
}

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    pub move_a: Action,
    pub move_b: Action,
    pub score_a: u8,
    pub score_b: u8,
    pub cumulative_a: u32,
    pub cumulative_b: u32,
}

/// Result of a complete match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rounds: Vec<RoundResult>,
    pub total_score_a: u32,
    pub total_score_b: u32,
    pub round_count: u32,
}

impl MatchResult {
    pub fn moves_a(&self) -> Vec<Action> {
        self.rounds.iter().map(|r| r.move_a).collect()
    }

    pub fn moves_b(&self) -> Vec<Action> {
        self.rounds.iter().map(|r| r.move_b).collect()
    }
}

/// Run a complete match between two participants
///
/// # Arguments
/// * `player_a` - First seat; reset before round 0
/// * `player_b` - Second seat; reset before round 0
/// * `horizon` - Number of rounds, known to both players in advance
/// * `seed` - Randomness seed
/// * `match_index` - Index of this match, mixed into the seed
///
/// # Returns
/// Complete match result with round-by-round details
pub fn run_match(
    player_a: &mut dyn Participant,
    player_b: &mut dyn Participant,
    horizon: u32,
    seed: &[u8; 32],
    match_index: u32,
) -> MatchResult {
    let rng = SeededRng::new(seed, match_index);

    player_a.reset();
    player_b.reset();

    let mut ledger_a = HistoryLedger::with_capacity(horizon as usize);
    let mut ledger_b = HistoryLedger::with_capacity(horizon as usize);
    let mut scores = ScoreState::default();
    let mut rounds = Vec::with_capacity(horizon as usize);

    for round in 0..horizon {
        // Separate streams so neither player can shift the other's draws
        let mut rng_a = rng.for_round(round.wrapping_mul(2));
        let mut rng_b = rng.for_round(round.wrapping_mul(2).wrapping_add(1));

        let move_a = player_a.decide(&RoundContext::new(round, &ledger_a, scores), &mut rng_a);
        let move_b = player_b.decide(&RoundContext::new(round, &ledger_b, scores.mirrored()), &mut rng_b);

        let (score_a, score_b) = payoff(move_a, move_b);
        scores.own += score_a as u32;
        scores.opponent += score_b as u32;

        ledger_a.record(move_a, move_b);
        ledger_b.record(move_b, move_a);

        rounds.push(RoundResult {
            round,
            move_a,
            move_b,
            score_a,
            score_b,
            cumulative_a: scores.own,
            cumulative_b: scores.opponent,
        });
    }

    debug!(
        a = player_a.name(),
        b = player_b.name(),
        horizon,
        match_index,
        total_a = scores.own,
        total_b = scores.opponent,
        "match finished"
    );

    MatchResult {
        rounds,
        total_score_a: scores.own,
        total_score_b: scores.opponent,
        round_count: horizon,
    }
}

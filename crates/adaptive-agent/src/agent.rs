//! Decision composer
//!
//! `Agent` is the per-match automaton. The host calls `initialize` once,
//! `decide` once per round, and `reset` between matches. Each round the
//! rules below are tried in fixed priority order until one produces an
//! action:
//!
//! 1. literal opening move (Opening phase, if the agent has an opener)
//! 2. endgame policy (Endgame phase, if the agent has one)
//! 3. running mode overrides, in declared order
//! 4. pending or newly detected pattern responses, in declared order
//! 5. modulated stochastic choice
//!
//! Mode triggers are evaluated before step 1 on every round and mode
//! counters tick after the action is chosen, whichever rule fired.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{AgentConfig, EndgamePolicy};
use crate::context::RoundContext;
use crate::error::ConfigError;
use crate::ledger::{Action, Side};
use crate::modes::{ModeBank, ModeKind};
use crate::modulator::{choose, ModulatorInput};
use crate::phase::{Phase, PhaseTracker};
use crate::random::RandomSource;

/// Which priority rule produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RuleFired {
    Opening,
    Endgame,
    Mode { index: usize, kind: ModeKind },
    /// Index of the pattern rule whose response is being played.
    Pattern { index: usize },
    Modulator,
}

/// One decision with the reasoning behind it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub round: u32,
    pub action: Action,
    pub rule: RuleFired,
    pub phase: Phase,
    /// Modulated cooperation probability, when the modulator was consulted.
    pub probability: Option<f64>,
}

/// A response sequence queued by a pattern rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PendingResponse {
    source: usize,
    moves: VecDeque<Action>,
}

/// Mutable per-match state. Owned by exactly one agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentState {
    pub phase: PhaseTracker,
    pub modes: ModeBank,
    pending: PendingResponse,
    pub last_decision: Option<Decision>,
}

impl AgentState {
    fn initial(config: &AgentConfig) -> Self {
        Self {
            phase: PhaseTracker::default(),
            modes: ModeBank::new(&config.modes, &config.phases),
            pending: PendingResponse::default(),
            last_decision: None,
        }
    }

    /// Moves still queued from a pattern response.
    pub fn pending_response(&self) -> impl Iterator<Item = &Action> {
        self.pending.moves.iter()
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    config: AgentConfig,
    state: AgentState,
}

impl Agent {
    /// Validate the configuration and build a fully populated state.
    pub fn initialize(config: AgentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = AgentState::initial(&config);
        debug!(
            agent = %config.name,
            disposition = ?config.disposition,
            horizon = config.horizon,
            modes = config.modes.len(),
            patterns = config.patterns.len(),
            "agent initialized"
        );
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Back to the state `initialize` produced, for the next match.
    pub fn reset(&mut self) {
        self.state = AgentState::initial(&self.config);
    }

    /// Choose this round's action.
    pub fn decide(&mut self, ctx: &RoundContext<'_>, rng: &mut dyn RandomSource) -> Action {
        self.decide_traced(ctx, rng).action
    }

    /// Choose this round's action and report which rule produced it.
    pub fn decide_traced(&mut self, ctx: &RoundContext<'_>, rng: &mut dyn RandomSource) -> Decision {
        let config = &self.config;
        let state = &mut self.state;

        let phase = state.phase.advance(&config.phases, ctx.round, config.horizon);
        state.modes.evaluate_triggers(&config.modes, ctx, phase, rng);

        let decision = if let Some(d) = Self::opening(config, ctx, phase) {
            d
        } else if let Some(d) = Self::endgame(config, ctx, phase, rng) {
            d
        } else if let Some(d) = Self::mode_override(config, state, ctx, phase) {
            d
        } else if let Some(d) = Self::pattern_response(config, state, ctx, phase) {
            d
        } else {
            Self::modulated(config, state, ctx, phase, rng)
        };

        state.modes.end_round(&config.modes, ctx);
        state.last_decision = Some(decision);

        trace!(
            agent = %config.name,
            round = ctx.round,
            ?phase,
            rule = ?decision.rule,
            action = ?decision.action,
            p = decision.probability,
            "decision"
        );
        decision
    }

    fn opening(config: &AgentConfig, ctx: &RoundContext<'_>, phase: Phase) -> Option<Decision> {
        if phase != Phase::Opening {
            return None;
        }
        let action = *config.opening.as_ref()?.get(ctx.round as usize)?;
        Some(fixed(ctx, phase, action, RuleFired::Opening))
    }

    fn endgame(
        config: &AgentConfig,
        ctx: &RoundContext<'_>,
        phase: Phase,
        rng: &mut dyn RandomSource,
    ) -> Option<Decision> {
        if phase != Phase::Endgame {
            return None;
        }
        let action = match config.endgame? {
            EndgamePolicy::AlwaysDefect => Action::Defect,
            EndgamePolicy::AlwaysCooperate => Action::Cooperate,
            EndgamePolicy::Mirror => ctx.ledger.last_or_cooperate(Side::Opponent),
            EndgamePolicy::Defect { probability } => {
                if rng.next_unit() < probability {
                    Action::Defect
                } else {
                    Action::Cooperate
                }
            }
        };
        Some(fixed(ctx, phase, action, RuleFired::Endgame))
    }

    fn mode_override(
        config: &AgentConfig,
        state: &AgentState,
        ctx: &RoundContext<'_>,
        phase: Phase,
    ) -> Option<Decision> {
        let (index, action) = state.modes.active_override(&config.modes)?;
        let kind = config.modes[index].kind();
        Some(fixed(ctx, phase, action, RuleFired::Mode { index, kind }))
    }

    fn pattern_response(
        config: &AgentConfig,
        state: &mut AgentState,
        ctx: &RoundContext<'_>,
        phase: Phase,
    ) -> Option<Decision> {
        if state.pending.moves.is_empty() {
            let (index, rule) = config
                .patterns
                .iter()
                .enumerate()
                .find(|(_, rule)| rule.pattern.detect(ctx.ledger))?;
            debug!(
                agent = %config.name,
                round = ctx.round,
                pattern = ?rule.pattern,
                moves = rule.response.len(),
                "pattern response loaded"
            );
            state.pending = PendingResponse {
                source: index,
                moves: rule.response.iter().copied().collect(),
            };
        }

        let index = state.pending.source;
        let action = state.pending.moves.pop_front()?;
        Some(fixed(ctx, phase, action, RuleFired::Pattern { index }))
    }

    fn modulated(
        config: &AgentConfig,
        state: &AgentState,
        ctx: &RoundContext<'_>,
        phase: Phase,
        rng: &mut dyn RandomSource,
    ) -> Decision {
        let input = ModulatorInput {
            phase,
            ledger: ctx.ledger,
            scores: ctx.scores,
            caution: state.modes.caution_active(&config.modes),
        };
        let p = config.modulator.probability(config.base_cooperation(), &input);
        Decision {
            round: ctx.round,
            action: choose(p, rng),
            rule: RuleFired::Modulator,
            phase,
            probability: Some(p),
        }
    }
}

fn fixed(ctx: &RoundContext<'_>, phase: Phase, action: Action, rule: RuleFired) -> Decision {
    Decision {
        round: ctx.round,
        action,
        rule,
        phase,
        probability: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Disposition;
    use crate::context::ScoreState;
    use crate::ledger::HistoryLedger;
    use crate::modes::ModeRule;
    use crate::patterns::{Pattern, PatternRule};
    use crate::phase::{EndgameSpan, PhaseConfig};
    use crate::presets;
    use crate::random::{ScriptedSource, SeededRng};
    use proptest::prelude::*;
    use Action::{Cooperate as C, Defect as D};

    /// Play `agent` against a fixed opponent move list, recording as a host would.
    fn play(agent: &mut Agent, opponent: &[Action], rng: &mut dyn RandomSource) -> Vec<Decision> {
        let mut ledger = HistoryLedger::new();
        let mut decisions = Vec::new();
        for (round, opp) in opponent.iter().enumerate() {
            let ctx = RoundContext::new(round as u32, &ledger, ScoreState::default());
            let decision = agent.decide_traced(&ctx, rng);
            ledger.record(decision.action, *opp);
            decisions.push(decision);
        }
        decisions
    }

    fn actions(decisions: &[Decision]) -> Vec<Action> {
        decisions.iter().map(|d| d.action).collect()
    }

    fn bare(horizon: u32) -> AgentConfig {
        AgentConfig {
            name: "bare".to_string(),
            disposition: Disposition::Neutral,
            horizon,
            phases: PhaseConfig { opening_len: 0, endgame: EndgameSpan::Rounds(0) },
            opening: None,
            endgame: None,
            modes: Vec::new(),
            patterns: Vec::new(),
            modulator: Default::default(),
        }
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut cfg = bare(100);
        cfg.horizon = 0;
        assert!(matches!(Agent::initialize(cfg), Err(ConfigError::ZeroHorizon)));
    }

    #[test]
    fn test_opening_sequence_is_literal() {
        let mut agent = Agent::initialize(presets::aggressive(100)).unwrap();
        let decisions = play(&mut agent, &[D, D], &mut ScriptedSource::constant(0.0));
        assert_eq!(actions(&decisions), vec![D, C]);
        assert!(decisions.iter().all(|d| d.rule == RuleFired::Opening));
    }

    #[test]
    fn test_endgame_policy_overrides_modes() {
        let mut cfg = bare(20);
        cfg.phases.endgame = EndgameSpan::Rounds(5);
        cfg.endgame = Some(EndgamePolicy::AlwaysCooperate);
        cfg.modes.push(ModeRule::Retaliation {
            after_defections: 1,
            length: 1,
            escalation: 0,
            lenient_above: None,
            lenient_length: 1,
        });
        let mut agent = Agent::initialize(cfg).unwrap();
        let decisions = play(&mut agent, &[D; 20], &mut ScriptedSource::constant(0.0));
        for d in &decisions[15..] {
            assert_eq!(d.rule, RuleFired::Endgame);
            assert_eq!(d.action, C);
        }
        assert!(matches!(decisions[10].rule, RuleFired::Mode { kind: ModeKind::Retaliation, .. }));
    }

    #[test]
    fn test_endgame_mirror() {
        let mut cfg = bare(4);
        cfg.phases.endgame = EndgameSpan::Rounds(3);
        cfg.endgame = Some(EndgamePolicy::Mirror);
        let mut agent = Agent::initialize(cfg).unwrap();
        let decisions = play(&mut agent, &[D, C, D, C], &mut ScriptedSource::constant(0.0));
        assert_eq!(actions(&decisions[1..]), vec![D, C, D]);
    }

    #[test]
    fn test_pattern_response_drains_before_redetecting() {
        let mut cfg = bare(30);
        cfg.patterns.push(PatternRule {
            pattern: Pattern::Alternation { window: 4 },
            response: vec![D, D, C],
        });
        let mut agent = Agent::initialize(cfg).unwrap();
        let opponent = [C, D, C, D, C, D, C, D];
        // draws of 0.0 make the modulator always cooperate
        let decisions = play(&mut agent, &opponent, &mut ScriptedSource::constant(0.0));

        assert_eq!(decisions[3].rule, RuleFired::Modulator);
        assert_eq!(actions(&decisions[4..7]), vec![D, D, C]);
        for d in &decisions[4..7] {
            assert_eq!(d.rule, RuleFired::Pattern { index: 0 });
        }
        // alternation still visible: reloaded
        assert_eq!(decisions[7].action, D);
        assert!(agent.state().pending_response().count() == 2);
    }

    #[test]
    fn test_mode_outranks_pattern() {
        let mut cfg = bare(30);
        cfg.modes.push(ModeRule::PeaceOffering { after_mutual_defections: 2, length: 1 });
        cfg.patterns.push(PatternRule {
            pattern: Pattern::Run { action: D, length: 2 },
            response: vec![D],
        });
        let mut agent = Agent::initialize(cfg).unwrap();
        let ledger = HistoryLedger::from_moves(&[D, D], &[D, D]);
        let ctx = RoundContext::next_round(&ledger, ScoreState::default());
        let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.9));
        assert_eq!(d.action, C);
        assert_eq!(d.rule, RuleFired::Mode { index: 0, kind: ModeKind::PeaceOffering });
    }

    #[test]
    fn test_modulator_reports_probability() {
        let mut agent = Agent::initialize(bare(10)).unwrap();
        let ledger = HistoryLedger::new();
        let ctx = RoundContext::next_round(&ledger, ScoreState::default());
        let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.99));
        assert_eq!(d.rule, RuleFired::Modulator);
        assert_eq!(d.probability, Some(0.55));
        assert_eq!(d.action, D);
    }

    #[test]
    fn test_caution_lowers_probability() {
        let mut cfg = bare(100);
        cfg.modes.push(ModeRule::Caution { window: 3, enter_below: 0.5, exit_above: 0.8 });
        cfg.modulator.short.penalty = 0.0;
        cfg.modulator.long.penalty = 0.0;
        cfg.modulator.caution = 0.1;
        let mut agent = Agent::initialize(cfg).unwrap();

        let ledger = HistoryLedger::from_moves(&[C; 3], &[D; 3]);
        let ctx = RoundContext::next_round(&ledger, ScoreState::default());
        let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.0));
        let p = d.probability.unwrap();
        assert!((p - 0.45).abs() < 1e-12, "p = {}", p);
    }

    #[test]
    fn test_tit_for_two_tats_against_defector() {
        let mut agent = Agent::initialize(presets::tit_for_two_tats(1000)).unwrap();
        let decisions = play(&mut agent, &[D; 6], &mut ScriptedSource::constant(0.5));

        assert_eq!(decisions[0].action, C);
        assert_eq!(decisions[1].action, C);
        assert_eq!(decisions[2].action, D);
        assert!(matches!(decisions[2].rule, RuleFired::Mode { kind: ModeKind::Retaliation, .. }));
        // each activation is a single round; the trigger is re-evaluated afterwards
        assert_eq!(agent.state().modes.slot(0).map(|s| s.counter.remaining()), Some(0));
        assert_eq!(agent.state().modes.slot(0).map(|s| s.activations), Some(4));
    }

    #[test]
    fn test_tit_for_two_tats_forgives_single_defection() {
        let mut agent = Agent::initialize(presets::tit_for_two_tats(1000)).unwrap();
        let opponent = [C, D, C, D, C, D, C, D];
        let decisions = play(&mut agent, &opponent, &mut ScriptedSource::constant(0.5));
        assert!(decisions.iter().all(|d| d.action == C));
    }

    #[test]
    fn test_aggressive_exploits_cooperator() {
        let mut agent = Agent::initialize(presets::aggressive(1000)).unwrap();
        let decisions = play(&mut agent, &[C; 1000], &mut SeededRng::from_u64(3));
        for d in &decisions[2..] {
            assert_eq!(d.action, D, "round {} via {:?}", d.round, d.rule);
        }
    }

    #[test]
    fn test_peace_offering_after_ten_mutual_defections() {
        let mut agent = Agent::initialize(presets::cooperative(1000)).unwrap();
        let ledger = HistoryLedger::from_moves(&[D; 10], &[D; 10]);
        let ctx = RoundContext::next_round(&ledger, ScoreState::new(10, 10));
        let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.99));
        assert_eq!(d.action, C);
        assert_eq!(d.rule, RuleFired::Mode { index: 0, kind: ModeKind::PeaceOffering });

        let mut agent = Agent::initialize(presets::cooperative(1000)).unwrap();
        let mut own = vec![C];
        own.extend([D; 9]);
        let ledger = HistoryLedger::from_moves(&own, &[D; 10]);
        let ctx = RoundContext::next_round(&ledger, ScoreState::new(9, 14));
        let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.99));
        assert_ne!(d.rule, RuleFired::Mode { index: 0, kind: ModeKind::PeaceOffering });
    }

    #[test]
    fn test_every_preset_peace_offering_fires_at_its_threshold() {
        let mut checked = 0;
        for config in presets::all(1000) {
            let Some((index, threshold)) = config.modes.iter().enumerate().find_map(|(i, rule)| match *rule {
                ModeRule::PeaceOffering { after_mutual_defections, .. } => Some((i, after_mutual_defections as usize)),
                _ => None,
            }) else {
                continue;
            };
            let peace = RuleFired::Mode { index, kind: ModeKind::PeaceOffering };

            let mut agent = Agent::initialize(config.clone()).unwrap();
            let ledger = HistoryLedger::from_moves(&vec![D; threshold], &vec![D; threshold]);
            let ctx = RoundContext::next_round(&ledger, ScoreState::new(threshold as u32, threshold as u32));
            let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.99));
            assert_eq!(d.rule, peace, "{} after {} mutual defections", config.name, threshold);
            assert_eq!(d.action, C);

            let mut agent = Agent::initialize(config.clone()).unwrap();
            let short = threshold - 1;
            let ledger = HistoryLedger::from_moves(&vec![D; short], &vec![D; short]);
            let ctx = RoundContext::next_round(&ledger, ScoreState::new(short as u32, short as u32));
            let d = agent.decide_traced(&ctx, &mut ScriptedSource::constant(0.99));
            assert_ne!(d.rule, peace, "{} fired one round early", config.name);

            checked += 1;
        }
        assert_eq!(checked, 2);
    }

    #[test]
    fn test_neutral_keeps_offering_peace_to_a_defector() {
        let mut agent = Agent::initialize(presets::neutral(900)).unwrap();
        let decisions = play(&mut agent, &[D; 900], &mut SeededRng::from_u64(7));
        let offers: Vec<u32> = decisions
            .iter()
            .filter(|d| matches!(d.rule, RuleFired::Mode { kind: ModeKind::PeaceOffering, .. }))
            .map(|d| d.round)
            .collect();
        // opener C, C, then six retaliations before the first offer
        assert_eq!(offers.first(), Some(&8));
        assert!(offers.len() > 100, "only {} offers", offers.len());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut agent = Agent::initialize(presets::neutral(200)).unwrap();
        let fresh = agent.state().clone();
        play(&mut agent, &[D; 50], &mut SeededRng::from_u64(11));
        assert_ne!(agent.state(), &fresh);
        agent.reset();
        assert_eq!(agent.state(), &fresh);
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![Just(C), Just(D)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_deterministic_given_draws(
            opponent in proptest::collection::vec(action(), 1..300),
            seed in any::<u64>(),
            preset in 0usize..4,
        ) {
            let horizon = opponent.len() as u32;
            let config = presets::all(horizon).swap_remove(preset);

            let mut first = Agent::initialize(config.clone()).unwrap();
            let mut second = Agent::initialize(config).unwrap();
            let a = play(&mut first, &opponent, &mut SeededRng::from_u64(seed));
            let b = play(&mut second, &opponent, &mut SeededRng::from_u64(seed));
            prop_assert_eq!(actions(&a), actions(&b));
        }

        #[test]
        fn prop_every_round_yields_an_action(
            opponent in proptest::collection::vec(action(), 1..200),
            seed in any::<u64>(),
            preset in 0usize..4,
        ) {
            let horizon = opponent.len() as u32;
            let config = presets::all(horizon).swap_remove(preset);
            let mut agent = Agent::initialize(config).unwrap();
            let decisions = play(&mut agent, &opponent, &mut SeededRng::from_u64(seed));
            prop_assert_eq!(decisions.len(), opponent.len());
            for (round, d) in decisions.iter().enumerate() {
                prop_assert_eq!(d.round, round as u32);
                if let Some(p) = d.probability {
                    let m = &agent.config().modulator;
                    prop_assert!(p >= m.min && p <= m.max);
                }
            }
        }
    }
}

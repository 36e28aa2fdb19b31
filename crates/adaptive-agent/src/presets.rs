//! Built-in agent configurations, one per disposition

use crate::config::{AgentConfig, Disposition, EndgamePolicy};
use crate::ledger::Action::{Cooperate as C, Defect as D};
use crate::modes::ModeRule;
use crate::modulator::{ModulatorConfig, PhaseShift, ScoreShift, WindowShift};
use crate::patterns::{Pattern, PatternRule};
use crate::phase::{EndgameSpan, PhaseConfig};
use crate::stats::{WINDOW_EXTENDED, WINDOW_LONG, WINDOW_MEDIUM, WINDOW_RECENT, WINDOW_SHORT};

/// Opens with a defection, exploits steady cooperators, punishes with
/// escalating streaks and defects through the final 5% of the match.
pub fn aggressive(horizon: u32) -> AgentConfig {
    AgentConfig {
        name: "aggressive".to_string(),
        disposition: Disposition::Aggressive,
        horizon,
        phases: PhaseConfig { opening_len: 2, endgame: EndgameSpan::Fraction(0.05) },
        opening: Some(vec![D, C]),
        endgame: Some(EndgamePolicy::AlwaysDefect),
        modes: vec![
            ModeRule::Retaliation {
                after_defections: 1,
                length: 2,
                escalation: 1,
                lenient_above: None,
                lenient_length: 1,
            },
            ModeRule::Exploit { after_cooperations: 2, length: 3 },
            ModeRule::ScoreRecovery { check_every: 10, deficit_growth: 8, length: 3 },
            ModeRule::Caution { window: WINDOW_RECENT, enter_below: 0.3, exit_above: 0.6 },
        ],
        patterns: vec![
            PatternRule { pattern: Pattern::Alternation { window: 4 }, response: vec![D, D] },
            PatternRule { pattern: Pattern::Mirroring { window: 4 }, response: vec![C] },
        ],
        modulator: ModulatorConfig {
            base: None,
            phase: PhaseShift { opening: 0.0, main: 0.0, endgame: -0.2 },
            short: WindowShift::new(WINDOW_RECENT, 0.8, 0.3, 0.05, 0.15),
            long: WindowShift::new(WINDOW_LONG, 0.8, 0.3, 0.02, 0.05),
            score: ScoreShift { margin: 10, leading: -0.05, trailing: 0.05 },
            caution: 0.05,
            min: 0.05,
            max: 0.7,
            ..ModulatorConfig::default()
        },
    }
}

/// Cooperates by default, forgives sustained mutual defection and only
/// retaliates after two defections in a row.
pub fn cooperative(horizon: u32) -> AgentConfig {
    AgentConfig {
        name: "cooperative".to_string(),
        disposition: Disposition::Cooperative,
        horizon,
        phases: PhaseConfig { opening_len: 1, endgame: EndgameSpan::Rounds(10) },
        opening: Some(vec![C]),
        endgame: Some(EndgamePolicy::Mirror),
        modes: vec![
            ModeRule::PeaceOffering { after_mutual_defections: 10, length: 2 },
            ModeRule::Retaliation {
                after_defections: 2,
                length: 2,
                escalation: 0,
                lenient_above: Some(0.85),
                lenient_length: 1,
            },
            ModeRule::Caution { window: WINDOW_MEDIUM, enter_below: 0.25, exit_above: 0.5 },
        ],
        patterns: vec![
            PatternRule { pattern: Pattern::Alternation { window: 6 }, response: vec![D] },
        ],
        modulator: ModulatorConfig {
            base: None,
            phase: PhaseShift { opening: 0.0, main: 0.0, endgame: -0.05 },
            short: WindowShift::new(WINDOW_RECENT, 0.7, 0.3, 0.1, 0.2),
            long: WindowShift::new(WINDOW_EXTENDED, 0.7, 0.3, 0.05, 0.1),
            score: ScoreShift { margin: 15, leading: 0.05, trailing: -0.1 },
            caution: 0.05,
            min: 0.6,
            max: 0.95,
            ..ModulatorConfig::default()
        },
    }
}

/// Balanced play: tit-for-tat style retaliation, periodic probes of
/// cooperative opponents and a coin-flip endgame.
pub fn neutral(horizon: u32) -> AgentConfig {
    AgentConfig {
        name: "neutral".to_string(),
        disposition: Disposition::Neutral,
        horizon,
        phases: PhaseConfig { opening_len: 2, endgame: EndgameSpan::Fraction(0.02) },
        opening: Some(vec![C, C]),
        endgame: Some(EndgamePolicy::Defect { probability: 0.5 }),
        modes: vec![
            // ahead of retaliation: a mutual-defection run always ends on an opponent defection
            ModeRule::PeaceOffering { after_mutual_defections: 6, length: 1 },
            ModeRule::Retaliation {
                after_defections: 1,
                length: 1,
                escalation: 0,
                lenient_above: Some(0.8),
                lenient_length: 1,
            },
            ModeRule::Probe {
                interval_min: 15,
                interval_max: 30,
                min_opponent_rate: 0.8,
                window: WINDOW_SHORT,
            },
            ModeRule::Caution { window: WINDOW_RECENT, enter_below: 0.3, exit_above: 0.6 },
            ModeRule::ScoreRecovery { check_every: 20, deficit_growth: 15, length: 2 },
        ],
        patterns: vec![
            PatternRule { pattern: Pattern::Alternation { window: 4 }, response: vec![D] },
            PatternRule { pattern: Pattern::Mirroring { window: 5 }, response: vec![C, C] },
        ],
        modulator: ModulatorConfig {
            base: None,
            phase: PhaseShift { opening: 0.0, main: 0.0, endgame: -0.1 },
            short: WindowShift::new(WINDOW_RECENT, 0.7, 0.3, 0.1, 0.1),
            long: WindowShift::new(WINDOW_LONG, 0.7, 0.3, 0.05, 0.05),
            score: ScoreShift { margin: 10, leading: 0.0, trailing: -0.05 },
            caution: 0.05,
            min: 0.1,
            max: 0.9,
            ..ModulatorConfig::default()
        },
    }
}

/// Cooperative variant that tolerates single defections: it answers two
/// defections in a row with exactly one defection, then re-evaluates.
pub fn tit_for_two_tats(horizon: u32) -> AgentConfig {
    AgentConfig {
        name: "tit-for-two-tats".to_string(),
        disposition: Disposition::Cooperative,
        horizon,
        phases: PhaseConfig { opening_len: 1, endgame: EndgameSpan::Rounds(0) },
        opening: Some(vec![C]),
        endgame: None,
        modes: vec![ModeRule::Retaliation {
            after_defections: 2,
            length: 1,
            escalation: 0,
            lenient_above: None,
            lenient_length: 1,
        }],
        patterns: Vec::new(),
        modulator: ModulatorConfig {
            base: Some(0.9),
            short: WindowShift::new(WINDOW_RECENT, 0.7, 0.3, 0.05, 0.1),
            long: WindowShift::new(WINDOW_LONG, 0.7, 0.3, 0.0, 0.0),
            caution: 0.0,
            min: 0.6,
            max: 1.0,
            ..ModulatorConfig::default()
        },
    }
}

/// Every built-in configuration for a horizon, by name.
pub fn all(horizon: u32) -> Vec<AgentConfig> {
    vec![
        aggressive(horizon),
        cooperative(horizon),
        neutral(horizon),
        tit_for_two_tats(horizon),
    ]
}

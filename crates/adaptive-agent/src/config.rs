//! Agent configuration
//!
//! One generic automaton, many configurations: each agent variant is an
//! `AgentConfig` value. Configurations are validated once, at
//! construction, and never change during play.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ledger::Action;
use crate::modes::ModeRule;
use crate::modulator::{ModulatorConfig, WindowShift};
use crate::patterns::{Pattern, PatternRule};
use crate::phase::{EndgameSpan, PhaseConfig};
use crate::presets;

/// Named profile biasing default behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    Aggressive,
    Cooperative,
    Neutral,
}

impl Disposition {
    pub const ALL: [Disposition; 3] = [
        Disposition::Aggressive,
        Disposition::Cooperative,
        Disposition::Neutral,
    ];

    /// Starting cooperation probability when the modulator sets none.
    pub fn base_cooperation(self) -> f64 {
        match self {
            Disposition::Aggressive => 0.35,
            Disposition::Cooperative => 0.8,
            Disposition::Neutral => 0.55,
        }
    }
}

/// Fixed or near-fixed play once the Endgame is reached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EndgamePolicy {
    AlwaysDefect,
    AlwaysCooperate,
    /// Copy the opponent's previous move.
    Mirror,
    /// Defect with the given probability, otherwise cooperate.
    Defect { probability: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub disposition: Disposition,
    /// Total rounds in the match.
    pub horizon: u32,
    #[serde(default)]
    pub phases: PhaseConfig,
    /// Literal moves for the Opening phase, one per opening round.
    #[serde(default)]
    pub opening: Option<Vec<Action>>,
    #[serde(default)]
    pub endgame: Option<EndgamePolicy>,
    /// Mode rules, highest priority first.
    #[serde(default)]
    pub modes: Vec<ModeRule>,
    /// Pattern responses, highest priority first.
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
    #[serde(default)]
    pub modulator: ModulatorConfig,
}

impl AgentConfig {
    /// Built-in configuration for a disposition.
    pub fn preset(disposition: Disposition, horizon: u32) -> Self {
        match disposition {
            Disposition::Aggressive => presets::aggressive(horizon),
            Disposition::Cooperative => presets::cooperative(horizon),
            Disposition::Neutral => presets::neutral(horizon),
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Starting probability for the modulator.
    pub fn base_cooperation(&self) -> f64 {
        self.modulator
            .base
            .unwrap_or_else(|| self.disposition.base_cooperation())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }

        if let Some(opening) = &self.opening {
            if self.phases.opening_reachable(self.horizon)
                && opening.len() < self.phases.opening_len as usize
            {
                return Err(ConfigError::ShortOpening {
                    required: self.phases.opening_len,
                    provided: opening.len(),
                });
            }
        }
        if let EndgameSpan::Fraction(f) = self.phases.endgame {
            check_probability("endgame fraction", f)?;
        }
        if let Some(EndgamePolicy::Defect { probability }) = self.endgame {
            check_probability("endgame defect probability", probability)?;
        }

        for (index, rule) in self.modes.iter().enumerate() {
            validate_mode(index, rule)?;
        }
        for (index, rule) in self.patterns.iter().enumerate() {
            if rule.response.is_empty() {
                return Err(ConfigError::EmptyResponse { index });
            }
            let window = match rule.pattern {
                Pattern::Run { length, .. } => length,
                Pattern::Alternation { window } => window.saturating_sub(1),
                Pattern::Mirroring { window } => window,
            };
            if window == 0 {
                return Err(ConfigError::EmptyPattern { index });
            }
        }

        validate_modulator(&self.modulator)
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteShift { name, value })
    }
}

fn check_window(name: &'static str, window: usize) -> Result<(), ConfigError> {
    if window == 0 {
        Err(ConfigError::EmptyWindow { name })
    } else {
        Ok(())
    }
}

fn check_duration(index: usize, mode: &'static str, field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroDuration { index, mode, field })
    } else {
        Ok(())
    }
}

fn validate_mode(index: usize, rule: &ModeRule) -> Result<(), ConfigError> {
    match *rule {
        ModeRule::Retaliation {
            after_defections,
            length,
            lenient_above,
            lenient_length,
            ..
        } => {
            check_duration(index, "retaliation", "trigger", after_defections)?;
            check_duration(index, "retaliation", "length", length)?;
            if let Some(threshold) = lenient_above {
                check_probability("retaliation lenient_above", threshold)?;
                check_duration(index, "retaliation", "lenient length", lenient_length)?;
            }
        }
        ModeRule::Exploit { after_cooperations, length } => {
            check_duration(index, "exploit", "trigger", after_cooperations)?;
            check_duration(index, "exploit", "length", length)?;
        }
        ModeRule::PeaceOffering { after_mutual_defections, length } => {
            check_duration(index, "peace offering", "trigger", after_mutual_defections)?;
            check_duration(index, "peace offering", "length", length)?;
        }
        ModeRule::Probe {
            interval_min,
            interval_max,
            min_opponent_rate,
            window,
        } => {
            if interval_min == 0 || interval_min > interval_max {
                return Err(ConfigError::InvalidInterval {
                    min: interval_min,
                    max: interval_max,
                });
            }
            check_probability("probe min_opponent_rate", min_opponent_rate)?;
            check_window("probe", window)?;
        }
        ModeRule::Caution { window, enter_below, exit_above } => {
            check_window("caution", window)?;
            check_probability("caution enter_below", enter_below)?;
            check_probability("caution exit_above", exit_above)?;
            if exit_above < enter_below {
                return Err(ConfigError::InvertedHysteresis { index, enter_below, exit_above });
            }
        }
        ModeRule::ScoreRecovery { check_every, length, .. } => {
            check_duration(index, "score recovery", "check interval", check_every)?;
            check_duration(index, "score recovery", "length", length)?;
        }
    }
    Ok(())
}

fn validate_window_shift(name: &'static str, shift: &WindowShift) -> Result<(), ConfigError> {
    check_window(name, shift.window)?;
    check_probability(name, shift.high)?;
    check_probability(name, shift.low)?;
    check_finite(name, shift.reward)?;
    check_finite(name, shift.penalty)?;
    if shift.low > shift.high {
        return Err(ConfigError::InvertedThresholds { low: shift.low, high: shift.high });
    }
    Ok(())
}

fn validate_modulator(m: &ModulatorConfig) -> Result<(), ConfigError> {
    check_probability("modulator min", m.min)?;
    check_probability("modulator max", m.max)?;
    if m.min > m.max {
        return Err(ConfigError::InvertedClamp { min: m.min, max: m.max });
    }
    if let Some(base) = m.base {
        check_probability("modulator base", base)?;
    }
    check_finite("phase opening", m.phase.opening)?;
    check_finite("phase main", m.phase.main)?;
    check_finite("phase endgame", m.phase.endgame)?;
    check_finite("score leading", m.score.leading)?;
    check_finite("score trailing", m.score.trailing)?;
    check_finite("caution", m.caution)?;
    validate_window_shift("short window", &m.short)?;
    validate_window_shift("long window", &m.long)?;

    for (i, adjustment) in m.order.iter().enumerate() {
        if m.order[..i].contains(adjustment) {
            return Err(ConfigError::DuplicateAdjustment(*adjustment));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulator::Adjustment;

    fn minimal() -> AgentConfig {
        AgentConfig {
            name: "minimal".to_string(),
            disposition: Disposition::Neutral,
            horizon: 100,
            phases: PhaseConfig { opening_len: 2, endgame: EndgameSpan::Rounds(5) },
            opening: None,
            endgame: None,
            modes: Vec::new(),
            patterns: Vec::new(),
            modulator: ModulatorConfig::default(),
        }
    }

    #[test]
    fn test_minimal_is_valid() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for d in Disposition::ALL {
            let cfg = AgentConfig::preset(d, 1000);
            assert!(cfg.validate().is_ok(), "{:?} preset invalid", d);
            assert_eq!(cfg.disposition, d);
        }
    }

    #[test]
    fn test_zero_horizon() {
        let mut cfg = minimal();
        cfg.horizon = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroHorizon)));
    }

    #[test]
    fn test_empty_opening_with_reachable_phase() {
        let mut cfg = minimal();
        cfg.opening = Some(Vec::new());
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ShortOpening { required: 2, provided: 0 })
        ));
    }

    #[test]
    fn test_empty_opening_without_opening_phase() {
        let mut cfg = minimal();
        cfg.phases.opening_len = 0;
        cfg.opening = Some(Vec::new());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_inverted_clamp() {
        let mut cfg = minimal();
        cfg.modulator.min = 0.9;
        cfg.modulator.max = 0.1;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvertedClamp { .. })));
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut cfg = minimal();
        cfg.modulator.max = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ProbabilityOutOfRange { name: "modulator max", .. })
        ));

        let mut cfg = minimal();
        cfg.endgame = Some(EndgamePolicy::Defect { probability: -0.1 });
        assert!(matches!(cfg.validate(), Err(ConfigError::ProbabilityOutOfRange { .. })));
    }

    #[test]
    fn test_zero_window() {
        let mut cfg = minimal();
        cfg.modulator.short.window = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyWindow { name: "short window" })));
    }

    #[test]
    fn test_zero_length_mode() {
        let mut cfg = minimal();
        cfg.modes.push(ModeRule::Exploit { after_cooperations: 2, length: 0 });
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration { index: 0, field: "length", .. })
        ));
    }

    #[test]
    fn test_inverted_probe_interval() {
        let mut cfg = minimal();
        cfg.modes.push(ModeRule::Probe {
            interval_min: 20,
            interval_max: 10,
            min_opponent_rate: 0.5,
            window: 10,
        });
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidInterval { min: 20, max: 10 })));
    }

    #[test]
    fn test_inverted_caution_hysteresis() {
        let mut cfg = minimal();
        cfg.modes.push(ModeRule::Caution { window: 10, enter_below: 0.5, exit_above: 0.3 });
        assert!(matches!(cfg.validate(), Err(ConfigError::InvertedHysteresis { index: 0, .. })));
    }

    #[test]
    fn test_empty_pattern_response() {
        let mut cfg = minimal();
        cfg.patterns.push(PatternRule {
            pattern: Pattern::Alternation { window: 4 },
            response: Vec::new(),
        });
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyResponse { index: 0 })));
    }

    #[test]
    fn test_non_finite_shift() {
        let mut cfg = AgentConfig::preset(Disposition::Neutral, 1000);
        cfg.modulator.phase.main = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFiniteShift { name: "phase main", .. })
        ));

        let mut cfg = minimal();
        cfg.modulator.long.penalty = f64::INFINITY;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFiniteShift { name: "long window", .. })
        ));

        let mut cfg = minimal();
        cfg.modulator.caution = f64::NEG_INFINITY;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFiniteShift { name: "caution", .. })));

        let mut cfg = minimal();
        cfg.modulator.score.trailing = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_adjustment() {
        let mut cfg = minimal();
        cfg.modulator.order = vec![Adjustment::Score, Adjustment::Phase, Adjustment::Score];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DuplicateAdjustment(Adjustment::Score))
        ));
    }

    #[test]
    fn test_json_round_trip_and_defaults() {
        let cfg = AgentConfig::preset(Disposition::Aggressive, 500);
        let json = cfg.to_json().expect("serialize");
        let back = AgentConfig::from_json(&json).expect("parse");
        assert_eq!(back, cfg);

        let sparse = r#"{
            "name": "sparse",
            "disposition": "Cooperative",
            "horizon": 200,
            "modes": [
                { "Retaliation": { "after_defections": 2, "length": 1 } }
            ]
        }"#;
        let cfg = AgentConfig::from_json(sparse).expect("sparse config");
        assert_eq!(cfg.phases, PhaseConfig::default());
        assert_eq!(cfg.base_cooperation(), 0.8);
        assert_eq!(
            cfg.modes[0],
            ModeRule::Retaliation {
                after_defections: 2,
                length: 1,
                escalation: 0,
                lenient_above: None,
                lenient_length: 1,
            }
        );
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        let bad = r#"{ "name": "bad", "disposition": "Neutral", "horizon": 0 }"#;
        assert!(matches!(AgentConfig::from_json(bad), Err(ConfigError::ZeroHorizon)));
        assert!(matches!(AgentConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}

//! Adaptive Agent
//!
//! A configurable decision automaton for iterated two-choice games.
//! Each round the agent looks at the shared move history and score, runs
//! a fixed priority chain (opening script, endgame policy, behavioral
//! modes, pattern responses, then a modulated coin flip) and answers with
//! cooperate or defect.
//!
//! This crate is compiled to:
//! - Native (for hosts and simulations)
//! - WASM (for frontend match replay)

mod agent;
mod classic;
mod config;
mod context;
mod error;
mod game;
mod ledger;
mod modes;
mod modulator;
mod patterns;
mod phase;
pub mod presets;
mod random;
mod stats;

#[cfg(feature = "wasm")]
mod wasm;

pub use agent::{Agent, AgentState, Decision, RuleFired};
pub use classic::ClassicStrategy;
pub use config::{AgentConfig, Disposition, EndgamePolicy};
pub use context::{RoundContext, ScoreState};
pub use error::ConfigError;
pub use game::{payoff, run_match, MatchResult, Participant, PlayerSpec, RoundResult};
pub use ledger::{Action, HistoryLedger, Side};
pub use modes::{Counter, Flag, ModeBank, ModeKind, ModeRule, ModeSlot, ProbeSchedule};
pub use modulator::{choose, Adjustment, ClampMode, ModulatorConfig, ModulatorInput, PhaseShift, ScoreShift, WindowShift};
pub use patterns::{Pattern, PatternRule};
pub use phase::{EndgameSpan, Phase, PhaseConfig, PhaseTracker};
pub use random::{Draw, RandomSource, RecordingSource, ScriptedSource, SeededRng};
pub use stats::{
    cooperation_rate, defection_rate, window_stat, Window, WindowStat, NEUTRAL_RATE, WINDOW_EXTENDED, WINDOW_LONG,
    WINDOW_MEDIUM, WINDOW_RECENT, WINDOW_SHORT,
};

//! Per-round input supplied by the host

use serde::{Deserialize, Serialize};
use crate::ledger::HistoryLedger;

/// Running totals, maintained by the host from its payoff table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub own: u32,
    pub opponent: u32,
}

impl ScoreState {
    pub fn new(own: u32, opponent: u32) -> Self {
        Self { own, opponent }
    }

    /// Positive when we lead.
    pub fn differential(&self) -> i64 {
        self.own as i64 - self.opponent as i64
    }

    pub fn mirrored(&self) -> Self {
        Self { own: self.opponent, opponent: self.own }
    }
}

/// Everything an agent may read when deciding a round.
#[derive(Clone, Copy, Debug)]
pub struct RoundContext<'a> {
    /// 0-based index of the round being decided.
    pub round: u32,
    pub ledger: &'a HistoryLedger,
    pub scores: ScoreState,
}

impl<'a> RoundContext<'a> {
    pub fn new(round: u32, ledger: &'a HistoryLedger, scores: ScoreState) -> Self {
        Self { round, ledger, scores }
    }

    /// Context for the round that follows everything in `ledger`.
    pub fn next_round(ledger: &'a HistoryLedger, scores: ScoreState) -> Self {
        Self::new(ledger.len() as u32, ledger, scores)
    }
}

//! Stateless pattern detectors over a short trailing window
//!
//! Detectors are recomputed from the ledger every round; nothing is
//! accumulated here.

use serde::{Deserialize, Serialize};
use crate::ledger::{Action, HistoryLedger, Side};

/// A recognizable shape in recent history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// Opponent played `action` on each of its last `length` moves.
    Run { action: Action, length: usize },
    /// Opponent's last `window` moves strictly alternate.
    Alternation { window: usize },
    /// For each of the last `window` rounds the opponent repeated our move
    /// from the round before (tit-for-tat signature).
    Mirroring { window: usize },
}

impl Pattern {
    pub fn detect(&self, ledger: &HistoryLedger) -> bool {
        match *self {
            Pattern::Run { action, length } => {
                length > 0 && trailing_run(ledger.moves(Side::Opponent), action) >= length
            }
            Pattern::Alternation { window } => {
                window >= 2
                    && ledger.len() >= window
                    && is_alternating(ledger.suffix(window, Side::Opponent))
            }
            Pattern::Mirroring { window } => is_mirroring(ledger, window),
        }
    }

    /// Smallest window the detector looks at.
    pub fn span(&self) -> usize {
        match *self {
            Pattern::Run { length, .. } => length,
            Pattern::Alternation { window } => window,
            Pattern::Mirroring { window } => window + 1,
        }
    }
}

/// A detector and the literal sequence played once it fires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: Pattern,
    pub response: Vec<Action>,
}

/// Length of the run of `action` at the end of `moves`.
pub fn trailing_run(moves: &[Action], action: Action) -> usize {
    moves.iter().rev().take_while(|m| **m == action).count()
}

/// Number of most recent rounds in which both players played `action`.
pub fn mutual_run(ledger: &HistoryLedger, action: Action) -> usize {
    ledger
        .moves(Side::Own)
        .iter()
        .rev()
        .zip(ledger.moves(Side::Opponent).iter().rev())
        .take_while(|(own, opp)| **own == action && **opp == action)
        .count()
}

/// True if every adjacent pair differs. Fewer than two moves never alternate.
pub fn is_alternating(moves: &[Action]) -> bool {
    moves.len() >= 2 && moves.windows(2).all(|w| w[0] != w[1])
}

/// Opponent copied our previous move for each of the last `window` rounds.
///
/// Our own moves over the compared span must not be constant: against a
/// player who never changes, every responsive opponent looks like a mirror.
pub fn is_mirroring(ledger: &HistoryLedger, window: usize) -> bool {
    if window == 0 || ledger.len() < window + 1 {
        return false;
    }
    let own = ledger.suffix(window + 1, Side::Own);
    let opp = ledger.suffix(window, Side::Opponent);

    let copied = own.iter().zip(opp.iter()).all(|(mine, theirs)| mine == theirs);
    let informative = own[..window].windows(2).any(|w| w[0] != w[1]);
    copied && informative
}

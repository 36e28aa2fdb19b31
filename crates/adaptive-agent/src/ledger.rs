//! Round history

use serde::{Deserialize, Serialize};

/// A move in a two-choice round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Cooperate,
    Defect,
}

impl Action {
    pub fn flipped(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
        }
    }

    pub fn is_cooperate(self) -> bool {
        self == Action::Cooperate
    }
}

/// Which half of the ledger a read refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Own,
    Opponent,
}

/// Append-only record of both players' past moves, seen from one player.
///
/// Both sequences always have the same length: `record` is the only
/// mutator and appends to both at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLedger {
    own: Vec<Action>,
    opponent: Vec<Action>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rounds: usize) -> Self {
        Self {
            own: Vec::with_capacity(rounds),
            opponent: Vec::with_capacity(rounds),
        }
    }

    /// Build a ledger from two equal-length move lists. Extra moves on the
    /// longer side are dropped so the equal-length invariant holds.
    pub fn from_moves(own: &[Action], opponent: &[Action]) -> Self {
        let n = own.len().min(opponent.len());
        Self {
            own: own[..n].to_vec(),
            opponent: opponent[..n].to_vec(),
        }
    }

    /// Append one completed round.
    pub fn record(&mut self, own: Action, opponent: Action) {
        self.own.push(own);
        self.opponent.push(opponent);
    }

    /// Number of completed rounds.
    pub fn len(&self) -> usize {
        self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }

    /// Full sequence for one side, in round order.
    pub fn moves(&self, of: Side) -> &[Action] {
        match of {
            Side::Own => &self.own,
            Side::Opponent => &self.opponent,
        }
    }

    /// The last `min(n, len)` moves of one side, in original order.
    pub fn suffix(&self, n: usize, of: Side) -> &[Action] {
        let moves = self.moves(of);
        &moves[moves.len() - n.min(moves.len())..]
    }

    pub fn last(&self, of: Side) -> Option<Action> {
        self.moves(of).last().copied()
    }

    /// Last move, assuming cooperation when nothing has been played.
    pub fn last_or_cooperate(&self, of: Side) -> Action {
        self.last(of).unwrap_or(Action::Cooperate)
    }

    /// The same history seen from the other seat.
    pub fn mirrored(&self) -> Self {
        Self {
            own: self.opponent.clone(),
            opponent: self.own.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::{Cooperate as C, Defect as D};

    #[test]
    fn test_empty_ledger() {
        let ledger = HistoryLedger::new();
        assert_eq!(ledger.len(), 0);
        assert!(ledger.suffix(5, Side::Own).is_empty());
        assert_eq!(ledger.last(Side::Opponent), None);
        assert_eq!(ledger.last_or_cooperate(Side::Opponent), C);
    }

    #[test]
    fn test_record_keeps_sides_aligned() {
        let mut ledger = HistoryLedger::new();
        ledger.record(C, D);
        ledger.record(D, D);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.moves(Side::Own), &[C, D]);
        assert_eq!(ledger.moves(Side::Opponent), &[D, D]);
    }

    #[test]
    fn test_suffix_shorter_than_history() {
        let ledger = HistoryLedger::from_moves(&[C, C, D, D, C], &[D, C, C, D, D]);
        assert_eq!(ledger.suffix(2, Side::Own), &[D, C]);
        assert_eq!(ledger.suffix(3, Side::Opponent), &[C, D, D]);
    }

    #[test]
    fn test_suffix_longer_than_history() {
        let ledger = HistoryLedger::from_moves(&[C, D], &[D, D]);
        assert_eq!(ledger.suffix(10, Side::Own), &[C, D]);
        assert!(ledger.suffix(0, Side::Own).is_empty());
    }

    #[test]
    fn test_from_moves_truncates_to_shorter_side() {
        let ledger = HistoryLedger::from_moves(&[C, D, D], &[C]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.moves(Side::Own), &[C]);
    }

    #[test]
    fn test_mirrored_swaps_sides() {
        let ledger = HistoryLedger::from_moves(&[C, D], &[D, D]);
        let seen_by_other = ledger.mirrored();
        assert_eq!(seen_by_other.moves(Side::Own), &[D, D]);
        assert_eq!(seen_by_other.moves(Side::Opponent), &[C, D]);
    }

    #[test]
    fn test_action_flip() {
        assert_eq!(C.flipped(), D);
        assert_eq!(D.flipped(), C);
    }
}

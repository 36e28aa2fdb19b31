//! Classic fixed strategies used as reference opponents

use serde::{Deserialize, Serialize};

use crate::game::payoff;
use crate::ledger::{Action, HistoryLedger, Side};
use crate::random::RandomSource;

/// Stateless textbook strategies. Everything they need is in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClassicStrategy {
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Cooperate until opponent defects once, then always defect.
    GrimTrigger,
    /// Win-stay, lose-switch. Repeat move if good outcome.
    Pavlov,
    /// Tit-for-Tat but start with defect.
    SuspiciousTitForTat,
    /// Cooperate with probability `cooperate_bias` each round.
    Random { cooperate_bias: f64 },
    /// Defect only if opponent defected twice in a row.
    TitForTwoTats,
    /// Retaliate with increasing defection streaks, then forgive.
    Gradual,
    /// Cooperate, defect, cooperate, ...
    Alternator,
    /// Play a literal move list, cycling when it runs out.
    Scripted(Vec<Action>),
}

impl ClassicStrategy {
    pub fn decide(&self, ledger: &HistoryLedger, rng: &mut dyn RandomSource) -> Action {
        let opponent = ledger.moves(Side::Opponent);
        let own = ledger.moves(Side::Own);

        match self {
            ClassicStrategy::TitForTat => ledger.last_or_cooperate(Side::Opponent),
            ClassicStrategy::AlwaysDefect => Action::Defect,
            ClassicStrategy::AlwaysCooperate => Action::Cooperate,
            ClassicStrategy::GrimTrigger => {
                if opponent.contains(&Action::Defect) {
                    Action::Defect
                } else {
                    Action::Cooperate
                }
            }
            ClassicStrategy::Pavlov => pavlov(ledger),
            ClassicStrategy::SuspiciousTitForTat => ledger.last(Side::Opponent).unwrap_or(Action::Defect),
            ClassicStrategy::Random { cooperate_bias } => {
                if rng.next_unit() < *cooperate_bias {
                    Action::Cooperate
                } else {
                    Action::Defect
                }
            }
            ClassicStrategy::TitForTwoTats => {
                if opponent.len() >= 2 && opponent[opponent.len() - 2..] == [Action::Defect, Action::Defect] {
                    Action::Defect
                } else {
                    Action::Cooperate
                }
            }
            ClassicStrategy::Gradual => gradual(opponent, own),
            ClassicStrategy::Alternator => {
                if ledger.len() % 2 == 0 {
                    Action::Cooperate
                } else {
                    Action::Defect
                }
            }
            ClassicStrategy::Scripted(moves) => {
                if moves.is_empty() {
                    Action::Cooperate
                } else {
                    moves[ledger.len() % moves.len()]
                }
            }
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> &'static str {
        match self {
            ClassicStrategy::TitForTat => "Copies opponent's last move. Starts by cooperating.",
            ClassicStrategy::AlwaysDefect => "Never cooperates. Always defects.",
            ClassicStrategy::AlwaysCooperate => "Never defects. Always cooperates.",
            ClassicStrategy::GrimTrigger => "Cooperates until betrayed, then always defects.",
            ClassicStrategy::Pavlov => "Repeats move if outcome was good, switches if bad.",
            ClassicStrategy::SuspiciousTitForTat => "Like Tit-for-Tat, but starts with defect.",
            ClassicStrategy::Random { .. } => "Randomly cooperates or defects each round.",
            ClassicStrategy::TitForTwoTats => "Only retaliates after two consecutive defections.",
            ClassicStrategy::Gradual => "Retaliates with increasing severity, then forgives.",
            ClassicStrategy::Alternator => "Alternates between cooperating and defecting.",
            ClassicStrategy::Scripted(_) => "Plays a fixed list of moves.",
        }
    }
}

/// Good outcome (3+ points) → stay, bad outcome → switch.
fn pavlov(ledger: &HistoryLedger) -> Action {
    match (ledger.last(Side::Own), ledger.last(Side::Opponent)) {
        (Some(mine), Some(theirs)) => {
            let (score, _) = payoff(mine, theirs);
            if score >= 3 {
                mine
            } else {
                mine.flipped()
            }
        }
        _ => Action::Cooperate,
    }
}

/// After N opponent defections, own defections should total N(N+1)/2.
fn gradual(opponent: &[Action], own: &[Action]) -> Action {
    let theirs = opponent.iter().filter(|m| **m == Action::Defect).count();
    let mine = own.iter().filter(|m| **m == Action::Defect).count();

    if mine < theirs * (theirs + 1) / 2 {
        Action::Defect
    } else {
        Action::Cooperate
    }
}

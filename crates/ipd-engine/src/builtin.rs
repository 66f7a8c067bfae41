//! Built-in strategy catalogue
//!
//! The classic bots from Axelrod-style tournaments. Each is stateless: a
//! decision depends only on the history, the payoff table, `w`, the bot's
//! fixed parameters, and the per-round random stream.

use serde::{Deserialize, Serialize};
use crate::payoff::PayoffTable;
use crate::random::SeededRng;
use crate::strategy::{Bot, Move, Strategy, Turn};

/// Built-in strategy type with its parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Defect unconditionally.
    AllD,
    /// Cooperate unconditionally.
    AllC,
    /// Cooperate with probability `p_cooperate`, ignoring history.
    Random { p_cooperate: f64 },
    /// Win-stay, lose-shift.
    Pavlov,
    /// Start cooperating, then copy the partner's last move.
    TitForTat,
    /// Defect only after two partner defections in a row.
    TitForTwoTats,
    /// Defect twice after each partner defection.
    TwoTitsForTat,
    /// Tit-for-Tat that opens with a defection.
    SuspiciousTitForTat,
    /// Tit-for-Tat that forgives a defection with probability `p_generous`.
    GenerousTitForTat { p_generous: f64 },
    /// Tit-for-Tat that sneaks in a defection with probability `p_sneaky`.
    Joss { p_sneaky: f64 },
    /// Follow the partner's majority move; `soft` cooperates on ties.
    Majority { soft: bool },
    /// Probe with a defection, apologize if punished, else alternate.
    Tester,
    /// Permanent retaliator.
    Friedman,
    /// Retaliate with probability equal to the partner's defection ratio.
    Eatherly,
    /// Phased cooperator tuned to the expected meeting length.
    Champion,
}

impl StrategyKind {
    /// Display name, parameters included (e.g. `RANDOM_0.5`)
    pub fn name(&self) -> String {
        match self {
            StrategyKind::AllD => "ALL_D".to_string(),
            StrategyKind::AllC => "ALL_C".to_string(),
            StrategyKind::Random { p_cooperate } => format!("RANDOM_{}", p_cooperate),
            StrategyKind::Pavlov => "PAVLOV".to_string(),
            StrategyKind::TitForTat => "TIT_FOR_TAT".to_string(),
            StrategyKind::TitForTwoTats => "TIT_FOR_TWO_TATS".to_string(),
            StrategyKind::TwoTitsForTat => "TWO_TITS_FOR_TAT".to_string(),
            StrategyKind::SuspiciousTitForTat => "SUSPICIOUS_TIT_FOR_TAT".to_string(),
            StrategyKind::GenerousTitForTat { p_generous } => {
                format!("GENEROUS_TIT_FOR_TAT_{}", p_generous)
            }
            StrategyKind::Joss { p_sneaky } => format!("JOSS_{}", p_sneaky),
            StrategyKind::Majority { soft: true } => "MAJORITY_SOFT".to_string(),
            StrategyKind::Majority { soft: false } => "MAJORITY_HARD".to_string(),
            StrategyKind::Tester => "TESTER".to_string(),
            StrategyKind::Friedman => "FRIEDMAN".to_string(),
            StrategyKind::Eatherly => "EATHERLY".to_string(),
            StrategyKind::Champion => "CHAMPION".to_string(),
        }
    }

    /// Human-readable description of the behavior
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::AllD => "ALL_D defects unconditionally.",
            StrategyKind::AllC => "ALL_C cooperates unconditionally.",
            StrategyKind::Random { .. } => {
                "RANDOM chooses randomly between cooperation and defection with some \
                 specified probability for each, independent of its partner's moves."
            }
            StrategyKind::Pavlov => {
                "PAVLOV cooperates on the first turn, and thereafter cooperates if and only \
                 if both players made the same choice last turn (win-stay, lose-shift)."
            }
            StrategyKind::TitForTat => {
                "TIT_FOR_TAT cooperates on the first turn, and thereafter mirrors its \
                 partner's previous move."
            }
            StrategyKind::TitForTwoTats => {
                "TIT_FOR_TWO_TATS defects if and only if its partner has defected for the \
                 past two turns."
            }
            StrategyKind::TwoTitsForTat => {
                "TWO_TITS_FOR_TAT cooperates unless its partner defects, in which case it \
                 retaliates with two defections."
            }
            StrategyKind::SuspiciousTitForTat => {
                "SUSPICIOUS_TIT_FOR_TAT defects on the first turn, and thereafter mirrors \
                 its partner's previous move."
            }
            StrategyKind::GenerousTitForTat { .. } => {
                "GENEROUS_TIT_FOR_TAT mirrors its partner's previous move, except that after \
                 a defection it cooperates with some probability to avoid needless mutual \
                 punishment."
            }
            StrategyKind::Joss { .. } => {
                "JOSS mirrors its partner's previous move, except that after a cooperation \
                 it defects with some probability to see what it can get away with."
            }
            StrategyKind::Majority { .. } => {
                "MAJORITY cooperates as long as its partner has cooperated more than it has \
                 defected; on a tie the soft variant cooperates and the hard one defects."
            }
            StrategyKind::Tester => {
                "TESTER opens with a defection. If the partner ever defects it apologizes \
                 once and then mirrors the partner; otherwise it cooperates twice and then \
                 alternates defection and cooperation."
            }
            StrategyKind::Friedman => {
                "FRIEDMAN cooperates until its partner defects, then defects for the rest \
                 of the meeting."
            }
            StrategyKind::Eatherly => {
                "EATHERLY cooperates, but after a partner defection it defects with \
                 probability equal to the partner's defection ratio so far."
            }
            StrategyKind::Champion => {
                "CHAMPION cooperates for the first 1/20 of the expected meeting length, \
                 mirrors its partner until 1/8 of it, and then cooperates unless the \
                 partner defected last turn, cooperated less than 60% of the time, and a \
                 random draw falls below the partner's defection rate."
            }
        }
    }

    /// Wrap this kind in a bot with the catalogue name and description
    pub fn into_bot(self) -> Bot {
        Bot::new(self.name(), Some(self.description().to_string()), self)
    }

    /// The twenty-bot roster of the classic demonstration tournament
    pub fn classic_roster() -> Vec<StrategyKind> {
        vec![
            StrategyKind::AllD,
            StrategyKind::AllC,
            StrategyKind::Random { p_cooperate: 0.5 },
            StrategyKind::Pavlov,
            StrategyKind::TitForTat,
            StrategyKind::TitForTwoTats,
            StrategyKind::TwoTitsForTat,
            StrategyKind::SuspiciousTitForTat,
            StrategyKind::GenerousTitForTat { p_generous: 0.1 },
            StrategyKind::GenerousTitForTat { p_generous: 0.3 },
            StrategyKind::Joss { p_sneaky: 0.1 },
            StrategyKind::Joss { p_sneaky: 0.3 },
            StrategyKind::Majority { soft: true },
            StrategyKind::Majority { soft: false },
            StrategyKind::Tester,
            StrategyKind::Friedman,
            StrategyKind::Eatherly,
            StrategyKind::Champion,
            StrategyKind::Random { p_cooperate: 0.8 },
            StrategyKind::Random { p_cooperate: 0.2 },
        ]
    }
}

impl Strategy for StrategyKind {
    fn next_move(
        &self,
        history: &[Turn],
        _payoffs: &PayoffTable,
        w: f64,
        rng: &mut SeededRng,
    ) -> Move {
        match *self {
            StrategyKind::AllD => Move::Defect,
            StrategyKind::AllC => Move::Cooperate,
            StrategyKind::Random { p_cooperate } => execute_random(p_cooperate, rng),
            StrategyKind::Pavlov => execute_pavlov(history),
            StrategyKind::TitForTat => execute_tit_for_tat(history, Move::Cooperate),
            StrategyKind::TitForTwoTats => execute_tit_for_two_tats(history),
            StrategyKind::TwoTitsForTat => execute_two_tits_for_tat(history),
            StrategyKind::SuspiciousTitForTat => execute_tit_for_tat(history, Move::Defect),
            StrategyKind::GenerousTitForTat { p_generous } => {
                execute_generous_tit_for_tat(history, p_generous, rng)
            }
            StrategyKind::Joss { p_sneaky } => execute_joss(history, p_sneaky, rng),
            StrategyKind::Majority { soft } => execute_majority(history, soft),
            StrategyKind::Tester => execute_tester(history),
            StrategyKind::Friedman => execute_friedman(history),
            StrategyKind::Eatherly => execute_eatherly(history, rng),
            StrategyKind::Champion => execute_champion(history, w, rng),
        }
    }
}

fn partner_defections(history: &[Turn]) -> usize {
    history.iter().filter(|t| t.partner == Move::Defect).count()
}

fn execute_random(p_cooperate: f64, rng: &mut SeededRng) -> Move {
    if rng.next_f64() < p_cooperate {
        Move::Cooperate
    } else {
        Move::Defect
    }
}

/// Cooperate exactly when last turn's moves matched
fn execute_pavlov(history: &[Turn]) -> Move {
    match history.last() {
        None => Move::Cooperate,
        Some(t) if t.own == t.partner => Move::Cooperate,
        Some(_) => Move::Defect,
    }
}

fn execute_tit_for_tat(history: &[Turn], opening: Move) -> Move {
    history.last().map_or(opening, |t| t.partner)
}

fn execute_tit_for_two_tats(history: &[Turn]) -> Move {
    match history {
        [.., a, b] if a.partner == Move::Defect && b.partner == Move::Defect => Move::Defect,
        _ => Move::Cooperate,
    }
}

fn execute_two_tits_for_tat(history: &[Turn]) -> Move {
    match history {
        [] => Move::Cooperate,
        [only] => only.partner,
        [.., a, b] => {
            if a.partner == Move::Defect || b.partner == Move::Defect {
                Move::Defect
            } else {
                Move::Cooperate
            }
        }
    }
}

fn execute_generous_tit_for_tat(history: &[Turn], p_generous: f64, rng: &mut SeededRng) -> Move {
    match history.last() {
        None => Move::Cooperate,
        Some(t) if t.partner == Move::Defect && rng.next_f64() < p_generous => Move::Cooperate,
        Some(t) => t.partner,
    }
}

fn execute_joss(history: &[Turn], p_sneaky: f64, rng: &mut SeededRng) -> Move {
    match history.last() {
        None => Move::Cooperate,
        Some(t) if t.partner == Move::Cooperate && rng.next_f64() < p_sneaky => Move::Defect,
        Some(t) => t.partner,
    }
}

fn execute_majority(history: &[Turn], soft: bool) -> Move {
    if history.is_empty() {
        return Move::Cooperate;
    }
    // compare 2·defections against total to avoid float ties
    let doubled = 2 * partner_defections(history);
    match doubled.cmp(&history.len()) {
        std::cmp::Ordering::Less => Move::Cooperate,
        std::cmp::Ordering::Greater => Move::Defect,
        std::cmp::Ordering::Equal if soft => Move::Cooperate,
        std::cmp::Ordering::Equal => Move::Defect,
    }
}

fn execute_tester(history: &[Turn]) -> Move {
    let Some(last) = history.last() else {
        return Move::Defect;
    };

    let earlier = &history[..history.len() - 1];
    if partner_defections(history) == 0 {
        // unpunished: two cooperations, then alternate
        if history.len() < 3 {
            Move::Cooperate
        } else {
            last.own.flipped()
        }
    } else if partner_defections(earlier) == 0 {
        // first defection just happened, apologize
        Move::Cooperate
    } else {
        last.partner
    }
}

fn execute_friedman(history: &[Turn]) -> Move {
    if partner_defections(history) > 0 {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

fn execute_eatherly(history: &[Turn], rng: &mut SeededRng) -> Move {
    match history.last() {
        None => Move::Cooperate,
        Some(t) if t.partner == Move::Cooperate => Move::Cooperate,
        Some(_) => {
            let ratio = partner_defections(history) as f64 / history.len() as f64;
            if rng.next_f64() < ratio {
                Move::Defect
            } else {
                Move::Cooperate
            }
        }
    }
}

fn execute_champion(history: &[Turn], w: f64, rng: &mut SeededRng) -> Move {
    let turns = history.len() as f64;
    let expected_length = 1.0 / (1.0 - w);

    if turns <= expected_length / 20.0 {
        return Move::Cooperate;
    }
    let Some(last) = history.last() else {
        return Move::Cooperate;
    };
    if turns < expected_length * 5.0 / 40.0 {
        return last.partner;
    }

    let defection_rate = partner_defections(history) as f64 / turns;
    if last.partner == Move::Defect && defection_rate > rng.next_f64().max(0.4) {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

//! Moves, turns, and the strategy capability bots are built on

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::error::ArenaError;
use crate::payoff::PayoffTable;
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    #[serde(rename = "C")]
    Cooperate,
    #[serde(rename = "D")]
    Defect,
}

impl Move {
    /// Single-letter symbol, `C` or `D`
    pub fn symbol(self) -> char {
        match self {
            Move::Cooperate => 'C',
            Move::Defect => 'D',
        }
    }

    pub fn is_cooperate(self) -> bool {
        self == Move::Cooperate
    }

    /// The other move
    pub fn flipped(self) -> Move {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<char> for Move {
    type Error = ArenaError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'C' => Ok(Move::Cooperate),
            'D' => Ok(Move::Defect),
            other => Err(ArenaError::InvalidMove(other.to_string())),
        }
    }
}

impl FromStr for Move {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Move::Cooperate),
            "D" => Ok(Move::Defect),
            other => Err(ArenaError::InvalidMove(other.to_string())),
        }
    }
}

/// One round seen from one side: (own move, partner's move)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub own: Move,
    pub partner: Move,
}

impl Turn {
    pub fn new(own: Move, partner: Move) -> Self {
        Self { own, partner }
    }

    /// The same round from the partner's side
    pub fn mirrored(self) -> Self {
        Self { own: self.partner, partner: self.own }
    }
}

/// Parse a history written as symbol pairs, e.g. `"CD DD CC"`.
///
/// Each whitespace-separated token is two symbols: own move, then partner's.
pub fn parse_history(s: &str) -> Result<Vec<Turn>, ArenaError> {
    s.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some(own), Some(partner), None) => {
                    Ok(Turn::new(Move::try_from(own)?, Move::try_from(partner)?))
                }
                _ => Err(ArenaError::InvalidMove(token.to_string())),
            }
        })
        .collect()
}

/// Decision function behind a bot.
///
/// Implementations must decide from the arguments and their own fixed
/// configuration only. `history` holds this side's turns so far in the
/// current meeting; it never reveals how long the meeting will run. Any
/// randomness comes from `rng`, which the engine derives per round and side.
pub trait Strategy: Send + Sync {
    fn next_move(
        &self,
        history: &[Turn],
        payoffs: &PayoffTable,
        w: f64,
        rng: &mut SeededRng,
    ) -> Move;
}

impl<F> Strategy for F
where
    F: Fn(&[Turn], &PayoffTable, f64, &mut SeededRng) -> Move + Send + Sync,
{
    fn next_move(
        &self,
        history: &[Turn],
        payoffs: &PayoffTable,
        w: f64,
        rng: &mut SeededRng,
    ) -> Move {
        self(history, payoffs, w, rng)
    }
}

/// A tournament participant
pub struct Bot {
    pub name: String,
    pub description: String,
    /// Dense 0-based id, assigned when a tournament starts
    pub tournament_id: Option<usize>,
    strategy: Box<dyn Strategy>,
}

impl Bot {
    /// Create a bot; the description defaults to the name
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        strategy: impl Strategy + 'static,
    ) -> Self {
        let name = name.into();
        let description = description.unwrap_or_else(|| name.clone());
        Self {
            name,
            description,
            tournament_id: None,
            strategy: Box::new(strategy),
        }
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("name", &self.name)
            .field("tournament_id", &self.tournament_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

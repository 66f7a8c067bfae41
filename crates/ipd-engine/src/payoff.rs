//! Payoff table for the Prisoner's Dilemma

use serde::{Deserialize, Serialize};
use crate::error::ConfigViolation;
use crate::strategy::{Move, Turn};

/// Payoffs for the four outcome classes.
///
/// A valid table satisfies `T > R > P > S` and `2R > T + S`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoffTable {
    /// Defecting against a cooperator
    #[serde(rename = "T")]
    pub temptation: f64,
    /// Mutual cooperation
    #[serde(rename = "R")]
    pub reward: f64,
    /// Mutual defection
    #[serde(rename = "P")]
    pub punishment: f64,
    /// Cooperating against a defector
    #[serde(rename = "S")]
    pub sucker: f64,
}

impl PayoffTable {
    pub fn new(temptation: f64, reward: f64, punishment: f64, sucker: f64) -> Self {
        Self { temptation, reward, punishment, sucker }
    }

    /// Axelrod's classic values: T=5, R=3, P=1, S=0
    pub fn standard() -> Self {
        Self::new(5.0, 3.0, 1.0, 0.0)
    }

    /// Check both ordering rules, reporting each one that fails
    pub fn validate(&self) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        let ordered = self.temptation > self.reward
            && self.reward > self.punishment
            && self.punishment > self.sucker;
        if !ordered {
            violations.push(ConfigViolation::PayoffOrdering);
        }
        if !(2.0 * self.reward > self.temptation + self.sucker) {
            violations.push(ConfigViolation::PayoffAlternation);
        }
        violations
    }

    /// Payoffs for one turn as (own, partner)
    pub fn score_turn(&self, turn: Turn) -> (f64, f64) {
        match (turn.own, turn.partner) {
            (Move::Cooperate, Move::Cooperate) => (self.reward, self.reward),
            (Move::Cooperate, Move::Defect) => (self.sucker, self.temptation),
            (Move::Defect, Move::Cooperate) => (self.temptation, self.sucker),
            (Move::Defect, Move::Defect) => (self.punishment, self.punishment),
        }
    }
}

impl Default for PayoffTable {
    fn default() -> Self {
        Self::standard()
    }
}

//! Tournament and morality configuration

use serde::{Deserialize, Serialize};
use crate::error::{ConfigViolation, Result};
use crate::payoff::PayoffTable;
use crate::strategy::Bot;

/// Everything a tournament run needs besides the roster.
///
/// Built once per tournament and passed by reference to every stage, so
/// strategies and engine always see the same payoffs and `w`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Meetings each pair plays
    pub meetings_per_pair: usize,
    pub payoffs: PayoffTable,
    /// Probability `w` that a meeting continues after each turn
    pub continuation_probability: f64,
    /// Root seed for every random stream in the run
    pub seed: [u8; 32],
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            meetings_per_pair: 5,
            payoffs: PayoffTable::standard(),
            continuation_probability: 0.995,
            seed: [0u8; 32],
        }
    }
}

impl TournamentConfig {
    pub fn new(meetings_per_pair: usize, payoffs: PayoffTable, continuation_probability: f64) -> Self {
        Self {
            meetings_per_pair,
            payoffs,
            continuation_probability,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: [u8; 32]) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check every rule and return all violations; empty means valid.
    ///
    /// Roster entries are `Bot`s, so each already carries a `Strategy`;
    /// the roster itself must not be empty.
    pub fn validate(&self, roster: &[Bot]) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        if roster.is_empty() {
            violations.push(ConfigViolation::EmptyRoster);
        }
        violations.extend(self.validate_settings());
        violations
    }

    /// Check the roster-independent rules: meeting count, payoffs and `w`
    pub fn validate_settings(&self) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        if self.meetings_per_pair < 1 {
            violations.push(ConfigViolation::NoMeetings);
        }
        violations.extend(self.payoffs.validate());
        let w = self.continuation_probability;
        if !(w > 0.0 && w < 1.0) {
            violations.push(ConfigViolation::ContinuationProbability(w));
        }
        violations
    }
}

/// Power-iteration settings for the recursive morality scores
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoralityConfig {
    /// Iteration budget
    pub iterations: usize,
    /// Stop early once the relative L1 change of the normalized vector
    /// drops below this. `None` always spends the full budget.
    pub tolerance: Option<f64>,
}

impl Default for MoralityConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            tolerance: None,
        }
    }
}

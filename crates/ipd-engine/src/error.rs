//! Error types for tournament configuration and simulation

use thiserror::Error;

/// One broken configuration rule. Validation collects every violation
/// rather than stopping at the first.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigViolation {
    #[error("bot roster must contain at least one bot")]
    EmptyRoster,

    #[error("meetings per pair must be at least 1")]
    NoMeetings,

    #[error("payoffs must obey T > R > P > S")]
    PayoffOrdering,

    #[error("payoffs must obey 2*R > T + S")]
    PayoffAlternation,

    #[error("continuation probability w must be strictly between 0 and 1 (got {0})")]
    ContinuationProbability(f64),

    #[error("expected {expected} interaction lengths, got {actual}")]
    LengthCount { expected: usize, actual: usize },

    #[error("interaction length at meeting {0} must be at least 1")]
    ZeroLength(usize),

    #[error("meetings stored for pair ({a}, {b}) do not match the interaction lengths")]
    MeetingLengths { a: usize, b: usize },
}

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("invalid tournament configuration: {}", join_violations(.0))]
    Configuration(Vec<ConfigViolation>),

    #[error("invalid move symbol {0:?}, must be 'C' or 'D'")]
    InvalidMove(String),

    #[error("cooperation rate undefined for pair ({a}, {b}): no turns played")]
    DivisionUndefined { a: usize, b: usize },

    #[error("pair table sized for {table} bots but roster has {roster}")]
    RosterMismatch { roster: usize, table: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArenaError {
    /// Violations carried by a configuration error, empty otherwise
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            ArenaError::Configuration(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ArenaError>;

//! Iterated Prisoner's Dilemma tournament engine
//!
//! Runs round-robin tournaments among pluggable strategies, scores them
//! under a configurable payoff table, and derives cooperation and
//! recursive morality metrics from the results.
//! This crate is compiled to:
//! - Native (library use)
//! - WASM (frontend tournament runs and replays)

mod random;
mod error;
mod payoff;
mod strategy;
mod builtin;
mod game;
mod pairing;
mod config;
mod tournament;
mod morality;

#[cfg(feature = "wasm")]
mod wasm;

pub use random::SeededRng;
pub use error::{ArenaError, ConfigViolation, Result};
pub use payoff::PayoffTable;
pub use strategy::{parse_history, Bot, Move, Strategy, Turn};
pub use builtin::StrategyKind;
pub use game::{generate_interaction_lengths, run_meeting, InteractionLengths, Meeting};
pub use pairing::{pair_count, pair_rank, round_robin_pairs, unrank_pair, PairTable};
pub use config::{MoralityConfig, TournamentConfig};
pub use tournament::{Arena, Standing, TournamentResult};
pub use morality::{
    calculate_cooperation_stats, calculate_network_morality, power_iteration,
    principal_eigenvector, CooperationMatrix, CooperationStats, EigenResult, Metric,
    MoralityCalculator, MoralityRow,
};

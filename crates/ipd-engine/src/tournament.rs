//! Round-robin scheduler and tournament results

use serde::Serialize;
use tracing::{debug, info, warn};
use crate::config::TournamentConfig;
use crate::error::{ArenaError, ConfigViolation, Result};
use crate::game::{generate_interaction_lengths, run_meeting, InteractionLengths, Meeting};
use crate::pairing::{pair_rank, PairTable};
use crate::payoff::PayoffTable;
use crate::random::{SeededRng, LENGTH_STREAM};
use crate::strategy::{Bot, Strategy};

/// Runs round-robin tournaments
#[derive(Clone, Copy, Debug, Default)]
pub struct Arena;

impl Arena {
    pub fn new() -> Self {
        Self
    }

    /// Run a full tournament
    ///
    /// Validates the configuration, assigns tournament ids in roster order,
    /// generates one set of interaction lengths for the whole run, and plays
    /// every pair (self-pairs included) through that set.
    pub fn run(&self, roster: Vec<Bot>, config: &TournamentConfig) -> Result<TournamentResult> {
        reject_invalid(&roster, config, Vec::new())?;

        let mut rng = SeededRng::new(&config.seed, LENGTH_STREAM);
        let lengths = generate_interaction_lengths(
            &mut rng,
            config.continuation_probability,
            config.meetings_per_pair,
        )?;
        self.play(roster, config, lengths)
    }

    /// Run with caller-supplied interaction lengths instead of generated ones
    pub fn run_with_lengths(
        &self,
        roster: Vec<Bot>,
        config: &TournamentConfig,
        lengths: InteractionLengths,
    ) -> Result<TournamentResult> {
        let mut extra = Vec::new();
        if config.meetings_per_pair >= 1 && lengths.len() != config.meetings_per_pair {
            extra.push(ConfigViolation::LengthCount {
                expected: config.meetings_per_pair,
                actual: lengths.len(),
            });
        }
        reject_invalid(&roster, config, extra)?;
        self.play(roster, config, lengths)
    }

    fn play(
        &self,
        roster: Vec<Bot>,
        config: &TournamentConfig,
        lengths: InteractionLengths,
    ) -> Result<TournamentResult> {
        let n = roster.len();
        info!(
            bots = n,
            meetings_per_pair = config.meetings_per_pair,
            w = config.continuation_probability,
            "starting tournament"
        );

        // Pairs are independent given the shared lengths: each draws from
        // the stream of its own rank, so evaluation order does not matter.
        let interactions = PairTable::from_fn(n, |i, j| {
            let meetings = play_pair((i, &roster[i]), (j, &roster[j]), config, &lengths);
            debug!(a = i, b = j, meetings = meetings.len(), "pair complete");
            meetings
        });

        let result = TournamentResult::new(roster, lengths, interactions, config.payoffs)?;
        info!(
            pairs = result.interactions.len(),
            winner = result.winning_name().unwrap_or_default(),
            "tournament complete"
        );
        Ok(result)
    }

    /// Replay one meeting of a tournament run with `config`.
    ///
    /// `a` and `b` are the strategies of the bots with ids `a_id` and `b_id`;
    /// `meeting` indexes the interaction lengths. Reproduces the stored
    /// meeting exactly, seen from `a`'s side.
    pub fn replay(
        &self,
        (a_id, a): (usize, &dyn Strategy),
        (b_id, b): (usize, &dyn Strategy),
        meeting: usize,
        length: usize,
        config: &TournamentConfig,
    ) -> Result<Meeting> {
        let mut violations = config.validate_settings();
        if length == 0 {
            violations.push(ConfigViolation::ZeroLength(meeting));
        }
        if !violations.is_empty() {
            warn!(violations = ?violations, "rejecting replay configuration");
            return Err(ArenaError::Configuration(violations));
        }

        let rng = meeting_rng(config, a_id, b_id, meeting);
        let w = config.continuation_probability;
        // stored meetings are played from the lower id's side
        if a_id <= b_id {
            Ok(run_meeting(a, b, length, &config.payoffs, w, &rng))
        } else {
            Ok(run_meeting(b, a, length, &config.payoffs, w, &rng).mirrored())
        }
    }
}

/// Stream for meeting `meeting` of the pair {a, b}
fn meeting_rng(config: &TournamentConfig, a: usize, b: usize, meeting: usize) -> SeededRng {
    SeededRng::new(&config.seed, pair_rank(a, b) as u32).fork(meeting as u64)
}

fn reject_invalid(
    roster: &[Bot],
    config: &TournamentConfig,
    mut violations: Vec<ConfigViolation>,
) -> Result<()> {
    let mut all = config.validate(roster);
    all.append(&mut violations);
    if all.is_empty() {
        return Ok(());
    }
    warn!(violations = ?all, "rejecting tournament configuration");
    Err(ArenaError::Configuration(all))
}

fn play_pair(
    (a_id, a): (usize, &Bot),
    (b_id, b): (usize, &Bot),
    config: &TournamentConfig,
    lengths: &InteractionLengths,
) -> Vec<Meeting> {
    lengths
        .iter()
        .enumerate()
        .map(|(m, length)| {
            run_meeting(
                a.strategy(),
                b.strategy(),
                length,
                &config.payoffs,
                config.continuation_probability,
                &meeting_rng(config, a_id, b_id, m),
            )
        })
        .collect()
}

/// One row of the final standings
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Standing {
    pub id: usize,
    pub name: String,
    pub score: f64,
    pub avg_score: f64,
}

/// Scores and raw interactions of a finished tournament
#[derive(Debug)]
pub struct TournamentResult {
    bots: Vec<Bot>,
    payoffs: PayoffTable,
    lengths: InteractionLengths,
    interactions: PairTable<Vec<Meeting>>,
    /// Per-meeting (first bot, second bot) scores, same layout as interactions
    meeting_scores: PairTable<Vec<(f64, f64)>>,
    totals: Vec<f64>,
    /// Bots × turns in one full set of meetings
    total_interactions: f64,
}

impl TournamentResult {
    /// Score raw interactions.
    ///
    /// `bots[i]` becomes the bot with id `i`. Every pair must hold one
    /// meeting per entry of `lengths`, each of that length.
    pub fn new(
        mut bots: Vec<Bot>,
        lengths: InteractionLengths,
        interactions: PairTable<Vec<Meeting>>,
        payoffs: PayoffTable,
    ) -> Result<Self> {
        if interactions.bot_count() != bots.len() {
            return Err(ArenaError::RosterMismatch {
                roster: bots.len(),
                table: interactions.bot_count(),
            });
        }

        let mismatched: Vec<ConfigViolation> = interactions
            .iter()
            .filter(|(_, meetings)| !meetings.iter().map(Meeting::len).eq(lengths.iter()))
            .map(|((a, b), _)| ConfigViolation::MeetingLengths { a, b })
            .collect();
        if !mismatched.is_empty() {
            return Err(ArenaError::Configuration(mismatched));
        }

        for (id, bot) in bots.iter_mut().enumerate() {
            bot.tournament_id = Some(id);
        }

        let meeting_scores: PairTable<Vec<(f64, f64)>> =
            interactions.map(|_, meetings| meetings.iter().map(|m| m.score(&payoffs)).collect());

        let mut totals = vec![0.0; bots.len()];
        for ((i, j), scores) in meeting_scores.iter() {
            for &(score_i, score_j) in scores.iter() {
                // a bot paired with itself is one bot: count once
                if i == j {
                    totals[i] += score_i;
                } else {
                    totals[i] += score_i;
                    totals[j] += score_j;
                }
            }
        }

        let total_interactions = (bots.len() * lengths.total_turns()) as f64;

        Ok(Self {
            bots,
            payoffs,
            lengths,
            interactions,
            meeting_scores,
            totals,
            total_interactions,
        })
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn payoffs(&self) -> &PayoffTable {
        &self.payoffs
    }

    pub fn interaction_lengths(&self) -> &InteractionLengths {
        &self.lengths
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.bots.get(id).map(|b| b.name.as_str())
    }

    pub fn description(&self, id: usize) -> Option<&str> {
        self.bots.get(id).map(|b| b.description.as_str())
    }

    /// Cumulative score over all of a bot's meetings
    pub fn score(&self, id: usize) -> Option<f64> {
        self.totals.get(id).copied()
    }

    /// Score divided by (bot count × turns in one set of meetings).
    ///
    /// The divisor is the same for every bot, which makes averages
    /// comparable under a full round robin.
    pub fn avg_score(&self, id: usize) -> Option<f64> {
        self.score(id).map(|s| s / self.total_interactions)
    }

    /// Highest-scoring bot; ties go to the earliest in the roster
    pub fn winning_id(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (id, &score) in self.totals.iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn winning_name(&self) -> Option<&str> {
        self.winning_id().and_then(|id| self.name(id))
    }

    /// Meetings for the pair, from the lower id's side
    pub fn interactions(&self, a: usize, b: usize) -> Option<&[Meeting]> {
        self.interactions.get(a, b).map(Vec::as_slice)
    }

    pub fn interaction(&self, a: usize, b: usize, meeting: usize) -> Option<&Meeting> {
        self.interactions(a, b)?.get(meeting)
    }

    /// Meetings for the pair, from `a`'s side whatever the id order
    pub fn interactions_from(&self, a: usize, b: usize) -> Option<Vec<Meeting>> {
        let meetings = self.interactions(a, b)?;
        if a <= b {
            Some(meetings.to_vec())
        } else {
            Some(meetings.iter().map(Meeting::mirrored).collect())
        }
    }

    /// Per-meeting scores for the pair, lower id first
    pub fn interaction_scores(&self, a: usize, b: usize) -> Option<&[(f64, f64)]> {
        self.meeting_scores.get(a, b).map(Vec::as_slice)
    }

    pub fn interaction_score(&self, a: usize, b: usize, meeting: usize) -> Option<(f64, f64)> {
        self.interaction_scores(a, b)?.get(meeting).copied()
    }

    /// All stored pairs with their meetings, lower id first
    pub fn pairs(&self) -> impl Iterator<Item = ((usize, usize), &[Meeting])> {
        self.interactions.iter().map(|(pair, m)| (pair, m.as_slice()))
    }

    /// Ids by descending score; equal scores keep roster order
    pub fn sorted_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.bots.len()).collect();
        ids.sort_by(|&a, &b| self.totals[b].total_cmp(&self.totals[a]));
        ids
    }

    /// Bots by descending score; equal scores keep roster order
    pub fn sorted_bots(&self) -> Vec<&Bot> {
        self.sorted_ids().into_iter().map(|id| &self.bots[id]).collect()
    }

    /// Serializable standings, best first
    pub fn standings(&self) -> Vec<Standing> {
        self.sorted_ids()
            .into_iter()
            .map(|id| Standing {
                id,
                name: self.bots[id].name.clone(),
                score: self.totals[id],
                avg_score: self.totals[id] / self.total_interactions,
            })
            .collect()
    }
}

//! Meeting execution engine

use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::{ArenaError, ConfigViolation, Result};
use crate::payoff::PayoffTable;
use crate::random::SeededRng;
use crate::strategy::{Strategy, Turn};

/// Lengths of every meeting a pair plays, shared by all pairs in a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionLengths(Vec<usize>);

impl InteractionLengths {
    /// Wrap explicit lengths, rejecting an empty set and zero-length meetings
    pub fn new(lengths: Vec<usize>) -> Result<Self> {
        if lengths.is_empty() {
            return Err(ArenaError::Configuration(vec![ConfigViolation::NoMeetings]));
        }
        let violations: Vec<_> = lengths
            .iter()
            .enumerate()
            .filter(|(_, len)| **len == 0)
            .map(|(m, _)| ConfigViolation::ZeroLength(m))
            .collect();
        if !violations.is_empty() {
            return Err(ArenaError::Configuration(violations));
        }
        Ok(Self(lengths))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of meetings per pair
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Turns in one full set of meetings
    pub fn total_turns(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// One complete match between two bots, from the first bot's side
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meeting {
    turns: Vec<Turn>,
}

impl Meeting {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The meeting from the second bot's side
    pub fn mirrored(&self) -> Meeting {
        Meeting {
            turns: self.turns.iter().map(|t| t.mirrored()).collect(),
        }
    }

    /// Summed payoffs as (first bot, second bot)
    pub fn score(&self, payoffs: &PayoffTable) -> (f64, f64) {
        self.turns.iter().fold((0.0, 0.0), |(a, b), turn| {
            let (sa, sb) = payoffs.score_turn(*turn);
            (a + sa, b + sb)
        })
    }

    /// Cooperation counts as (first bot, second bot)
    pub fn cooperations(&self) -> (usize, usize) {
        self.turns.iter().fold((0, 0), |(a, b), turn| {
            (
                a + turn.own.is_cooperate() as usize,
                b + turn.partner.is_cooperate() as usize,
            )
        })
    }
}

fn check_continuation(w: f64) -> Result<()> {
    if w > 0.0 && w < 1.0 {
        Ok(())
    } else {
        Err(ArenaError::Configuration(vec![ConfigViolation::ContinuationProbability(w)]))
    }
}

/// Draw one meeting length: start at 1 and add a turn for every draw ≤ w
fn draw_length(rng: &mut SeededRng, w: f64) -> usize {
    let mut length = 1;
    while rng.next_f64() <= w {
        length += 1;
    }
    length
}

/// Generate `count` geometric meeting lengths with continuation probability `w`.
///
/// Called once per tournament; every pair then plays meetings of exactly
/// these lengths.
pub fn generate_interaction_lengths(
    rng: &mut SeededRng,
    w: f64,
    count: usize,
) -> Result<InteractionLengths> {
    check_continuation(w)?;
    if count == 0 {
        return Err(ArenaError::Configuration(vec![ConfigViolation::NoMeetings]));
    }
    let lengths: Vec<usize> = (0..count).map(|_| draw_length(rng, w)).collect();
    debug!(?lengths, w, "generated interaction lengths");
    Ok(InteractionLengths(lengths))
}

/// Run one meeting of `length` rounds between two strategies
///
/// # Arguments
/// * `strategy_a` - First bot's strategy; the result is from its side
/// * `strategy_b` - Second bot's strategy
/// * `length` - Number of rounds
/// * `payoffs` - Payoff table passed through to both strategies
/// * `w` - Continuation probability passed through to both strategies
/// * `rng` - Meeting stream; each side of each round forks its own child
///
/// # Returns
/// The meeting as seen by `strategy_a`
pub fn run_meeting(
    strategy_a: &dyn Strategy,
    strategy_b: &dyn Strategy,
    length: usize,
    payoffs: &PayoffTable,
    w: f64,
    rng: &SeededRng,
) -> Meeting {
    let mut history_a: Vec<Turn> = Vec::with_capacity(length);
    let mut history_b: Vec<Turn> = Vec::with_capacity(length);

    for round in 0..length as u64 {
        // Per-side streams so the two strategies don't affect each other
        let mut rng_a = rng.fork(round * 2);
        let mut rng_b = rng.fork(round * 2 + 1);

        // Both decide before either move is recorded
        let move_a = strategy_a.next_move(&history_a, payoffs, w, &mut rng_a);
        let move_b = strategy_b.next_move(&history_b, payoffs, w, &mut rng_b);

        history_a.push(Turn::new(move_a, move_b));
        history_b.push(Turn::new(move_b, move_a));
    }

    Meeting::new(history_a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::StrategyKind;
    use crate::strategy::Move;
    use proptest::prelude::*;

    fn meeting(a: StrategyKind, b: StrategyKind, length: usize) -> Meeting {
        let rng = SeededRng::new(&[42u8; 32], 0);
        run_meeting(&a, &b, length, &PayoffTable::standard(), 0.995, &rng)
    }

    #[test]
    fn test_lengths_count_and_minimum() {
        let mut rng = SeededRng::new(&[42u8; 32], 0);
        let lengths = generate_interaction_lengths(&mut rng, 0.9, 50).unwrap();
        assert_eq!(lengths.len(), 50);
        assert!(lengths.iter().all(|l| l >= 1));
    }

    #[test]
    fn test_lengths_mean_matches_geometric() {
        let mut rng = SeededRng::new(&[42u8; 32], 0);
        let lengths = generate_interaction_lengths(&mut rng, 0.9, 5000).unwrap();
        let mean = lengths.total_turns() as f64 / 5000.0;
        // E[length] = 1 / (1 - w) = 10
        assert!(mean > 9.0 && mean < 11.0, "mean {} not ~10", mean);
    }

    #[test]
    fn test_small_w_gives_unit_lengths() {
        let mut rng = SeededRng::new(&[42u8; 32], 0);
        let lengths = generate_interaction_lengths(&mut rng, 1e-9, 200).unwrap();
        assert!(lengths.iter().all(|l| l == 1));
    }

    #[test]
    fn test_lengths_deterministic() {
        let mut r1 = SeededRng::new(&[3u8; 32], 0);
        let mut r2 = SeededRng::new(&[3u8; 32], 0);
        assert_eq!(
            generate_interaction_lengths(&mut r1, 0.95, 20).unwrap(),
            generate_interaction_lengths(&mut r2, 0.95, 20).unwrap()
        );
    }

    #[test]
    fn test_lengths_reject_bad_w() {
        let mut rng = SeededRng::new(&[42u8; 32], 0);
        for w in [0.0, 1.0, 1.5, -0.2, f64::NAN] {
            let err = generate_interaction_lengths(&mut rng, w, 3).unwrap_err();
            assert!(matches!(
                err.violations(),
                [ConfigViolation::ContinuationProbability(_)]
            ));
        }
    }

    #[test]
    fn test_explicit_lengths_reject_zero() {
        assert!(InteractionLengths::new(vec![3, 1]).is_ok());
        let err = InteractionLengths::new(vec![3, 0, 2, 0]).unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConfigViolation::ZeroLength(1), ConfigViolation::ZeroLength(3)]
        );
    }

    #[test]
    fn test_lengths_reject_empty_set() {
        let err = InteractionLengths::new(vec![]).unwrap_err();
        assert_eq!(err.violations(), &[ConfigViolation::NoMeetings]);

        let mut rng = SeededRng::new(&[42u8; 32], 0);
        let err = generate_interaction_lengths(&mut rng, 0.5, 0).unwrap_err();
        assert_eq!(err.violations(), &[ConfigViolation::NoMeetings]);
    }

    #[test]
    fn test_meeting_length() {
        let m = meeting(StrategyKind::TitForTat, StrategyKind::AllD, 7);
        assert_eq!(m.len(), 7);
    }

    #[test]
    fn test_cooperate_vs_defect() {
        let m = meeting(StrategyKind::AllC, StrategyKind::AllD, 3);
        for turn in m.turns() {
            assert_eq!(*turn, Turn::new(Move::Cooperate, Move::Defect));
        }
        assert_eq!(m.score(&PayoffTable::standard()), (0.0, 15.0));
        assert_eq!(m.cooperations(), (3, 0));
    }

    #[test]
    fn test_tft_vs_always_defect() {
        let m = meeting(StrategyKind::TitForTat, StrategyKind::AllD, 5);

        assert_eq!(m.turns()[0], Turn::new(Move::Cooperate, Move::Defect));
        for turn in m.turns().iter().skip(1) {
            assert_eq!(*turn, Turn::new(Move::Defect, Move::Defect));
        }
    }

    #[test]
    fn test_histories_are_per_side() {
        // STFT opens with D against TFT, then they alternate out of phase
        let m = meeting(StrategyKind::TitForTat, StrategyKind::SuspiciousTitForTat, 4);
        let expected = [
            Turn::new(Move::Cooperate, Move::Defect),
            Turn::new(Move::Defect, Move::Cooperate),
            Turn::new(Move::Cooperate, Move::Defect),
            Turn::new(Move::Defect, Move::Cooperate),
        ];
        assert_eq!(m.turns(), &expected);
    }

    #[test]
    fn test_mirrored_view() {
        let m = meeting(StrategyKind::AllC, StrategyKind::AllD, 2);
        let mirrored = m.mirrored();
        assert!(mirrored.turns().iter().all(|t| *t == Turn::new(Move::Defect, Move::Cooperate)));
        assert_eq!(mirrored.score(&PayoffTable::standard()), (10.0, 0.0));
    }

    #[test]
    fn test_meeting_determinism() {
        let a = StrategyKind::Random { p_cooperate: 0.5 };
        let b = StrategyKind::Joss { p_sneaky: 0.3 };
        assert_eq!(meeting(a, b, 40), meeting(a, b, 40));
    }

    #[test]
    fn test_different_streams_differ() {
        let a = StrategyKind::Random { p_cooperate: 0.5 };
        let payoffs = PayoffTable::standard();
        let m1 = run_meeting(&a, &a, 40, &payoffs, 0.9, &SeededRng::new(&[42u8; 32], 0));
        let m2 = run_meeting(&a, &a, 40, &payoffs, 0.9, &SeededRng::new(&[42u8; 32], 1));
        assert_ne!(m1, m2, "different streams should give different move sequences");
    }

    #[test]
    fn test_self_play_cooperators() {
        let m = meeting(StrategyKind::AllC, StrategyKind::AllC, 6);
        assert_eq!(m.score(&PayoffTable::standard()), (18.0, 18.0));
    }

    proptest! {
        #[test]
        fn prop_lengths_positive(w in 0.01f64..0.99, count in 0usize..40, seed in any::<[u8; 32]>()) {
            let mut rng = SeededRng::new(&seed, 0);
            let lengths = generate_interaction_lengths(&mut rng, w, count).unwrap();
            prop_assert_eq!(lengths.len(), count);
            prop_assert!(lengths.iter().all(|l| l >= 1));
        }
    }
}

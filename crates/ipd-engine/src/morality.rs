//! Cooperation and morality metrics over tournament results
//!
//! The recursive scores treat the cooperation matrix as a vote network, in
//! the spirit of PageRank: a bot scores well by cooperating with bots that
//! themselves score well.

use serde::Serialize;
use tracing::debug;
use crate::config::MoralityConfig;
use crate::error::{ArenaError, Result};
use crate::pairing::round_robin_pairs;
use crate::strategy::Bot;
use crate::tournament::TournamentResult;

/// Square matrix over tournament ids; entry (i, j) is i's cooperation rate
/// when paired with j. Not symmetric in general.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CooperationMatrix {
    size: usize,
    /// Row-major
    values: Vec<f64>,
}

impl CooperationMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build from rows; `None` unless the rows form a square
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            size,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Apply `f` to every entry
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            size: self.size,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Remap rates from [0, 1] onto [-1, 1]: 0 → -1, 0.5 → 0, 1 → 1
    pub fn signed(&self) -> Self {
        self.map(|v| (v - 0.5) * 2.0)
    }

    fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.size)
            .map(|i| self.row(i).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }
}

/// Outcome of a power iteration
#[derive(Clone, Debug, PartialEq)]
pub struct EigenResult {
    /// Normalized so the entries sum to their count
    pub values: Vec<f64>,
    pub iterations: usize,
    /// True when a tolerance was given and reached
    pub converged: bool,
}

/// Scale so the entries sum to their count; all ones when the sum is zero
fn normalize(v: &[f64]) -> Vec<f64> {
    let sum: f64 = v.iter().sum();
    if sum == 0.0 {
        return vec![1.0; v.len()];
    }
    let scale = v.len() as f64 / sum;
    v.iter().map(|x| x * scale).collect()
}

/// Multiply a vector of ones by `matrix` a fixed number of times and
/// normalize the result to sum to its length.
///
/// This is a fixed-budget approximation of the principal eigenvector, with
/// no convergence guarantee. A zero sum yields all ones.
pub fn principal_eigenvector(matrix: &CooperationMatrix, iterations: usize) -> Vec<f64> {
    power_iteration(matrix, iterations, None).values
}

/// Power iteration with an optional early stop.
///
/// With a tolerance, stops once the relative L1 change between successive
/// normalized vectors is below it. Intermediate vectors are rescaled by
/// their largest magnitude; the final normalization is scale-invariant, so
/// this only keeps long runs away from overflow. It also keeps them away
/// from underflow, so a vector whose unscaled entries would all reach zero
/// returns its normalized direction instead of the all-ones fallback.
pub fn power_iteration(
    matrix: &CooperationMatrix,
    max_iterations: usize,
    tolerance: Option<f64>,
) -> EigenResult {
    let mut current = vec![1.0; matrix.size()];
    let mut previous = normalize(&current);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        let mut next = matrix.mul_vec(&current);
        let peak = next.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        if peak > 0.0 && peak.is_finite() {
            next.iter_mut().for_each(|x| *x /= peak);
        }
        current = next;
        iterations += 1;

        if let Some(eps) = tolerance {
            let normalized = normalize(&current);
            let delta: f64 = normalized.iter().zip(&previous).map(|(a, b)| (a - b).abs()).sum();
            let scale: f64 = previous.iter().map(|x| x.abs()).sum();
            previous = normalized;
            if scale > 0.0 && delta / scale < eps {
                converged = true;
                break;
            }
        }
    }

    debug!(iterations, converged, "power iteration finished");
    EigenResult {
        values: normalize(&current),
        iterations,
        converged,
    }
}

/// Which metric to rank bots by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    CooperationRate,
    FairPartner,
    Jesus,
    Moses,
}

/// One bot's morality metrics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoralityRow {
    pub id: usize,
    pub name: String,
    pub cooperation_rate: f64,
    pub fair_partner: f64,
    pub jesus: f64,
    pub moses: f64,
}

/// Per-pair cooperation rates and the per-bot stats derived from them
#[derive(Clone, Debug, PartialEq)]
pub struct CooperationStats {
    pub matrix: CooperationMatrix,
    /// Fraction of distinct partners a bot cooperated at least as much as.
    /// A lone bot has no partners and scores 0.0.
    pub fair_partner: Vec<f64>,
    /// Mean of the bot's matrix row, diagonal included
    pub cooperation_rates: Vec<f64>,
}

/// Build the cooperation matrix and the per-bot stats from raw meetings
pub fn calculate_cooperation_stats(results: &TournamentResult) -> Result<CooperationStats> {
    let n = results.bot_count();
    let mut matrix = CooperationMatrix::zeros(n);
    let mut fair_wins = vec![0usize; n];

    for (i, j) in round_robin_pairs(n) {
        let meetings = results.interactions(i, j).unwrap_or(&[]);
        let total_turns: usize = meetings.iter().map(|m| m.len()).sum();
        if total_turns == 0 {
            return Err(ArenaError::DivisionUndefined { a: i, b: j });
        }
        let (coops_i, coops_j) = meetings.iter().fold((0, 0), |(a, b), m| {
            let (ci, cj) = m.cooperations();
            (a + ci, b + cj)
        });

        let rate_i = coops_i as f64 / total_turns as f64;
        let rate_j = coops_j as f64 / total_turns as f64;
        matrix.set(i, j, rate_i);
        matrix.set(j, i, rate_j);

        // self-pairs are not partnerships
        if i != j {
            if rate_i >= rate_j {
                fair_wins[i] += 1;
            }
            if rate_j >= rate_i {
                fair_wins[j] += 1;
            }
        }
    }

    let cooperation_rates = (0..n)
        .map(|i| matrix.row(i).iter().sum::<f64>() / n as f64)
        .collect();
    let fair_partner = fair_wins
        .iter()
        .map(|&wins| if n > 1 { wins as f64 / (n - 1) as f64 } else { 0.0 })
        .collect();

    Ok(CooperationStats {
        matrix,
        fair_partner,
        cooperation_rates,
    })
}

/// Recursive morality scores as (jesus, moses).
///
/// Jesus runs on the raw rates, so cooperating with anyone only helps.
/// Moses runs on the rates remapped to [-1, 1], so cooperating with a
/// frequent defector counts against a bot.
pub fn calculate_network_morality(
    matrix: &CooperationMatrix,
    config: &MoralityConfig,
) -> (Vec<f64>, Vec<f64>) {
    let jesus = power_iteration(matrix, config.iterations, config.tolerance).values;
    let moses = power_iteration(&matrix.signed(), config.iterations, config.tolerance).values;
    (jesus, moses)
}

/// Morality analysis of one tournament; borrows the result read-only
#[derive(Debug)]
pub struct MoralityCalculator<'a> {
    results: &'a TournamentResult,
    stats: CooperationStats,
    jesus: Vec<f64>,
    moses: Vec<f64>,
}

impl<'a> MoralityCalculator<'a> {
    /// Analyze with the default 100-iteration budget
    pub fn new(results: &'a TournamentResult) -> Result<Self> {
        Self::with_config(results, &MoralityConfig::default())
    }

    pub fn with_config(results: &'a TournamentResult, config: &MoralityConfig) -> Result<Self> {
        let stats = calculate_cooperation_stats(results)?;
        let (jesus, moses) = calculate_network_morality(&stats.matrix, config);
        Ok(Self {
            results,
            stats,
            jesus,
            moses,
        })
    }

    pub fn cooperation_matrix(&self) -> &CooperationMatrix {
        &self.stats.matrix
    }

    pub fn cooperation_rate(&self, id: usize) -> Option<f64> {
        self.stats.cooperation_rates.get(id).copied()
    }

    pub fn fair_partner(&self, id: usize) -> Option<f64> {
        self.stats.fair_partner.get(id).copied()
    }

    pub fn jesus(&self, id: usize) -> Option<f64> {
        self.jesus.get(id).copied()
    }

    pub fn moses(&self, id: usize) -> Option<f64> {
        self.moses.get(id).copied()
    }

    pub fn metric(&self, metric: Metric, id: usize) -> Option<f64> {
        match metric {
            Metric::CooperationRate => self.cooperation_rate(id),
            Metric::FairPartner => self.fair_partner(id),
            Metric::Jesus => self.jesus(id),
            Metric::Moses => self.moses(id),
        }
    }

    /// Bots by descending metric; equal values keep roster order
    pub fn sorted_by(&self, metric: Metric) -> Vec<&'a Bot> {
        let bots = self.results.bots();
        let key = |id: usize| self.metric(metric, id).unwrap_or(f64::NEG_INFINITY);
        let mut ids: Vec<usize> = (0..bots.len()).collect();
        ids.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
        ids.into_iter().map(|id| &bots[id]).collect()
    }

    pub fn sorted_by_cooperation_rate(&self) -> Vec<&'a Bot> {
        self.sorted_by(Metric::CooperationRate)
    }

    pub fn sorted_by_fair_partner(&self) -> Vec<&'a Bot> {
        self.sorted_by(Metric::FairPartner)
    }

    pub fn sorted_by_jesus(&self) -> Vec<&'a Bot> {
        self.sorted_by(Metric::Jesus)
    }

    pub fn sorted_by_moses(&self) -> Vec<&'a Bot> {
        self.sorted_by(Metric::Moses)
    }

    /// Serializable metrics, in score order like the standings
    pub fn rows(&self) -> Vec<MoralityRow> {
        self.results
            .sorted_ids()
            .into_iter()
            .filter_map(|id| {
                Some(MoralityRow {
                    id,
                    name: self.results.name(id)?.to_string(),
                    cooperation_rate: self.cooperation_rate(id)?,
                    fair_partner: self.fair_partner(id)?,
                    jesus: self.jesus(id)?,
                    moses: self.moses(id)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::StrategyKind;
    use crate::config::TournamentConfig;
    use crate::error::ConfigViolation;
    use crate::game::{InteractionLengths, Meeting};
    use crate::pairing::PairTable;
    use crate::payoff::PayoffTable;
    use crate::strategy::{Move, Turn};
    use crate::tournament::Arena;
    use proptest::prelude::*;

    fn run(kinds: &[StrategyKind], lengths: Vec<usize>) -> TournamentResult {
        let config = TournamentConfig::new(lengths.len(), PayoffTable::standard(), 0.5);
        let roster = kinds.iter().map(|k| k.into_bot()).collect();
        Arena::new()
            .run_with_lengths(roster, &config, InteractionLengths::new(lengths).unwrap())
            .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_eigenvector_of_identity_1x1() {
        let m = CooperationMatrix::from_rows(vec![vec![1.0]]).unwrap();
        for iterations in [0, 1, 7, 100] {
            assert_eq!(principal_eigenvector(&m, iterations), vec![1.0]);
        }
    }

    #[test]
    fn test_eigenvector_zero_matrix_falls_back_to_ones() {
        let m = CooperationMatrix::zeros(4);
        assert_eq!(principal_eigenvector(&m, 100), vec![1.0; 4]);
    }

    #[test]
    fn test_eigenvector_sums_to_size() {
        let m = CooperationMatrix::from_rows(vec![
            vec![1.0, 0.5, 0.2],
            vec![0.3, 0.9, 0.1],
            vec![0.0, 0.4, 0.6],
        ])
        .unwrap();
        let v = principal_eigenvector(&m, 100);
        assert!(close(v.iter().sum::<f64>(), 3.0));
        assert!(v.iter().all(|x| *x > 0.0));
    }

    #[test]
    fn test_eigenvector_matches_known_direction() {
        // eigenvalues 3 and 1; principal eigenvector (1, 1)
        let m = CooperationMatrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let v = principal_eigenvector(&m, 50);
        assert!(close(v[0], 1.0) && close(v[1], 1.0), "{:?}", v);

        // diagonal: the dominant entry takes everything
        let m = CooperationMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 0.5]]).unwrap();
        let v = principal_eigenvector(&m, 100);
        assert!(close(v[0], 2.0) && close(v[1], 0.0), "{:?}", v);
    }

    #[test]
    fn test_rescaling_does_not_overflow() {
        let m = CooperationMatrix::from_rows(vec![vec![1e200, 1e200], vec![1e200, 1e200]]).unwrap();
        let v = principal_eigenvector(&m, 100);
        assert!(close(v[0], 1.0) && close(v[1], 1.0), "{:?}", v);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let m = CooperationMatrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let result = power_iteration(&m, 100, Some(1e-12));
        assert!(result.converged);
        assert!(result.iterations < 100);

        let fixed = power_iteration(&m, 100, None);
        assert!(!fixed.converged);
        assert_eq!(fixed.iterations, 100);
    }

    #[test]
    fn test_cooperator_vs_defector_rates() {
        let results = run(&[StrategyKind::AllC, StrategyKind::AllD], vec![3]);
        let calc = MoralityCalculator::new(&results).unwrap();
        let m = calc.cooperation_matrix();

        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(calc.cooperation_rate(0), Some(1.0));
        assert_eq!(calc.cooperation_rate(1), Some(0.0));
        assert_eq!(calc.fair_partner(0), Some(1.0));
        assert_eq!(calc.fair_partner(1), Some(0.0));
    }

    #[test]
    fn test_fair_partner_counts_ties_for_both() {
        let results = run(&[StrategyKind::AllC, StrategyKind::AllC, StrategyKind::AllD], vec![2]);
        let calc = MoralityCalculator::new(&results).unwrap();
        assert_eq!(calc.fair_partner(0), Some(1.0));
        assert_eq!(calc.fair_partner(1), Some(1.0));
        assert_eq!(calc.fair_partner(2), Some(0.0));
    }

    #[test]
    fn test_asymmetric_matrix() {
        // TFT vs ALL_D over 4 turns: TFT cooperates once
        let results = run(&[StrategyKind::TitForTat, StrategyKind::AllD], vec![4]);
        let calc = MoralityCalculator::new(&results).unwrap();
        assert_eq!(calc.cooperation_matrix().get(0, 1), 0.25);
        assert_eq!(calc.cooperation_matrix().get(1, 0), 0.0);
        assert_eq!(calc.cooperation_rate(0), Some((1.0 + 0.25) / 2.0));
    }

    #[test]
    fn test_zero_turn_pair_never_reaches_morality() {
        // an empty meeting disagrees with any valid length, so no result
        // with a zero-turn pair can be built
        let err = TournamentResult::new(
            vec![StrategyKind::AllC.into_bot()],
            InteractionLengths::new(vec![1]).unwrap(),
            PairTable::from_fn(1, |_, _| vec![Meeting::default()]),
            PayoffTable::standard(),
        )
        .unwrap_err();
        assert_eq!(err.violations(), &[ConfigViolation::MeetingLengths { a: 0, b: 0 }]);
    }

    #[test]
    fn test_rows_for_result_built_directly() {
        let cc = Meeting::new(vec![Turn::new(Move::Cooperate, Move::Cooperate); 3]);
        let results = TournamentResult::new(
            vec![StrategyKind::AllC.into_bot(), StrategyKind::TitForTat.into_bot()],
            InteractionLengths::new(vec![3]).unwrap(),
            PairTable::from_fn(2, |_, _| vec![cc.clone()]),
            PayoffTable::standard(),
        )
        .unwrap();
        let rows = MoralityCalculator::new(&results).unwrap().rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.cooperation_rate == 1.0 && r.fair_partner == 1.0));
    }

    #[test]
    fn test_single_bot_roster() {
        let results = run(&[StrategyKind::AllC], vec![2]);
        let calc = MoralityCalculator::new(&results).unwrap();
        assert_eq!(calc.cooperation_rate(0), Some(1.0));
        assert_eq!(calc.fair_partner(0), Some(0.0));
        assert_eq!(calc.jesus(0), Some(1.0));
        assert_eq!(calc.moses(0), Some(1.0));
    }

    #[test]
    fn test_moses_punishes_naive_cooperation() {
        // ALL_C cooperates with ALL_D; TFT mostly does not
        let results = run(
            &[StrategyKind::AllC, StrategyKind::TitForTat, StrategyKind::AllD],
            vec![20],
        );
        let calc = MoralityCalculator::new(&results).unwrap();

        // jesus: ALL_D's weight vanishes after one step, so ALL_C and TFT tie
        assert!(close(calc.jesus(0).unwrap(), calc.jesus(1).unwrap()));
        assert!(close(calc.jesus(2).unwrap(), 0.0));

        // moses: cooperating with ALL_D drags ALL_C below TFT
        assert!(calc.moses(0).unwrap() < calc.moses(1).unwrap());
        assert!(calc.moses(2).unwrap() < 0.0);

        let jesus_sum: f64 = (0..3).map(|i| calc.jesus(i).unwrap()).sum();
        let moses_sum: f64 = (0..3).map(|i| calc.moses(i).unwrap()).sum();
        assert!(close(jesus_sum, 3.0));
        assert!(close(moses_sum, 3.0));

        let order: Vec<_> = calc.sorted_by_jesus().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(order, vec!["ALL_C", "TIT_FOR_TAT", "ALL_D"]);
    }

    #[test]
    fn test_sorted_by_keeps_roster_order_on_ties() {
        let results = run(&[StrategyKind::AllD, StrategyKind::AllC, StrategyKind::AllC], vec![3]);
        let calc = MoralityCalculator::new(&results).unwrap();
        let ids: Vec<_> = calc.sorted_by_cooperation_rate().iter().map(|b| b.tournament_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(0)]);
        let ids: Vec<_> = calc.sorted_by_fair_partner().iter().map(|b| b.tournament_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn test_rows_follow_standings() {
        let results = run(&[StrategyKind::AllC, StrategyKind::AllD], vec![3]);
        let calc = MoralityCalculator::new(&results).unwrap();
        let rows = calc.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "ALL_D");
        assert_eq!(rows[1].cooperation_rate, 1.0);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["id"], 1);
    }

    #[test]
    fn test_configurable_iterations() {
        let results = run(&[StrategyKind::AllC, StrategyKind::AllD], vec![3]);
        let config = MoralityConfig { iterations: 0, tolerance: None };
        let calc = MoralityCalculator::with_config(&results, &config).unwrap();
        assert_eq!(calc.jesus(0), Some(1.0));
        assert_eq!(calc.moses(1), Some(1.0));
    }

    #[test]
    fn test_self_play_history() {
        let results = run(&[StrategyKind::AllC], vec![5]);
        let meeting = results.interaction(0, 0, 0).unwrap();
        assert!(meeting.turns().iter().all(|t| *t == Turn::new(Move::Cooperate, Move::Cooperate)));
        assert_eq!(results.score(0), Some(15.0));
    }

    proptest! {
        #[test]
        fn prop_rate_is_row_mean(seed in any::<[u8; 32]>(), count in 1usize..6) {
            let config = TournamentConfig::new(2, PayoffTable::standard(), 0.8).with_seed(seed);
            let roster = StrategyKind::classic_roster()
                .into_iter()
                .take(count)
                .map(StrategyKind::into_bot)
                .collect();
            let results = Arena::new().run(roster, &config).unwrap();
            let calc = MoralityCalculator::new(&results).unwrap();
            let m = calc.cooperation_matrix();
            for i in 0..count {
                let mean = m.row(i).iter().sum::<f64>() / count as f64;
                prop_assert!(close(calc.cooperation_rate(i).unwrap(), mean));
                prop_assert!(m.row(i).iter().all(|r| (0.0..=1.0).contains(r)));
            }
        }
    }
}

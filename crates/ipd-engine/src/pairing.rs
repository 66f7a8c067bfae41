//! Round-robin pairing and triangular pair storage
//!
//! Every unordered pair (i, j) with i ≤ j is played, self-pairs included,
//! and stored exactly once. Pairs are ranked colexicographically:
//! `rank(i, j) = j(j+1)/2 + i`.

use serde::{Deserialize, Serialize};

/// Number of unordered pairs, self-pairs included: n(n+1)/2
pub fn pair_count(bot_count: usize) -> usize {
    bot_count * (bot_count + 1) / 2
}

/// Rank of an unordered pair; argument order does not matter
pub fn pair_rank(a: usize, b: usize) -> usize {
    let (i, j) = if a <= b { (a, b) } else { (b, a) };
    j * (j + 1) / 2 + i
}

/// Inverse of [`pair_rank`]: rank → (i, j) with i ≤ j
pub fn unrank_pair(rank: usize) -> (usize, usize) {
    // Estimate j via floor(sqrt(8·rank + 1))
    let val = 8 * rank as u64 + 1;
    let mut s = val;
    let mut t = (s + 1) / 2;
    while t < s {
        s = t;
        t = (s + val / s) / 2;
    }
    let mut j = ((s - 1) / 2) as usize;

    // Correct estimate
    while j > 0 && j * (j + 1) / 2 > rank {
        j -= 1;
    }
    while (j + 1) * (j + 2) / 2 <= rank {
        j += 1;
    }

    (rank - j * (j + 1) / 2, j)
}

/// All pairs (i, j ≥ i) in roster order: (0,0), (0,1), …, (0,n−1), (1,1), …
pub fn round_robin_pairs(bot_count: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..bot_count).flat_map(move |i| (i..bot_count).map(move |j| (i, j)))
}

/// Values keyed by unordered bot pair, stored once per pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairTable<T> {
    bot_count: usize,
    entries: Vec<T>,
}

impl<T> PairTable<T> {
    /// Build a table by evaluating `f` for every pair
    pub fn from_fn(bot_count: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let entries = (0..pair_count(bot_count)).map(|rank| {
            let (i, j) = unrank_pair(rank);
            f(i, j)
        });
        Self {
            bot_count,
            entries: entries.collect(),
        }
    }

    /// Build a table from values in rank order
    pub fn from_ranked(bot_count: usize, entries: Vec<T>) -> Option<Self> {
        (entries.len() == pair_count(bot_count)).then_some(Self { bot_count, entries })
    }

    pub fn bot_count(&self) -> usize {
        self.bot_count
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for the unordered pair {a, b}
    pub fn get(&self, a: usize, b: usize) -> Option<&T> {
        if a >= self.bot_count || b >= self.bot_count {
            return None;
        }
        self.entries.get(pair_rank(a, b))
    }

    /// Iterate as ((i, j), value) with i ≤ j, in rank order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(rank, value)| (unrank_pair(rank), value))
    }

    pub fn map<U>(&self, mut f: impl FnMut((usize, usize), &T) -> U) -> PairTable<U> {
        PairTable {
            bot_count: self.bot_count,
            entries: self.iter().map(|(pair, value)| f(pair, value)).collect(),
        }
    }
}

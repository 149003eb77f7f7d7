//! Frequent-itemset mining for subspace cluster seeding.
//!
//! The clustering loop depends on a frequent-itemset oracle only through the
//! [`FrequentItemsetMiner`] contract: given tokenized transactions and a
//! minimum support threshold, return deduplicated itemsets with fractional
//! support. Any correct algorithm can back the contract; [`Apriori`] is the
//! default in-process implementation.
//!
//! # Example
//!
//! ```
//! use diverso::mining::{Apriori, FrequentItemsetMiner};
//!
//! let transactions = vec![
//!     vec!["milk".to_string(), "bread".to_string()],
//!     vec!["milk".to_string(), "bread".to_string()],
//!     vec!["milk".to_string(), "butter".to_string()],
//!     vec!["bread".to_string()],
//! ];
//!
//! let itemsets = Apriori::new().mine(&transactions, 0.5);
//! // {milk}, {bread}, {milk, bread} all clear 50% support
//! assert_eq!(itemsets.len(), 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DiversoError, Result};

/// Quality of an itemset: `support * (1/beta)^dimension`.
///
/// `beta` in (0, 1) controls the trade-off between high-dimensional,
/// low-support itemsets and low-dimensional, high-support ones; smaller
/// `beta` favors more dimensions.
#[must_use]
pub fn quality(support: f64, dimension: usize, beta: f64) -> f64 {
    support * (1.0 / beta).powi(dimension as i32)
}

/// Contract between the clustering loop and a frequent-itemset oracle.
///
/// Implementations must return deduplicated itemsets whose supports are
/// fractions of the input transaction count, ordered by support descending
/// then lexicographically so that downstream tie-breaks are deterministic.
pub trait FrequentItemsetMiner {
    /// Mines all itemsets with support at least `min_support`.
    fn mine(&self, transactions: &[Vec<String>], min_support: f64) -> Vec<(Vec<String>, f64)>;
}

/// Selects the quality-maximal itemset from an oracle's output.
///
/// Selection uses strict comparison, so among equal-quality candidates the
/// first in the oracle's documented order wins.
///
/// # Errors
///
/// Returns [`DiversoError::NoFrequentItemset`] if nothing clears
/// `min_support`.
pub fn best_itemset<M: FrequentItemsetMiner>(
    miner: &M,
    transactions: &[Vec<String>],
    min_support: f64,
    beta: f64,
) -> Result<(Vec<String>, f64)> {
    let mut iter = miner.mine(transactions, min_support).into_iter();
    let Some(mut best) = iter.next() else {
        return Err(DiversoError::NoFrequentItemset { min_support });
    };
    let mut best_quality = quality(best.1, best.0.len(), beta);
    for candidate in iter {
        let q = quality(candidate.1, candidate.0.len(), beta);
        if q > best_quality {
            best_quality = q;
            best = candidate;
        }
    }
    Ok(best)
}

/// Apriori frequent-itemset mining over string tokens.
///
/// Level-wise search: frequent 1-itemsets, then candidate k-itemsets joined
/// from frequent (k-1)-itemsets, pruned first by the infrequent-subset rule
/// and then by support, until no level survives.
///
/// # Example
///
/// ```
/// use diverso::mining::{Apriori, FrequentItemsetMiner};
///
/// let transactions: Vec<Vec<String>> = vec![
///     vec!["a".into(), "b".into(), "c".into()],
///     vec!["a".into(), "b".into()],
///     vec!["a".into(), "c".into()],
///     vec!["b".into(), "c".into()],
/// ];
///
/// let itemsets = Apriori::new().mine(&transactions, 0.5);
/// assert!(itemsets.iter().any(|(set, _)| set == &["a".to_string(), "b".to_string()]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Apriori;

impl Apriori {
    /// Creates a new Apriori miner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Find all frequent 1-itemsets.
    fn frequent_singletons<'a>(
        transactions: &[BTreeSet<&'a str>],
        min_support: f64,
    ) -> Vec<(BTreeSet<&'a str>, f64)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for transaction in transactions {
            for &item in transaction {
                *counts.entry(item).or_insert(0) += 1;
            }
        }

        let n = transactions.len() as f64;
        let mut frequent = Vec::new();
        for (item, count) in counts {
            let support = count as f64 / n;
            if support >= min_support {
                let mut itemset = BTreeSet::new();
                itemset.insert(item);
                frequent.push((itemset, support));
            }
        }
        frequent
    }

    /// Generate candidate k-itemsets from frequent (k-1)-itemsets.
    fn join_candidates<'a>(prev: &[(BTreeSet<&'a str>, f64)]) -> Vec<BTreeSet<&'a str>> {
        let mut candidates: Vec<BTreeSet<&str>> = Vec::new();

        for i in 0..prev.len() {
            for j in (i + 1)..prev.len() {
                let union: BTreeSet<&str> = prev[i].0.union(&prev[j].0).copied().collect();

                // join step: the pair must differ by exactly one item
                if union.len() != prev[i].0.len() + 1 {
                    continue;
                }
                if Self::has_infrequent_subset(&union, prev) {
                    continue;
                }
                if !candidates.contains(&union) {
                    candidates.push(union);
                }
            }
        }
        candidates
    }

    /// Check if any (k-1)-subset of `itemset` is infrequent.
    fn has_infrequent_subset(itemset: &BTreeSet<&str>, prev: &[(BTreeSet<&str>, f64)]) -> bool {
        for &item in itemset {
            let mut subset = itemset.clone();
            subset.remove(item);
            if !prev.iter().any(|(freq, _)| freq == &subset) {
                return true;
            }
        }
        false
    }

    /// Keep candidates clearing the minimum support.
    fn prune_by_support<'a>(
        candidates: Vec<BTreeSet<&'a str>>,
        transactions: &[BTreeSet<&'a str>],
        min_support: f64,
    ) -> Vec<(BTreeSet<&'a str>, f64)> {
        let mut frequent = Vec::new();
        for candidate in candidates {
            let support = Self::support(&candidate, transactions);
            if support >= min_support {
                frequent.push((candidate, support));
            }
        }
        frequent
    }

    /// Fraction of transactions containing every item of `itemset`.
    fn support(itemset: &BTreeSet<&str>, transactions: &[BTreeSet<&str>]) -> f64 {
        if transactions.is_empty() {
            return 0.0;
        }
        let count = transactions
            .iter()
            .filter(|transaction| itemset.is_subset(transaction))
            .count();
        count as f64 / transactions.len() as f64
    }
}

impl FrequentItemsetMiner for Apriori {
    fn mine(&self, transactions: &[Vec<String>], min_support: f64) -> Vec<(Vec<String>, f64)> {
        if transactions.is_empty() {
            return Vec::new();
        }

        let sets: Vec<BTreeSet<&str>> = transactions
            .iter()
            .map(|t| t.iter().map(String::as_str).collect())
            .collect();

        let mut all: Vec<(BTreeSet<&str>, f64)> = Vec::new();
        let mut current = Self::frequent_singletons(&sets, min_support);
        while !current.is_empty() {
            all.extend(current.iter().cloned());
            let candidates = Self::join_candidates(&current);
            if candidates.is_empty() {
                break;
            }
            current = Self::prune_by_support(candidates, &sets, min_support);
        }

        let mut itemsets: Vec<(Vec<String>, f64)> = all
            .into_iter()
            .map(|(set, support)| (set.into_iter().map(str::to_string).collect(), support))
            .collect();

        // support descending, then lexicographic: the documented order that
        // makes downstream first-seen tie-breaks deterministic
        itemsets.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .expect("Support values must be valid f64 (not NaN)")
                .then_with(|| a.0.cmp(&b.0))
        });
        itemsets
    }
}

//! Dense subspace clustering driven by frequent itemsets and diversity ranks.
//!
//! [`SubspaceClusterer`] runs the full loop over a categorical transaction
//! table: seed a candidate cluster from the best-quality frequent itemset,
//! refine it by removing members whose diversity rank is anomalous, shrink
//! the table, repeat, and optionally merge clusters pairwise down to a target
//! count. The result is a partition of the input row ids into clusters plus
//! noise.
//!
//! # Algorithm
//!
//! 1. **Seeding**: mine the working table; pick the itemset maximizing
//!    `quality(support, dimension) = support * (1/beta)^dimension`; its
//!    matching rows form the candidate cluster.
//! 2. **Refining**: score each member's hierarchy-known tokens with the
//!    [`DiversityScorer`] and apply the configured [`OutlierPolicy`].
//! 3. Remove surviving members from the table; repeat while the table still
//!    holds at least `min_cluster_size` rows.
//! 4. **Merging** (optional): repeatedly replace the best-scoring cluster
//!    pair with their union until the target count is reached or the best
//!    pair shares no dimensions.
//!
//! # Examples
//!
//! ```
//! use diverso::cluster::{SubspaceClusterer, Transaction};
//! use diverso::diversity::DiversityScorer;
//! use diverso::hierarchy::HierarchyTree;
//! use diverso::mining::Apriori;
//!
//! let mut tree = HierarchyTree::new();
//! tree.insert(&["pos", "p"]).unwrap();
//! tree.insert(&["pos", "q"]).unwrap();
//! tree.insert(&["neg", "r"]).unwrap();
//! let height = tree.height();
//! let unbalanced = tree.leaf_codes();
//! let balanced = tree.balanced(height).leaf_codes();
//! let scorer = DiversityScorer::new(balanced, unbalanced, height);
//!
//! // one dense 4-row block over {p, q}, two sparse rows
//! let table = vec![
//!     Transaction::new(1, vec!["p".into(), "q".into()]),
//!     Transaction::new(2, vec!["p".into(), "q".into()]),
//!     Transaction::new(3, vec!["p".into(), "q".into(), "r".into()]),
//!     Transaction::new(4, vec!["p".into(), "q".into()]),
//!     Transaction::new(5, vec!["r".into()]),
//!     Transaction::new(6, vec!["q".into()]),
//! ];
//!
//! let mut clusterer = SubspaceClusterer::new()
//!     .with_min_support(0.5)
//!     .with_beta(0.25)
//!     .with_min_cluster_size(3);
//! clusterer.fit(&table, &scorer, &Apriori::new()).unwrap();
//!
//! assert_eq!(clusterer.clusters().len(), 1);
//! assert_eq!(clusterer.clusters()[0].members, vec![1, 2, 3, 4]);
//! assert_eq!(clusterer.noise(), &[5, 6]);
//! ```

use serde::{Deserialize, Serialize};

use crate::diversity::DiversityScorer;
use crate::error::{DiversoError, Result};
use crate::mining::{best_itemset, quality, FrequentItemsetMiner};

/// One categorical transaction: a unique row id and its value tokens.
///
/// Row-id uniqueness is a caller precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique row identifier.
    pub id: usize,
    /// Attribute-value tokens present in this row.
    pub items: Vec<String>,
}

impl Transaction {
    /// Creates a transaction from a row id and its tokens.
    #[must_use]
    pub fn new(id: usize, items: Vec<String>) -> Self {
        Self { id, items }
    }

    fn satisfies(&self, dimensions: &[String]) -> bool {
        dimensions.iter().all(|d| self.items.contains(d))
    }
}

/// A dense subspace cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// The itemset defining the cluster's subspace.
    pub dimensions: Vec<String>,
    /// Row ids of the member transactions, sorted ascending on emission.
    pub members: Vec<usize>,
    /// Diversity scores of the members, aligned with `members` and retained
    /// across merges.
    pub diversity: Vec<f64>,
}

/// Final clustering: a partition of the input row ids.
///
/// Every input row id appears exactly once, either in some cluster's members
/// or in `noise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubspaceClustering {
    /// Discovered clusters, in discovery/merge order.
    pub clusters: Vec<Cluster>,
    /// Rows never absorbed into any cluster, in input order.
    pub noise: Vec<usize>,
}

/// Outlier-removal strategy applied to a candidate cluster's
/// `(row id, diversity score)` list during refinement.
///
/// The policy is a configuration choice; swapping it never touches the
/// mining loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutlierPolicy {
    /// Keep every member.
    Keep,
    /// Keep members whose score does not exceed `cutoff`.
    Threshold {
        /// Maximum admissible diversity score.
        cutoff: f64,
    },
    /// Sort by score; repeatedly drop the extreme point whose gap to its
    /// neighbour exceeds `min_gap`. Needs more than two points to act.
    Extremes {
        /// Minimum neighbour gap that marks an extreme as an outlier.
        min_gap: f64,
    },
    /// Sort by score, split into contiguous runs wherever the gap between
    /// consecutive scores exceeds `min_gap`, keep only the largest run.
    GapSegmentation {
        /// Gap that separates two runs.
        min_gap: f64,
    },
    /// Repeatedly drop whichever of the maximum and minimum score lies
    /// Euclidean-further from the full score vector, while that distance
    /// clears `min_distance`.
    DistanceFromCenter {
        /// Minimum distance for a point to count as an outlier.
        min_distance: f64,
    },
}

impl OutlierPolicy {
    /// Applies the policy, returning the retained `(id, score)` pairs.
    #[must_use]
    pub fn refine(&self, scored: &[(usize, f64)]) -> Vec<(usize, f64)> {
        match *self {
            OutlierPolicy::Keep => scored.to_vec(),
            OutlierPolicy::Threshold { cutoff } => scored
                .iter()
                .copied()
                .filter(|&(_, score)| score <= cutoff)
                .collect(),
            OutlierPolicy::Extremes { min_gap } => refine_extremes(scored, min_gap),
            OutlierPolicy::GapSegmentation { min_gap } => refine_gap_segments(scored, min_gap),
            OutlierPolicy::DistanceFromCenter { min_distance } => {
                refine_distance(scored, min_distance)
            }
        }
    }
}

fn sort_by_score(scored: &[(usize, f64)]) -> Vec<(usize, f64)> {
    let mut sorted = scored.to_vec();
    sorted.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .expect("Diversity scores must be valid f64 (not NaN)")
    });
    sorted
}

fn refine_extremes(scored: &[(usize, f64)], min_gap: f64) -> Vec<(usize, f64)> {
    let mut sorted = sort_by_score(scored);
    while sorted.len() > 2 {
        let n = sorted.len();
        if sorted[n - 1].1 - sorted[n - 2].1 > min_gap {
            sorted.pop();
        } else if sorted[1].1 - sorted[0].1 > min_gap {
            sorted.remove(0);
        } else {
            break;
        }
    }
    sorted
}

fn refine_gap_segments(scored: &[(usize, f64)], min_gap: f64) -> Vec<(usize, f64)> {
    let sorted = sort_by_score(scored);
    if sorted.is_empty() {
        return sorted;
    }

    let mut runs: Vec<Vec<(usize, f64)>> = Vec::new();
    let mut run = vec![sorted[0]];
    for pair in sorted.windows(2) {
        if pair[1].1 - pair[0].1 > min_gap {
            runs.push(std::mem::take(&mut run));
        }
        run.push(pair[1]);
    }
    runs.push(run);

    // strictly larger wins, so the lowest-scoring run wins ties
    let mut largest: &Vec<(usize, f64)> = &runs[0];
    for candidate in &runs[1..] {
        if candidate.len() > largest.len() {
            largest = candidate;
        }
    }
    largest.clone()
}

fn refine_distance(scored: &[(usize, f64)], min_distance: f64) -> Vec<(usize, f64)> {
    let mut kept = scored.to_vec();
    while !kept.is_empty() {
        let scores: Vec<f64> = kept.iter().map(|&(_, s)| s).collect();
        let distance = |x: f64| -> f64 {
            scores.iter().map(|s| (s - x) * (s - x)).sum::<f64>().sqrt()
        };

        let max_idx = index_of_extreme(&scores, |a, b| a > b);
        let min_idx = index_of_extreme(&scores, |a, b| a < b);
        let dist_max = distance(scores[max_idx]);
        let dist_min = distance(scores[min_idx]);

        if dist_max > dist_min && dist_max >= min_distance {
            kept.remove(max_idx);
        } else if dist_max < dist_min && dist_min >= min_distance {
            kept.remove(min_idx);
        } else {
            break;
        }
    }
    kept
}

/// First index winning every strict comparison against the current extreme.
fn index_of_extreme(scores: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut idx = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if better(score, scores[idx]) {
            idx = i;
        }
    }
    idx
}

/// Iterative subspace clusterer over a categorical transaction table.
///
/// Builder-configured, single use per dataset: construct, call
/// [`SubspaceClusterer::fit`], then read the results. The table shrinks
/// monotonically during a run and the merge loop strictly decreases the
/// cluster count, so every run terminates.
#[derive(Debug, Clone)]
pub struct SubspaceClusterer {
    min_support: f64,
    beta: f64,
    min_cluster_size: usize,
    outlier_policy: OutlierPolicy,
    target_clusters: Option<usize>,
    clustering: Option<SubspaceClustering>,
}

impl Default for SubspaceClusterer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubspaceClusterer {
    /// Creates a clusterer with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - `min_support`: 0.5
    /// - `beta`: 0.25
    /// - `min_cluster_size`: 5
    /// - `outlier_policy`: [`OutlierPolicy::Keep`]
    /// - `target_clusters`: none (merging disabled)
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_support: 0.5,
            beta: 0.25,
            min_cluster_size: 5,
            outlier_policy: OutlierPolicy::Keep,
            target_clusters: None,
            clustering: None,
        }
    }

    /// Sets the minimum support threshold passed to the itemset oracle.
    #[must_use]
    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    /// Sets the dimension/support trade-off for itemset quality.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the minimum cluster size.
    ///
    /// Seeding stops once the working table shrinks below this, and a best
    /// itemset whose estimated member count falls below it is rejected.
    #[must_use]
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Sets the outlier-removal policy applied during refinement.
    #[must_use]
    pub fn with_outlier_policy(mut self, outlier_policy: OutlierPolicy) -> Self {
        self.outlier_policy = outlier_policy;
        self
    }

    /// Enables pairwise merging down to `target_clusters` clusters.
    #[must_use]
    pub fn with_target_clusters(mut self, target_clusters: usize) -> Self {
        self.target_clusters = Some(target_clusters);
        self
    }

    /// Returns true if the clusterer has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.clustering.is_some()
    }

    /// Returns the full clustering result.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn clustering(&self) -> &SubspaceClustering {
        self.clustering
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the discovered clusters.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clustering().clusters
    }

    /// Returns the row ids never absorbed into any cluster.
    ///
    /// # Panics
    ///
    /// Panics if the model is not fitted.
    #[must_use]
    pub fn noise(&self) -> &[usize] {
        &self.clustering().noise
    }

    fn validate(&self) -> Result<()> {
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(DiversoError::InvalidHyperparameter {
                param: "beta".to_string(),
                value: self.beta.to_string(),
                constraint: "0 < beta < 1".to_string(),
            });
        }
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(DiversoError::InvalidHyperparameter {
                param: "min_support".to_string(),
                value: self.min_support.to_string(),
                constraint: "0 < min_support <= 1".to_string(),
            });
        }
        if self.min_cluster_size == 0 {
            return Err(DiversoError::InvalidHyperparameter {
                param: "min_cluster_size".to_string(),
                value: "0".to_string(),
                constraint: "min_cluster_size >= 1".to_string(),
            });
        }
        Ok(())
    }

    /// Runs the clustering loop over the transaction table.
    ///
    /// The table is consumed logically, never mutated: `fit` works on an
    /// internal copy that shrinks as clusters absorb rows. A fresh clusterer
    /// must be constructed per dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DiversoError::InvalidHyperparameter`] for out-of-domain
    /// configuration and [`DiversoError::UnknownConcept`] if the scorer's
    /// code maps are inconsistent with each other. Exhausted itemsets and
    /// degenerate merges terminate the loop gracefully instead of failing.
    pub fn fit<M: FrequentItemsetMiner>(
        &mut self,
        transactions: &[Transaction],
        scorer: &DiversityScorer,
        miner: &M,
    ) -> Result<()> {
        self.validate()?;

        let mut table: Vec<Transaction> = transactions.to_vec();
        let mut clusters: Vec<Cluster> = Vec::new();

        // Seeding / Refining loop: each pass either shrinks the table by a
        // full cluster or terminates.
        while table.len() >= self.min_cluster_size {
            let rows: Vec<Vec<String>> = table.iter().map(|t| t.items.clone()).collect();
            let (dimensions, support) =
                match best_itemset(miner, &rows, self.min_support, self.beta) {
                    Ok(best) => best,
                    Err(DiversoError::NoFrequentItemset { .. }) => break,
                    Err(e) => return Err(e),
                };

            if support * (table.len() as f64) < self.min_cluster_size as f64 {
                break;
            }

            let mut scored: Vec<(usize, f64)> = Vec::new();
            for transaction in table.iter().filter(|t| t.satisfies(&dimensions)) {
                let known: Vec<&str> = transaction
                    .items
                    .iter()
                    .map(String::as_str)
                    .filter(|item| scorer.knows(item))
                    .collect();
                scored.push((transaction.id, scorer.score(&known)?));
            }

            let kept = self.outlier_policy.refine(&scored);
            if kept.is_empty() {
                // the table would not shrink; terminate rather than spin
                break;
            }

            let cluster = Cluster {
                dimensions,
                members: kept.iter().map(|&(id, _)| id).collect(),
                diversity: kept.iter().map(|&(_, score)| score).collect(),
            };
            table.retain(|t| !cluster.members.contains(&t.id));
            clusters.push(cluster);
        }

        if let Some(target) = self.target_clusters {
            while clusters.len() > target {
                match merge_step(&mut clusters, self.beta) {
                    Ok(()) => {}
                    Err(DiversoError::DegenerateMerge) => break,
                    Err(e) => return Err(e),
                }
            }
        }

        for cluster in &mut clusters {
            sort_members(cluster);
        }
        let noise = table.into_iter().map(|t| t.id).collect();

        self.clustering = Some(SubspaceClustering { clusters, noise });
        Ok(())
    }
}

/// Union of two clusters: dimension intersection, member and diversity
/// concatenation.
fn cluster_union(a: &Cluster, b: &Cluster) -> Cluster {
    let dimensions: Vec<String> = a
        .dimensions
        .iter()
        .filter(|d| b.dimensions.contains(d))
        .cloned()
        .collect();
    let mut members = a.members.clone();
    members.extend(b.members.iter().copied());
    let mut diversity = a.diversity.clone();
    diversity.extend(b.diversity.iter().copied());
    Cluster {
        dimensions,
        members,
        diversity,
    }
}

/// Merge quality: `quality(|members|, |dimensions|)` on raw counts, forced to
/// zero when the union shares no dimensions.
fn merge_score(merged: &Cluster, beta: f64) -> f64 {
    if merged.dimensions.is_empty() {
        return 0.0;
    }
    quality(merged.members.len() as f64, merged.dimensions.len(), beta)
}

/// Replaces the best-scoring cluster pair with their union.
///
/// Pairs are compared by the quality of their union over ordered index
/// pairs; strict comparison keeps the first-seen pair on ties.
///
/// # Errors
///
/// Returns [`DiversoError::DegenerateMerge`] when the best pair's union has
/// no dimensions; merging past that point would erase cluster coherence.
fn merge_step(clusters: &mut Vec<Cluster>, beta: f64) -> Result<()> {
    if clusters.len() < 2 {
        return Err(DiversoError::DegenerateMerge);
    }

    let mut best = (0, 1);
    let mut best_union = cluster_union(&clusters[0], &clusters[1]);
    let mut best_score = merge_score(&best_union, beta);
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            if (i, j) == (0, 1) {
                continue;
            }
            let union = cluster_union(&clusters[i], &clusters[j]);
            let score = merge_score(&union, beta);
            if score > best_score {
                best = (i, j);
                best_union = union;
                best_score = score;
            }
        }
    }

    if best_score == 0.0 {
        return Err(DiversoError::DegenerateMerge);
    }

    // j > i, so remove in reverse order
    clusters.remove(best.1);
    clusters.remove(best.0);
    clusters.push(best_union);
    Ok(())
}

/// Sorts members ascending, carrying diversity scores along.
fn sort_members(cluster: &mut Cluster) {
    let mut pairs: Vec<(usize, f64)> = cluster
        .members
        .iter()
        .copied()
        .zip(cluster.diversity.iter().copied())
        .collect();
    pairs.sort_by_key(|&(id, _)| id);
    cluster.members = pairs.iter().map(|&(id, _)| id).collect();
    cluster.diversity = pairs.iter().map(|&(_, score)| score).collect();
}

//! Diversity-rank scoring over concept hierarchies.
//!
//! The diversity rank of a set of concepts measures how spread the concepts
//! are across the hierarchy: 0 means they collapse to one shared ancestor
//! close to the leaves, higher values mean they stay distinct up to levels
//! near the root. The score is computed by iterative level reduction over the
//! leaf codes produced by [`crate::hierarchy::HierarchyTree`]: at each level
//! every code is truncated by one segment, and the contribution of that level
//! is the product of a triangular level weight and the fraction of codes that
//! survived the merge.
//!
//! The normative variant additionally tracks the unbalanced-tree codes and
//! scales each level by an adjustment factor, penalizing levels where the
//! merged edges are synthetic padding from balancing rather than original
//! hierarchy structure. Disable it with
//! [`DiversityScorer::with_adjustment`]`(false)` for the plain measure.
//!
//! # Examples
//!
//! ```
//! use diverso::diversity::DiversityScorer;
//! use diverso::hierarchy::HierarchyTree;
//!
//! let mut tree = HierarchyTree::new();
//! tree.insert(&["A", "A1", "a1x"]).unwrap();
//! tree.insert(&["A", "A1", "a1y"]).unwrap();
//! tree.insert(&["B", "B1", "b1x"]).unwrap();
//!
//! let height = tree.height();
//! let unbalanced = tree.leaf_codes();
//! let balanced = tree.balanced(height).leaf_codes();
//! let scorer = DiversityScorer::new(balanced, unbalanced, height);
//!
//! // concepts diverging at the root are more diverse than leaf siblings
//! let spread = scorer.score(&["a1x", "b1x"]).unwrap();
//! let tight = scorer.score(&["a1x", "a1y"]).unwrap();
//! assert!(spread > tight);
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::error::{DiversoError, Result};

/// Triangular level weight: differences near the root (small `level`) weigh
/// more than differences near the leaves.
///
/// `level_factor(h, l) = 2*(h - l) / ((h - 1) * h)`
#[must_use]
pub fn level_factor(height: usize, level: usize) -> f64 {
    let h = height as f64;
    let l = level as f64;
    2.0 * (h - l) / ((h - 1.0) * h)
}

/// Fraction of distinct codes surviving a one-level merge.
///
/// `parent_count` is the size of the truncated, deduplicated set at level `l`;
/// `child_count` the size of the set at level `l + 1`. The scoring loop only
/// evaluates this while `child_count > 1`, so the denominator never vanishes;
/// a full collapse (`parent_count == 1`) contributes zero.
#[must_use]
pub fn merging_factor(parent_count: usize, child_count: usize) -> f64 {
    (parent_count as f64 - 1.0) / (child_count as f64 - 1.0)
}

/// Fraction of merged edges that exist in the unbalanced tree.
///
/// `eub` counts unbalanced-tree codes truncated at this level (codes still
/// padded from balancing do not move); `eb` counts balanced-tree codes, which
/// all truncate every level.
#[must_use]
pub fn adjustment_factor(eub: usize, eb: usize) -> f64 {
    eub as f64 / eb as f64
}

/// Scores how spread a set of leaf concepts is across the hierarchy.
///
/// Holds the balanced and unbalanced leaf-code maps and the balanced tree
/// height; all three come from one [`crate::hierarchy::HierarchyTree`] built
/// for the run. The scorer is read-only and retains no cross-call state.
#[derive(Debug, Clone)]
pub struct DiversityScorer {
    balanced: HashMap<String, String>,
    unbalanced: HashMap<String, String>,
    height: usize,
    adjustment: bool,
    segment_offset: usize,
}

impl DiversityScorer {
    /// Creates a scorer over the two code maps of one hierarchy.
    ///
    /// # Default Parameters
    ///
    /// - adjustment factor: enabled (the normative variant)
    /// - segment offset: 0 (score full codes)
    #[must_use]
    pub fn new(
        balanced: HashMap<String, String>,
        unbalanced: HashMap<String, String>,
        height: usize,
    ) -> Self {
        Self {
            balanced,
            unbalanced,
            height,
            adjustment: true,
            segment_offset: 0,
        }
    }

    /// Enables or disables the adjustment factor.
    ///
    /// Disabled, the scorer computes the plain level/merging product, a
    /// documented fallback that ignores which merges are synthetic padding.
    #[must_use]
    pub fn with_adjustment(mut self, adjustment: bool) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// Sets the number of leading code segments dropped before scoring.
    ///
    /// Callers pass the intended first concept-path segment; offset 0 keeps
    /// the shared root segment, which never affects the score ordering.
    #[must_use]
    pub fn with_segment_offset(mut self, segment_offset: usize) -> Self {
        self.segment_offset = segment_offset;
        self
    }

    /// Height of the balanced hierarchy this scorer was built for.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True if `name` is a known hierarchy leaf.
    ///
    /// The clustering loop uses this to silently drop non-hierarchy tokens
    /// from a row before scoring it.
    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.balanced.contains_key(name)
    }

    /// Computes the diversity rank of a multiset of leaf concept names.
    ///
    /// Fewer than two distinct concepts score 0: no merging occurs. The score
    /// is non-negative, finite, and deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`DiversoError::UnknownConcept`] if any item is absent from a
    /// code map. This is a precondition violation by the caller and is never
    /// silently defaulted.
    pub fn score<S: AsRef<str>>(&self, items: &[S]) -> Result<f64> {
        let mut balanced = BTreeSet::new();
        let mut unbalanced = BTreeSet::new();
        for item in items {
            let item = item.as_ref();
            let code_b = self
                .balanced
                .get(item)
                .ok_or_else(|| DiversoError::unknown_concept(item))?;
            let code_ub = self
                .unbalanced
                .get(item)
                .ok_or_else(|| DiversoError::unknown_concept(item))?;
            balanced.insert(strip_segments(code_b, self.segment_offset));
            unbalanced.insert(strip_segments(code_ub, self.segment_offset));
        }

        let mut score = 0.0;
        let mut level = self.height;
        while balanced.len() > 1 {
            level = level.saturating_sub(1);

            // eb counts truncations before deduplication
            let eb = balanced.len();
            let parents: BTreeSet<String> = balanced.iter().map(|c| truncate(c)).collect();

            let mut contribution =
                level_factor(self.height, level) * merging_factor(parents.len(), eb);

            if self.adjustment {
                let max_depth = unbalanced
                    .iter()
                    .map(|c| segment_count(c))
                    .max()
                    .unwrap_or(0);
                let mut eub = 0;
                let mut next = BTreeSet::new();
                for code in &unbalanced {
                    if segment_count(code) == max_depth {
                        next.insert(truncate(code));
                        eub += 1;
                    } else {
                        next.insert(code.clone());
                    }
                }
                contribution *= adjustment_factor(eub, eb);
                unbalanced = next;
            }

            score += contribution;
            balanced = parents;
        }
        Ok(score)
    }
}

/// Drops the first `offset` plus-joined segments of a code.
fn strip_segments(code: &str, offset: usize) -> String {
    let mut segments = code.split('+');
    for _ in 0..offset {
        if segments.next().is_none() {
            return String::new();
        }
    }
    segments.collect::<Vec<_>>().join("+")
}

/// Truncates a code by one segment from the right, moving to the parent path.
fn truncate(code: &str) -> String {
    match code.rsplit_once('+') {
        Some((head, _)) => head.to_string(),
        None => String::new(),
    }
}

fn segment_count(code: &str) -> usize {
    code.split('+').count()
}

//! # Diverso - Diversity-Rank Subspace Clustering
//!
//! A pure-Rust library for clustering categorical transaction data in
//! subspaces, using concept-hierarchy diversity ranks to refine clusters.
//!
//! ## Modules
//!
//! - [`hierarchy`]: Concept hierarchy trees with positional leaf codes and
//!   height balancing
//! - [`diversity`]: Diversity-rank scoring by iterative level reduction over
//!   leaf codes
//! - [`mining`]: Frequent itemset mining (Apriori) and itemset quality
//! - [`cluster`]: The subspace clustering loop with pluggable outlier
//!   policies and pairwise merging
//! - [`error`]: Error types
//! - [`prelude`]: Convenience re-exports
//!
//! ## Quick Start
//!
//! ```
//! use diverso::prelude::*;
//!
//! // build the concept hierarchy the data is described by
//! let mut tree = HierarchyTree::new();
//! tree.insert(&["fruit", "apple"]).unwrap();
//! tree.insert(&["fruit", "pear"]).unwrap();
//! tree.insert(&["dairy", "milk"]).unwrap();
//!
//! let height = tree.height();
//! let scorer = DiversityScorer::new(
//!     tree.balanced(height).leaf_codes(),
//!     tree.leaf_codes(),
//!     height,
//! );
//!
//! let table = vec![
//!     Transaction::new(1, vec!["apple".into(), "pear".into()]),
//!     Transaction::new(2, vec!["apple".into(), "pear".into()]),
//!     Transaction::new(3, vec!["apple".into(), "pear".into()]),
//!     Transaction::new(4, vec!["milk".into()]),
//! ];
//!
//! let mut clusterer = SubspaceClusterer::new().with_min_cluster_size(3);
//! clusterer.fit(&table, &scorer, &Apriori::new()).unwrap();
//! assert_eq!(clusterer.clusters()[0].members, vec![1, 2, 3]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod diversity;
pub mod error;
pub mod hierarchy;
pub mod mining;
pub mod prelude;

pub use error::{DiversoError, Result};

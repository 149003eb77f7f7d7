//! Convenience re-exports of the main Diverso types.
//!
//! ```
//! use diverso::prelude::*;
//! ```

pub use crate::cluster::{
    Cluster, OutlierPolicy, SubspaceClusterer, SubspaceClustering, Transaction,
};
pub use crate::diversity::DiversityScorer;
pub use crate::error::{DiversoError, Result};
pub use crate::hierarchy::HierarchyTree;
pub use crate::mining::{quality, Apriori, FrequentItemsetMiner};

//! End-to-end tests for the full clustering pipeline: hierarchy construction,
//! diversity scoring, itemset mining, and the subspace clustering loop.

use std::collections::BTreeSet;

use proptest::prelude::*;

use diverso::prelude::*;

/// A two-department retail hierarchy with one shallow branch, so the
/// balanced and unbalanced code maps genuinely differ.
fn retail_tree() -> HierarchyTree {
    let mut tree = HierarchyTree::new();
    tree.insert(&["food", "fruit", "apple"]).unwrap();
    tree.insert(&["food", "fruit", "pear"]).unwrap();
    tree.insert(&["food", "dairy", "milk"]).unwrap();
    tree.insert(&["food", "dairy", "cheese"]).unwrap();
    tree.insert(&["household", "soap"]).unwrap();
    tree
}

fn retail_scorer() -> DiversityScorer {
    let tree = retail_tree();
    let height = tree.height();
    DiversityScorer::new(tree.balanced(height).leaf_codes(), tree.leaf_codes(), height)
}

fn tx(id: usize, items: &[&str]) -> Transaction {
    Transaction::new(id, items.iter().map(|s| (*s).to_string()).collect())
}

fn retail_table() -> Vec<Transaction> {
    vec![
        tx(1, &["apple", "pear"]),
        tx(2, &["apple", "pear"]),
        tx(3, &["apple", "pear", "soap"]),
        tx(4, &["apple", "pear"]),
        tx(5, &["milk", "cheese"]),
        tx(6, &["milk", "cheese"]),
        tx(7, &["milk", "cheese"]),
        tx(8, &["soap"]),
    ]
}

#[test]
fn test_pipeline_finds_fruit_cluster_first() {
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    clusterer
        .fit(&retail_table(), &retail_scorer(), &Apriori::new())
        .unwrap();

    let clusters = clusterer.clusters();
    assert!(!clusters.is_empty());
    assert_eq!(
        clusters[0].dimensions,
        vec!["apple".to_string(), "pear".to_string()]
    );
    assert_eq!(clusters[0].members, vec![1, 2, 3, 4]);
}

#[test]
fn test_pipeline_finds_both_dense_blocks() {
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    clusterer
        .fit(&retail_table(), &retail_scorer(), &Apriori::new())
        .unwrap();

    // the dairy block clears 3/4 support once the fruit rows are gone
    let clusters = clusterer.clusters();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[1].members, vec![5, 6, 7]);
    assert_eq!(clusterer.noise(), &[8]);
}

#[test]
fn test_pipeline_is_a_partition() {
    let table = retail_table();
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    clusterer
        .fit(&table, &retail_scorer(), &Apriori::new())
        .unwrap();

    let mut seen = BTreeSet::new();
    for cluster in clusterer.clusters() {
        for &id in &cluster.members {
            assert!(seen.insert(id), "row {id} assigned twice");
        }
    }
    for &id in clusterer.noise() {
        assert!(seen.insert(id), "row {id} assigned twice");
    }
    let all: BTreeSet<usize> = table.iter().map(|t| t.id).collect();
    assert_eq!(seen, all);
}

#[test]
fn test_pipeline_with_threshold_policy_demotes_diverse_row() {
    // row 3 mixes fruit with soap, diverging at the hierarchy root
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3)
        .with_outlier_policy(OutlierPolicy::Threshold { cutoff: 0.0 });
    clusterer
        .fit(&retail_table(), &retail_scorer(), &Apriori::new())
        .unwrap();

    assert_eq!(clusterer.clusters()[0].members, vec![1, 2, 4]);
    assert!(clusterer.noise().contains(&3));
}

#[test]
fn test_pipeline_merging_collapses_overlapping_subspaces() {
    let table = vec![
        tx(1, &["apple", "pear"]),
        tx(2, &["apple", "pear"]),
        tx(3, &["pear", "milk"]),
        tx(4, &["pear", "milk"]),
    ];
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.5)
        .with_min_cluster_size(2)
        .with_target_clusters(1);
    clusterer
        .fit(&table, &retail_scorer(), &Apriori::new())
        .unwrap();

    assert_eq!(clusterer.clusters().len(), 1);
    let merged = &clusterer.clusters()[0];
    assert_eq!(merged.dimensions, vec!["pear".to_string()]);
    assert_eq!(merged.members, vec![1, 2, 3, 4]);
}

#[test]
fn test_pipeline_merging_stops_at_disjoint_subspaces() {
    // fruit and dairy blocks share no dimensions; target 1 is unreachable
    let table = vec![
        tx(1, &["apple", "pear"]),
        tx(2, &["apple", "pear"]),
        tx(3, &["milk", "cheese"]),
        tx(4, &["milk", "cheese"]),
    ];
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.5)
        .with_min_cluster_size(2)
        .with_target_clusters(1);
    clusterer
        .fit(&table, &retail_scorer(), &Apriori::new())
        .unwrap();

    assert_eq!(clusterer.clusters().len(), 2);
}

#[test]
fn test_pipeline_deterministic_across_runs() {
    let table = retail_table();
    let scorer = retail_scorer();

    let mut first = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    first.fit(&table, &scorer, &Apriori::new()).unwrap();

    let mut second = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    second.fit(&table, &scorer, &Apriori::new()).unwrap();

    assert_eq!(first.clustering(), second.clustering());
}

#[test]
fn test_clustering_serde_round_trip() {
    let mut clusterer = SubspaceClusterer::new()
        .with_min_support(0.4)
        .with_min_cluster_size(3);
    clusterer
        .fit(&retail_table(), &retail_scorer(), &Apriori::new())
        .unwrap();

    let json = serde_json::to_string(clusterer.clustering()).unwrap();
    let restored: SubspaceClustering = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, clusterer.clustering());
}

#[test]
fn test_balanced_tree_leaves_align_with_scorer() {
    let tree = retail_tree();
    let height = tree.height();
    let balanced = tree.balanced(height);

    assert_eq!(balanced.height(), height);
    // every original leaf keeps its name in the balanced code map
    let codes = balanced.leaf_codes();
    for name in ["apple", "pear", "milk", "cheese", "soap"] {
        assert!(codes.contains_key(name), "missing leaf {name}");
    }
}

/// Leaf names drawn from the retail hierarchy.
fn retail_item() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "apple".to_string(),
        "pear".to_string(),
        "milk".to_string(),
        "cheese".to_string(),
        "soap".to_string(),
    ])
}

proptest! {
    /// Every diversity score is finite and non-negative.
    #[test]
    fn prop_diversity_score_bounds(items in prop::collection::vec(retail_item(), 0..8)) {
        let scorer = retail_scorer();
        let score = scorer.score(&items).unwrap();
        prop_assert!(score >= 0.0);
        prop_assert!(score.is_finite());
    }

    /// Scoring is insensitive to item order and duplication.
    #[test]
    fn prop_diversity_score_is_set_semantic(items in prop::collection::vec(retail_item(), 1..8)) {
        let scorer = retail_scorer();
        let forward = scorer.score(&items).unwrap();

        let mut doubled = items.clone();
        doubled.extend(items.iter().rev().cloned());
        let second = scorer.score(&doubled).unwrap();
        prop_assert_eq!(forward.to_bits(), second.to_bits());
    }

    /// Clustering always partitions the input row ids.
    #[test]
    fn prop_clustering_partitions_rows(
        rows in prop::collection::vec(prop::collection::btree_set(retail_item(), 1..4), 1..20),
    ) {
        let table: Vec<Transaction> = rows
            .iter()
            .enumerate()
            .map(|(i, items)| Transaction::new(i, items.iter().cloned().collect()))
            .collect();

        let mut clusterer = SubspaceClusterer::new()
            .with_min_support(0.4)
            .with_min_cluster_size(2);
        clusterer.fit(&table, &retail_scorer(), &Apriori::new()).unwrap();

        let mut seen: Vec<usize> = clusterer
            .clusters()
            .iter()
            .flat_map(|c| c.members.iter().copied())
            .chain(clusterer.noise().iter().copied())
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..table.len()).collect::<Vec<_>>());
    }

    /// Mined itemsets always clear the requested support threshold.
    #[test]
    fn prop_mined_itemsets_clear_support(
        rows in prop::collection::vec(prop::collection::btree_set(retail_item(), 1..4), 1..15),
        min_support in 0.1f64..1.0,
    ) {
        let transactions: Vec<Vec<String>> =
            rows.iter().map(|set| set.iter().cloned().collect()).collect();
        for (itemset, support) in Apriori::new().mine(&transactions, min_support) {
            prop_assert!(support >= min_support);
            prop_assert!(!itemset.is_empty());
        }
    }
}

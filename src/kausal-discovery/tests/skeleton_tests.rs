//! Integration tests for kausal-discovery
//!
//! End-to-end scenarios through `skeleton_discovery`, plus property tests
//! against the d-separation oracle on generated DAGs.

use std::collections::BTreeSet;
use std::sync::Arc;

use common_config::{DiscoveryConfig, ExecutionConfig, TestKind};
use common_error::KausalError;
use kausal_cit::DSeparation;
use kausal_core::{testing, ConditioningSet, Dataset, KnowledgeBase, RawMatrix, RawValue};
use kausal_discovery::*;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn raw_from(data: &Dataset) -> RawMatrix {
    let columns = data
        .as_continuous()
        .unwrap()
        .columns()
        .iter()
        .map(|c| c.iter().copied().map(RawValue::Number).collect())
        .collect();
    RawMatrix::from_columns(columns).unwrap()
}

fn labels(bits: &[usize], names: [&str; 2]) -> Vec<RawValue> {
    bits.iter().map(|&b| RawValue::from(names[b])).collect()
}

#[test]
fn test_independent_pair_removed_at_depth_zero() {
    let raw = raw_from(&testing::independent_pair(512).unwrap());
    let result = skeleton_discovery(&raw, &DiscoveryConfig::default(), None).unwrap();

    assert_eq!(result.graph.edge_count(), 0);
    assert_eq!(result.stats.max_depth, Some(0));
    for (x, y) in [(0, 1), (1, 0)] {
        assert_eq!(
            result.sepsets.get(x, y).unwrap().iter().collect::<Vec<_>>(),
            vec![&ConditioningSet::empty()]
        );
    }
}

#[test]
fn test_chain_removed_at_depth_one() {
    let raw = raw_from(&testing::chain_xzy(512).unwrap());
    for stable in [true, false] {
        let config = DiscoveryConfig::default().with_stable(stable);
        let result = skeleton_discovery(&raw, &config, None).unwrap();

        assert_eq!(result.edges(), vec![(0, 2), (1, 2)]);
        assert_eq!(result.removed_edges(), vec![(0, 1)]);
        assert!(result.sepsets.get(0, 1).unwrap().contains(&ConditioningSet::new([2])));
        assert!(result.sepsets.get(1, 0).unwrap().contains(&ConditioningSet::new([2])));
        assert!(!result.sepsets.contains_pair(0, 2));
        assert!(result.sepsets.is_separated_by(0, 1, 2));
    }
}

#[test]
fn test_collider_keeps_both_edges() {
    let raw = raw_from(&testing::collider_xzy(512).unwrap());
    let result = skeleton_discovery(&raw, &DiscoveryConfig::default(), None).unwrap();
    assert_eq!(result.edges(), vec![(0, 2), (1, 2)]);
    assert!(result.sepsets.get(0, 1).unwrap().contains(&ConditioningSet::empty()));
    assert!(!result.sepsets.is_separated_by(0, 1, 2));
}

#[test]
fn test_forbidden_edge_removed_without_test() {
    let raw = raw_from(&testing::chain_xzy(512).unwrap());
    let knowledge: Arc<dyn kausal_core::BackgroundKnowledge> =
        Arc::new(KnowledgeBase::new().forbid(0, 2).forbid(2, 0));
    let result = skeleton_discovery(&raw, &DiscoveryConfig::default(), Some(knowledge)).unwrap();

    // X - Z is strongly dependent, but forbidden in both directions.
    assert!(!result.graph.has_edge(0, 2));
    assert_eq!(
        result.sepsets.get(2, 0).unwrap().iter().collect::<Vec<_>>(),
        vec![&ConditioningSet::empty()]
    );
}

#[test]
fn test_one_forbidden_direction_is_not_enough() {
    let raw = raw_from(&testing::chain_xzy(512).unwrap());
    let knowledge: Arc<dyn kausal_core::BackgroundKnowledge> =
        Arc::new(KnowledgeBase::new().forbid(0, 2));
    let result = skeleton_discovery(&raw, &DiscoveryConfig::default(), Some(knowledge)).unwrap();
    assert!(result.graph.has_edge(0, 2));
}

#[test]
fn test_alpha_bounds_rejected() {
    let raw = raw_from(&testing::chain_xzy(64).unwrap());
    for alpha in [0.0, 1.0] {
        let config = DiscoveryConfig::default().with_alpha(alpha);
        let err = skeleton_discovery(&raw, &config, None).unwrap_err();
        assert!(matches!(err, KausalError::InvalidArgument(_)));
    }
}

#[test]
fn test_labels_rejected_by_fisher_z() {
    let raw = RawMatrix::from_columns(vec![
        labels(&[0, 1, 0, 1], ["a", "b"]),
        labels(&[0, 0, 1, 1], ["a", "b"]),
    ])
    .unwrap();
    let err = skeleton_discovery(&raw, &DiscoveryConfig::default(), None).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_discrete_labels_with_chi_squared() {
    let rows = 128;
    let a = testing::bit_column(rows, 0);
    let b = testing::bit_column(rows, 1);
    let raw = RawMatrix::from_columns(vec![
        labels(&a, ["a", "b"]),
        labels(&b, ["c", "d"]),
        labels(&a, ["x", "y"]),
    ])
    .unwrap();

    for test in [TestKind::ChiSquared, TestKind::GSquared] {
        let config = DiscoveryConfig::default().with_test(test);
        let result = skeleton_discovery(&raw, &config, None).unwrap();
        assert_eq!(result.edges(), vec![(0, 2)]);
        assert_eq!(result.removed_edges(), vec![(0, 1), (1, 2)]);
    }
}

#[test]
fn test_verbose_run_uses_log_sink() {
    let raw = raw_from(&testing::chain_xzy(64).unwrap());
    let config = DiscoveryConfig::default().with_verbose(true);
    let result = skeleton_discovery(&raw, &config, None).unwrap();
    assert_eq!(result.removed_edges(), vec![(0, 1)]);
}

#[test]
fn test_non_stable_order_dependence_is_visible_in_sepsets() {
    // 0 -> 2 -> 3 -> 1: both {2} and {3} separate 0 and 1.
    let oracle = DSeparation::new(4, &[(0, 2), (2, 3), (3, 1)]).unwrap();
    let forward = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(false))
        .run(&oracle, 4)
        .unwrap();
    // Visiting 2 first drops 1 - 2, so 1 only has 3 left to condition on.
    let reordered = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(false))
        .with_visit_order(vec![2, 1, 0, 3])
        .run(&oracle, 4)
        .unwrap();

    assert_eq!(forward.graph, reordered.graph);
    assert_eq!(forward.edges(), vec![(0, 2), (1, 3), (2, 3)]);
    assert_eq!(
        forward.sepsets.get(0, 1).unwrap().iter().collect::<Vec<_>>(),
        vec![&ConditioningSet::new([2])]
    );
    assert_eq!(
        reordered.sepsets.get(0, 1).unwrap().iter().collect::<Vec<_>>(),
        vec![&ConditioningSet::new([3])]
    );
}

#[test]
fn test_random_dags_with_seeded_generator() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..20 {
        let n = rng.gen_range(3..9);
        let edges: Vec<(usize, usize)> = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .filter(|_| rng.gen_bool(0.3))
            .collect();
        let oracle = DSeparation::new(n, &edges).unwrap();
        let result = SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_execution(ExecutionConfig::parallel(Some(2)))
            .run(&oracle, n)
            .unwrap();
        assert_eq!(result.graph.edges().collect::<BTreeSet<_>>(), oracle.skeleton());
    }
}

/// Random DAG over up to `max_vars` variables, edges from lower to higher index.
fn arb_dag(max_vars: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2..=max_vars).prop_flat_map(|n| {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .collect();
        let len = pairs.len();
        prop::collection::vec(prop::bool::weighted(0.35), len).prop_map(move |mask| {
            let edges = pairs
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(e, _)| *e)
                .collect();
            (n, edges)
        })
    })
}

/// A DAG together with a random visit order over its vertices.
fn arb_dag_and_order(max_vars: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
    arb_dag(max_vars).prop_flat_map(|(n, edges)| {
        let order: Vec<usize> = (0..n).collect();
        (Just(n), Just(edges), Just(order).prop_shuffle())
    })
}

fn run(oracle: &DSeparation, n: usize, stable: bool, order: Option<Vec<usize>>) -> SkeletonResult {
    let mut discovery = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(stable));
    if let Some(order) = order {
        discovery = discovery.with_visit_order(order);
    }
    discovery.run(oracle, n).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Stable results do not depend on the visit order.
    #[test]
    fn stable_is_order_invariant((n, edges, order) in arb_dag_and_order(7)) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        let natural = run(&oracle, n, true, None);
        let shuffled = run(&oracle, n, true, Some(order));
        prop_assert_eq!(&natural.graph, &shuffled.graph);
        prop_assert_eq!(&natural.sepsets, &shuffled.sepsets);
        prop_assert_eq!(natural.stats.tests_run, shuffled.stats.tests_run);
    }

    /// With a perfect oracle both modes recover the true skeleton in any order.
    #[test]
    fn perfect_oracle_recovers_skeleton((n, edges, order) in arb_dag_and_order(7)) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        for stable in [true, false] {
            let result = run(&oracle, n, stable, Some(order.clone()));
            prop_assert_eq!(result.graph.edges().collect::<BTreeSet<_>>(), oracle.skeleton());
        }
    }

    /// Removed edges have separating sets under both orderings; kept edges have none.
    #[test]
    fn sepsets_match_removed_edges((n, edges, order) in arb_dag_and_order(7), stable in any::<bool>()) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        let result = run(&oracle, n, stable, Some(order));
        for (a, b) in result.removed_edges() {
            prop_assert!(result.sepsets.get(a, b).is_some_and(|s| !s.is_empty()));
            prop_assert_eq!(result.sepsets.get(a, b), result.sepsets.get(b, a));
            for set in result.sepsets.get(a, b).unwrap() {
                prop_assert!(oracle.is_d_separated(a, b, set.as_slice()).unwrap());
            }
        }
        for (a, b) in result.edges() {
            prop_assert!(!result.sepsets.contains_pair(a, b));
            prop_assert!(!result.sepsets.contains_pair(b, a));
        }
    }

    /// Running again on a DAG with the recovered skeleton is a fixed point.
    #[test]
    fn recovered_skeleton_is_a_fixed_point((n, edges) in arb_dag(7)) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        let first = run(&oracle, n, true, None);
        let implied = DSeparation::new(n, &first.edges()).unwrap();
        let second = run(&implied, n, true, None);
        prop_assert_eq!(first.graph, second.graph);
    }

    /// Edge counts only shrink from one depth to the next.
    #[test]
    fn pruning_is_monotone((n, edges) in arb_dag(7)) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        let sink = Arc::new(CollectingSink::new());
        let result = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(false))
            .with_sink(sink.clone())
            .run(&oracle, n)
            .unwrap();

        let mut previous = n * (n - 1) / 2;
        let mut removed = 0;
        for event in sink.events() {
            match event {
                DiscoveryEvent::DepthStarted { edges, .. } => {
                    prop_assert!(edges <= previous);
                    previous = edges;
                }
                DiscoveryEvent::DepthCompleted { edges_removed, .. } => removed += edges_removed,
                _ => {}
            }
        }
        prop_assert_eq!(removed, result.stats.edges_removed);
        prop_assert_eq!(n * (n - 1) / 2 - removed, result.graph.edge_count());
    }

    /// The parallel stable variant matches the sequential one exactly.
    #[test]
    fn parallel_matches_sequential((n, edges) in arb_dag(7)) {
        let oracle = DSeparation::new(n, &edges).unwrap();
        let sequential_sink = Arc::new(CollectingSink::new());
        let parallel_sink = Arc::new(CollectingSink::new());
        let sequential = SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_sink(sequential_sink.clone())
            .run(&oracle, n)
            .unwrap();
        let parallel = SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_execution(ExecutionConfig::parallel(Some(4)))
            .with_sink(parallel_sink.clone())
            .run(&oracle, n)
            .unwrap();
        prop_assert_eq!(sequential.graph, parallel.graph);
        prop_assert_eq!(sequential.sepsets, parallel.sepsets);
        prop_assert_eq!(sequential_sink.events(), parallel_sink.events());
    }
}

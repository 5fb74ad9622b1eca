//! The skeleton discovery driver.
//!
//! Starting from the complete graph, each depth `d` tries conditioning sets
//! of size `d` drawn from the current neighborhood of each vertex and removes
//! the edges whose endpoints test independent. Depths increase until no vertex
//! has more than `d` neighbors.
//!
//! # Removal semantics
//!
//! - **Stable**: removals are queued and applied at the end of the depth, so
//!   every test at depth `d` sees the graph as it was when the depth started.
//!   The result does not depend on the visit order.
//! - **Non-stable**: a removal is applied as soon as the search of the current
//!   vertex finishes, so later vertices in the same depth see the reduced
//!   graph. The result can depend on the visit order.
//!
//! In both modes every separation is recorded in the [`SepsetStore`] under
//! both orderings of the pair.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common_config::{DiscoveryConfig, ExecutionConfig, ExecutionMode};
use common_error::{KausalError, KausalResult};
use kausal_cit::IndependenceTest;
use kausal_core::{AdjacencyGraph, BackgroundKnowledge, PendingRemovals, SepsetStore};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::events::{DiscoveryEvent, EventSink, LogSink, NoopSink};
use crate::pass::{PassContext, VertexOutcome};
use crate::result::{DiscoveryStats, SkeletonResult};

/// Configured skeleton discovery run.
pub struct SkeletonDiscovery {
    config: DiscoveryConfig,
    execution: ExecutionConfig,
    knowledge: Option<Arc<dyn BackgroundKnowledge>>,
    sink: Option<Arc<dyn EventSink>>,
    visit_order: Option<Vec<usize>>,
}

impl SkeletonDiscovery {
    /// Create a driver with sequential execution.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            execution: ExecutionConfig::default(),
            knowledge: None,
            sink: None,
            visit_order: None,
        }
    }

    /// Set the execution configuration.
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Consult background knowledge before each test.
    pub fn with_background_knowledge(mut self, knowledge: Arc<dyn BackgroundKnowledge>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Send decision events to `sink` instead of the verbosity default.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Visit vertices (and the neighbors of each vertex) in this order.
    ///
    /// Must be a permutation of `0..n_vars`. Conditioning sets are still
    /// enumerated in ascending vertex order.
    pub fn with_visit_order(mut self, order: Vec<usize>) -> Self {
        self.visit_order = Some(order);
        self
    }

    /// The discovery configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run discovery over `n_vars` variables using `test`.
    pub fn run(&self, test: &dyn IndependenceTest, n_vars: usize) -> KausalResult<SkeletonResult> {
        self.config.validate()?;
        self.execution.validate()?;
        common_error::ensure!(
            test.num_vars() == n_vars,
            InvalidArgument: "{} test covers {} variables, expected {n_vars}",
            test.name(),
            test.num_vars()
        );
        let order = self.resolve_order(n_vars)?;
        let mut rank = vec![0; n_vars];
        for (position, &v) in order.iter().enumerate() {
            rank[v] = position;
        }

        let parallel = match self.execution.mode {
            ExecutionMode::Parallel if self.config.stable => true,
            ExecutionMode::Parallel => {
                warn!("Parallel execution requires stable mode, running sequentially");
                false
            }
            ExecutionMode::Sequential => false,
        };
        let pool = if parallel {
            Some(common_runtime::pool_for(&self.execution)?)
        } else {
            None
        };

        let sink: Arc<dyn EventSink> = match (&self.sink, self.config.verbose) {
            (Some(sink), _) => Arc::clone(sink),
            (None, true) => Arc::new(LogSink),
            (None, false) => Arc::new(NoopSink),
        };
        let ctx = PassContext {
            test,
            knowledge: self.knowledge.as_deref(),
            alpha: self.config.alpha,
            policy: self.config.failure_policy,
            rank: &rank,
        };
        let deadline = self.config.max_duration_ms.map(Duration::from_millis);

        info!(
            "Starting {} skeleton discovery over {n_vars} variables with {} (alpha = {})",
            if self.config.stable { "stable" } else { "non-stable" },
            test.name(),
            self.config.alpha
        );

        let start = Instant::now();
        let mut graph = AdjacencyGraph::complete(n_vars);
        let mut sepsets = SepsetStore::new();
        let mut stats = DiscoveryStats::default();
        let mut depth = 0;

        while graph.max_degree() > depth {
            if let Some(limit) = deadline {
                let elapsed = start.elapsed();
                if elapsed >= limit {
                    return Err(KausalError::deadline(format!(
                        "stopped before depth {depth} after {elapsed:?} (limit {limit:?})"
                    )));
                }
            }

            sink.emit(&DiscoveryEvent::DepthStarted {
                depth,
                edges: graph.edge_count(),
            });
            let edges_before = graph.edge_count();
            let tests_before = stats.tests_run;

            if !self.config.stable {
                Self::non_stable_pass(
                    &ctx,
                    &order,
                    depth,
                    &mut graph,
                    &mut sepsets,
                    &mut stats,
                    sink.as_ref(),
                )?;
            } else {
                let outcomes = match &pool {
                    Some(pool) => {
                        let snapshot = &graph;
                        pool.install(|| {
                            order
                                .par_iter()
                                .map(|&x| ctx.search_vertex(x, &snapshot.neighbor_vec(x), depth))
                                .collect::<Vec<_>>()
                        })
                    }
                    None => order
                        .iter()
                        .map(|&x| ctx.search_vertex(x, &graph.neighbor_vec(x), depth))
                        .collect(),
                };

                let mut pending = PendingRemovals::new();
                for outcome in outcomes {
                    let outcome = outcome?;
                    for separation in &outcome.separations {
                        pending.push(separation.x, separation.y);
                        pending.push(separation.y, separation.x);
                    }
                    absorb(outcome, &mut sepsets, &mut stats, sink.as_ref());
                }
                pending.apply(&mut graph);
            }

            let edges_removed = edges_before - graph.edge_count();
            let tests_run = stats.tests_run - tests_before;
            debug!(
                "Depth {depth}: {tests_run} tests, {edges_removed} edges removed, {} edges left",
                graph.edge_count()
            );
            sink.emit(&DiscoveryEvent::DepthCompleted {
                depth,
                edges_removed,
                tests_run,
            });

            stats.depths_run += 1;
            stats.max_depth = Some(depth);
            stats.edges_removed += edges_removed;
            depth += 1;
        }

        stats.elapsed = start.elapsed();
        let result = SkeletonResult {
            graph,
            sepsets,
            stats,
        };
        info!("Skeleton discovery finished: {}", result.summary());
        Ok(result)
    }

    /// One depth pass removing edges as soon as each vertex is searched.
    fn non_stable_pass(
        ctx: &PassContext<'_>,
        order: &[usize],
        depth: usize,
        graph: &mut AdjacencyGraph,
        sepsets: &mut SepsetStore,
        stats: &mut DiscoveryStats,
        sink: &dyn EventSink,
    ) -> KausalResult<()> {
        for &x in order {
            let outcome = ctx.search_vertex(x, &graph.neighbor_vec(x), depth)?;
            for separation in &outcome.separations {
                graph.remove_edge(separation.x, separation.y);
            }
            absorb(outcome, sepsets, stats, sink);
        }
        Ok(())
    }

    fn resolve_order(&self, n_vars: usize) -> KausalResult<Vec<usize>> {
        let Some(order) = &self.visit_order else {
            return Ok((0..n_vars).collect());
        };
        let mut seen = vec![false; n_vars];
        for &v in order {
            common_error::ensure!(
                v < n_vars && !seen[v],
                InvalidArgument: "visit order is not a permutation of 0..{n_vars}"
            );
            seen[v] = true;
        }
        common_error::ensure!(
            order.len() == n_vars,
            InvalidArgument: "visit order is not a permutation of 0..{n_vars}"
        );
        Ok(order.clone())
    }
}

/// Record separations, forward events and count tests for one vertex.
fn absorb(
    outcome: VertexOutcome,
    sepsets: &mut SepsetStore,
    stats: &mut DiscoveryStats,
    sink: &dyn EventSink,
) {
    stats.tests_run += outcome.tests_run;
    for event in &outcome.events {
        sink.emit(event);
    }
    for separation in outcome.separations {
        sepsets.record(separation.x, separation.y, separation.cond);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;
    use common_config::TestFailurePolicy;
    use kausal_cit::{DSeparation, FisherZ};
    use kausal_core::{testing, ConditioningSet, KnowledgeBase};

    /// Fails on any conditioning set containing `bad`, otherwise answers as `inner`.
    struct Flaky<T> {
        inner: T,
        bad: usize,
    }

    impl<T: IndependenceTest> IndependenceTest for Flaky<T> {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn num_vars(&self) -> usize {
            self.inner.num_vars()
        }

        fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64> {
            if cond.contains(&self.bad) {
                return Err(KausalError::numerical("degenerate"));
            }
            self.inner.p_value(x, y, cond)
        }
    }

    fn chain_oracle() -> DSeparation {
        // X -> Z -> Y as vertices [X, Y, Z]
        DSeparation::new(3, &[(0, 2), (2, 1)]).unwrap()
    }

    #[test]
    fn test_chain_with_oracle() {
        for stable in [true, false] {
            let result = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(stable))
                .run(&chain_oracle(), 3)
                .unwrap();
            assert_eq!(result.edges(), vec![(0, 2), (1, 2)]);
            assert!(result.sepsets.get(0, 1).unwrap().contains(&ConditioningSet::new([2])));
            assert!(result.sepsets.get(1, 0).unwrap().contains(&ConditioningSet::new([2])));
            assert_eq!(result.stats.max_depth, Some(1));
            assert_eq!(result.stats.edges_removed, 1);
        }
    }

    #[test]
    fn test_non_stable_removals_are_seen_within_depth() {
        let oracle = DSeparation::new(3, &[]).unwrap();

        let stable = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&oracle, 3)
            .unwrap();
        // Every vertex tests both of its neighbors against the depth 0 snapshot.
        assert_eq!(stable.stats.tests_run, 6);

        let sink = Arc::new(CollectingSink::new());
        let non_stable = SkeletonDiscovery::new(DiscoveryConfig::default().with_stable(false))
            .with_sink(sink.clone())
            .run(&oracle, 3)
            .unwrap();
        // Vertex 0 drops both of its edges before vertex 1 is searched.
        assert_eq!(non_stable.stats.tests_run, 3);
        assert_eq!(non_stable.graph.edge_count(), 0);
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, DiscoveryEvent::Independent { x: 1, y: 0, .. })));
        assert_eq!(
            non_stable.sepsets.get(1, 0).unwrap().iter().collect::<Vec<_>>(),
            vec![&ConditioningSet::empty()]
        );
    }

    #[test]
    fn test_chain_with_fisher_z() {
        let data = testing::chain_xzy(256).unwrap();
        let test = FisherZ::new(data.as_continuous().unwrap()).unwrap();
        let result = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&test, 3)
            .unwrap();
        assert_eq!(result.removed_edges(), vec![(0, 1)]);
        assert_eq!(
            result.sepsets.get(0, 1).unwrap().iter().collect::<Vec<_>>(),
            vec![&ConditioningSet::new([2])]
        );
    }

    #[test]
    fn test_single_and_empty_graphs() {
        let oracle = DSeparation::new(1, &[]).unwrap();
        let result = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&oracle, 1)
            .unwrap();
        assert_eq!(result.stats.depths_run, 0);
        assert_eq!(result.stats.max_depth, None);

        let oracle = DSeparation::new(0, &[]).unwrap();
        let result = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&oracle, 0)
            .unwrap();
        assert_eq!(result.graph.edge_count(), 0);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        for alpha in [0.0, 1.0, -0.5, f64::NAN] {
            let err = SkeletonDiscovery::new(DiscoveryConfig::default().with_alpha(alpha))
                .run(&chain_oracle(), 3)
                .unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn test_variable_count_mismatch() {
        let err = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&chain_oracle(), 4)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_bad_visit_order() {
        for order in [vec![0, 1], vec![0, 1, 1], vec![0, 1, 3]] {
            let err = SkeletonDiscovery::new(DiscoveryConfig::default())
                .with_visit_order(order)
                .run(&chain_oracle(), 3)
                .unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn test_background_knowledge_removes_edge() {
        // Fully connected truth: no test would separate 0 and 1.
        let oracle = DSeparation::new(3, &[(0, 1), (0, 2), (1, 2)]).unwrap();
        let knowledge = KnowledgeBase::new().forbid_adjacency(0, 1);
        let sink = Arc::new(CollectingSink::new());
        let result = SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_background_knowledge(Arc::new(knowledge))
            .with_sink(sink.clone())
            .run(&oracle, 3)
            .unwrap();

        assert_eq!(result.removed_edges(), vec![(0, 1)]);
        assert_eq!(
            result.sepsets.get(1, 0).unwrap().iter().collect::<Vec<_>>(),
            vec![&ConditioningSet::empty()]
        );
        assert!(sink.events().iter().any(|e| matches!(
            e,
            DiscoveryEvent::ForbiddenByKnowledge { x: 0, y: 1, .. }
        )));
    }

    #[test]
    fn test_failure_policies() {
        // Every test conditioning on Z fails.
        let flaky = Flaky {
            inner: chain_oracle(),
            bad: 2,
        };

        let err = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&flaky, 3)
            .unwrap_err();
        assert!(err.is_numerical());

        let sink = Arc::new(CollectingSink::new());
        let result = SkeletonDiscovery::new(
            DiscoveryConfig::default().with_failure_policy(TestFailurePolicy::AssumeIndependent),
        )
        .with_sink(sink.clone())
        .run(&flaky, 3)
        .unwrap();
        assert_eq!(result.removed_edges(), vec![(0, 1)]);
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, DiscoveryEvent::TestFailed { assumed_p_value, .. } if *assumed_p_value == 1.0)));

        let result = SkeletonDiscovery::new(
            DiscoveryConfig::default().with_failure_policy(TestFailurePolicy::AssumeDependent),
        )
        .run(&flaky, 3)
        .unwrap();
        assert!(result.removed_edges().is_empty());
        assert!(result.sepsets.is_empty());
    }

    #[test]
    fn test_non_numerical_errors_always_propagate() {
        struct Broken;

        impl IndependenceTest for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }

            fn num_vars(&self) -> usize {
                2
            }

            fn p_value(&self, _x: usize, _y: usize, _cond: &[usize]) -> KausalResult<f64> {
                Err(KausalError::internal("unreachable backend"))
            }
        }

        let err = SkeletonDiscovery::new(
            DiscoveryConfig::default().with_failure_policy(TestFailurePolicy::AssumeIndependent),
        )
        .run(&Broken, 2)
        .unwrap_err();
        assert!(matches!(err, KausalError::InternalError(_)));
    }

    #[test]
    fn test_deadline_checked_before_depth() {
        let err = SkeletonDiscovery::new(DiscoveryConfig::default().with_max_duration_ms(0))
            .run(&chain_oracle(), 3)
            .unwrap_err();
        assert!(matches!(err, KausalError::DeadlineExceeded(_)));

        let result = SkeletonDiscovery::new(DiscoveryConfig::default().with_max_duration_ms(60_000))
            .run(&chain_oracle(), 3)
            .unwrap();
        assert_eq!(result.graph.edge_count(), 2);
    }

    #[test]
    fn test_event_stream_shape() {
        let sink = Arc::new(CollectingSink::new());
        SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_sink(sink.clone())
            .run(&chain_oracle(), 3)
            .unwrap();
        let events = sink.events();

        assert_eq!(events.first(), Some(&DiscoveryEvent::DepthStarted { depth: 0, edges: 3 }));
        assert!(matches!(
            events.last(),
            Some(DiscoveryEvent::DepthCompleted {
                depth: 1,
                edges_removed: 1,
                ..
            })
        ));
        let separations = events
            .iter()
            .filter(|e| matches!(e, DiscoveryEvent::Independent { .. }))
            .count();
        // Found once from each endpoint.
        assert_eq!(separations, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let oracle = DSeparation::new(5, &[(0, 1), (1, 2), (0, 3), (3, 2), (2, 4)]).unwrap();
        let sequential = SkeletonDiscovery::new(DiscoveryConfig::default())
            .run(&oracle, 5)
            .unwrap();
        let parallel = SkeletonDiscovery::new(DiscoveryConfig::default())
            .with_execution(ExecutionConfig::parallel(Some(3)))
            .run(&oracle, 5)
            .unwrap();
        assert_eq!(sequential.graph, parallel.graph);
        assert_eq!(sequential.sepsets, parallel.sepsets);
        assert_eq!(sequential.stats.tests_run, parallel.stats.tests_run);
    }
}

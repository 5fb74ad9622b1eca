//! Per-vertex search for separating sets at a fixed depth.

use common_config::TestFailurePolicy;
use common_error::KausalResult;
use kausal_cit::IndependenceTest;
use kausal_core::{BackgroundKnowledge, Combinations, ConditioningSet};
use log::warn;

use crate::events::DiscoveryEvent;

/// Read-only inputs shared by every vertex search in a run.
pub(crate) struct PassContext<'a> {
    pub test: &'a dyn IndependenceTest,
    pub knowledge: Option<&'a dyn BackgroundKnowledge>,
    pub alpha: f64,
    pub policy: TestFailurePolicy,
    /// Position of each vertex in the visit order.
    pub rank: &'a [usize],
}

/// A separation found for the ordered pair `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Separation {
    pub x: usize,
    pub y: usize,
    pub cond: ConditioningSet,
}

/// Everything one vertex search produced, in decision order.
#[derive(Debug, Default)]
pub(crate) struct VertexOutcome {
    pub separations: Vec<Separation>,
    pub events: Vec<DiscoveryEvent>,
    pub tests_run: usize,
}

impl PassContext<'_> {
    /// Search separating sets for every neighbor `y` of `x`.
    ///
    /// `neighbors` is the ascending neighborhood of `x` captured before the
    /// search; it is not refreshed while `x` is processed.
    pub fn search_vertex(
        &self,
        x: usize,
        neighbors: &[usize],
        depth: usize,
    ) -> KausalResult<VertexOutcome> {
        let mut outcome = VertexOutcome::default();
        if neighbors.len() + 1 < depth {
            return Ok(outcome);
        }

        let mut targets = neighbors.to_vec();
        targets.sort_by_key(|&v| self.rank[v]);

        for y in targets {
            let pool: Vec<usize> = neighbors.iter().copied().filter(|&v| v != y).collect();
            let forbidden = self.knowledge.is_some_and(|bk| bk.forbids_adjacency(x, y));

            for subset in Combinations::new(&pool, depth) {
                let cond = ConditioningSet::from(subset);
                if forbidden {
                    outcome.events.push(DiscoveryEvent::ForbiddenByKnowledge {
                        x,
                        y,
                        cond: cond.clone(),
                    });
                    outcome.separations.push(Separation { x, y, cond });
                    break;
                }

                let p_value = self.evaluate(x, y, &cond, &mut outcome)?;
                if p_value > self.alpha {
                    outcome.events.push(DiscoveryEvent::Independent {
                        x,
                        y,
                        cond: cond.clone(),
                        p_value,
                    });
                    outcome.separations.push(Separation { x, y, cond });
                    break;
                }
                outcome.events.push(DiscoveryEvent::Dependent {
                    x,
                    y,
                    cond,
                    p_value,
                });
            }
        }
        Ok(outcome)
    }

    /// Run one test, resolving numerical failures through the policy.
    fn evaluate(
        &self,
        x: usize,
        y: usize,
        cond: &ConditioningSet,
        outcome: &mut VertexOutcome,
    ) -> KausalResult<f64> {
        outcome.tests_run += 1;
        match self.test.p_value(x, y, cond.as_slice()) {
            Ok(p) => Ok(p),
            Err(err) if err.is_numerical() => {
                let assumed = match self.policy {
                    TestFailurePolicy::Abort => return Err(err),
                    TestFailurePolicy::AssumeIndependent => 1.0,
                    TestFailurePolicy::AssumeDependent => 0.0,
                };
                warn!(
                    "{} test on ({x}, {y}) given {cond} failed: {err}; assuming p-value {assumed}",
                    self.test.name()
                );
                outcome.events.push(DiscoveryEvent::TestFailed {
                    x,
                    y,
                    cond: cond.clone(),
                    error: err.to_string(),
                    assumed_p_value: assumed,
                });
                Ok(assumed)
            }
            Err(err) => Err(err),
        }
    }
}

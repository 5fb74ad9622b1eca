//! Background knowledge about forbidden edge directions.

use std::collections::{HashMap, HashSet};

/// Source of categorical constraints on edge directions.
///
/// Skeleton discovery queries both orderings of a candidate edge; an edge
/// forbidden in both directions is removed without a statistical test.
pub trait BackgroundKnowledge: Send + Sync {
    /// Whether the directed edge `from -> to` is categorically forbidden.
    fn is_forbidden(&self, from: usize, to: usize) -> bool;

    /// Whether both `a -> b` and `b -> a` are forbidden.
    fn forbids_adjacency(&self, a: usize, b: usize) -> bool {
        self.is_forbidden(a, b) && self.is_forbidden(b, a)
    }
}

/// Explicit forbidden edges plus temporal tiers.
///
/// A variable in a later tier cannot cause one in an earlier tier. Tiers
/// marked with [`KnowledgeBase::forbid_within_tier`] additionally forbid
/// every edge between two of their members.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    forbidden: HashSet<(usize, usize)>,
    tiers: HashMap<usize, usize>,
    forbidden_tiers: HashSet<usize>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base that forbids nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbid the directed edge `from -> to`.
    pub fn forbid(mut self, from: usize, to: usize) -> Self {
        self.forbidden.insert((from, to));
        self
    }

    /// Forbid any edge between `a` and `b`.
    pub fn forbid_adjacency(self, a: usize, b: usize) -> Self {
        self.forbid(a, b).forbid(b, a)
    }

    /// Place a variable in a tier.
    pub fn with_tier(mut self, var: usize, tier: usize) -> Self {
        self.tiers.insert(var, tier);
        self
    }

    /// Forbid edges between members of the same tier.
    pub fn forbid_within_tier(mut self, tier: usize) -> Self {
        self.forbidden_tiers.insert(tier);
        self
    }

    /// Tier of a variable, if assigned.
    pub fn tier_of(&self, var: usize) -> Option<usize> {
        self.tiers.get(&var).copied()
    }
}

impl BackgroundKnowledge for KnowledgeBase {
    fn is_forbidden(&self, from: usize, to: usize) -> bool {
        if self.forbidden.contains(&(from, to)) {
            return true;
        }
        match (self.tier_of(from), self.tier_of(to)) {
            (Some(a), Some(b)) if a > b => true,
            (Some(a), Some(b)) if a == b => self.forbidden_tiers.contains(&a),
            _ => false,
        }
    }
}

//! Separation sets recorded while pruning the skeleton.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

/// A conditioning set: sorted, duplicate-free vertex indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditioningSet(Vec<usize>);

impl ConditioningSet {
    /// The empty conditioning set.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a set from arbitrary indices; the result is sorted and deduplicated.
    pub fn new(vars: impl IntoIterator<Item = usize>) -> Self {
        let mut vars: Vec<usize> = vars.into_iter().collect();
        vars.sort_unstable();
        vars.dedup();
        Self(vars)
    }

    /// Indices in ascending order.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Size of the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check membership.
    pub fn contains(&self, var: usize) -> bool {
        self.0.binary_search(&var).is_ok()
    }
}

impl From<Vec<usize>> for ConditioningSet {
    fn from(vars: Vec<usize>) -> Self {
        Self::new(vars)
    }
}

impl fmt::Display for ConditioningSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

/// Separating sets keyed by ordered vertex pair.
///
/// Recording a separation of `(x, y)` always writes both `(x, y)` and
/// `(y, x)`. Each pair holds a set of conditioning sets, so a set found twice
/// (from either endpoint, at any depth) is stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SepsetStore {
    entries: BTreeMap<(usize, usize), BTreeSet<ConditioningSet>>,
}

impl SepsetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `set` separates `x` and `y`, under both orderings.
    pub fn record(&mut self, x: usize, y: usize, set: ConditioningSet) {
        self.entries.entry((y, x)).or_default().insert(set.clone());
        self.entries.entry((x, y)).or_default().insert(set);
    }

    /// Separating sets recorded for the ordered pair `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<&BTreeSet<ConditioningSet>> {
        self.entries.get(&(x, y))
    }

    /// Check if any separating set was recorded for `(x, y)`.
    pub fn contains_pair(&self, x: usize, y: usize) -> bool {
        self.entries.contains_key(&(x, y))
    }

    /// Check if `z` appears in any separating set of `(x, y)`.
    ///
    /// This is the query the orientation phase issues for unshielded triples.
    pub fn is_separated_by(&self, x: usize, y: usize, z: usize) -> bool {
        self.get(x, y)
            .is_some_and(|sets| sets.iter().any(|s| s.contains(z)))
    }

    /// Ordered pairs with at least one separating set, ascending.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.keys().copied()
    }

    /// Iterate over every `(pair, sets)` entry.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &BTreeSet<ConditioningSet>)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of ordered pairs with a separating set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct SepsetEntry<'a> {
    x: usize,
    y: usize,
    sets: &'a BTreeSet<ConditioningSet>,
}

impl Serialize for SepsetEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SepsetEntry", 3)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.serialize_field("sets", self.sets)?;
        state.end()
    }
}

impl Serialize for SepsetStore {
    /// Serialized as a list of `{x, y, sets}` entries, since JSON maps cannot
    /// be keyed by pairs.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.entries
                .iter()
                .map(|(&(x, y), sets)| SepsetEntry { x, y, sets }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditioning_set_normalized() {
        let s = ConditioningSet::new([4, 1, 4, 2]);
        assert_eq!(s.as_slice(), &[1, 2, 4]);
        assert!(s.contains(2));
        assert!(!s.contains(3));
        assert_eq!(s.to_string(), "[1, 2, 4]");
        assert_eq!(ConditioningSet::empty().to_string(), "[]");
    }

    #[test]
    fn test_record_is_symmetric() {
        let mut store = SepsetStore::new();
        store.record(0, 2, ConditioningSet::new([1]));

        assert!(store.contains_pair(0, 2));
        assert!(store.contains_pair(2, 0));
        assert_eq!(store.get(0, 2), store.get(2, 0));
        assert!(store.is_separated_by(2, 0, 1));
        assert!(!store.is_separated_by(0, 2, 3));
        assert_eq!(store.pairs().collect::<Vec<_>>(), vec![(0, 2), (2, 0)]);
    }

    #[test]
    fn test_duplicate_sets_collapse() {
        let mut store = SepsetStore::new();
        store.record(0, 1, ConditioningSet::empty());
        store.record(1, 0, ConditioningSet::empty());
        store.record(0, 1, ConditioningSet::new([3]));
        assert_eq!(store.get(0, 1).map(BTreeSet::len), Some(2));
        assert_eq!(store.len(), 2);
    }
}

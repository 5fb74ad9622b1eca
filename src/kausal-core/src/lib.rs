//! Core data model for Kausal skeleton discovery.
//!
//! This crate provides the types shared by the independence tests and the
//! discovery driver:
//! - `RawMatrix`, `RawValue` and `Dataset` for input data and its preparation
//! - `AdjacencyGraph`, `PendingRemovals` for the evolving skeleton
//! - `ConditioningSet`, `SepsetStore` for recorded separations
//! - `BackgroundKnowledge` for externally supplied edge constraints

pub mod combinations;
pub mod data;
pub mod graph;
pub mod knowledge;
pub mod testing;

// Re-export commonly used types
pub use combinations::{binomial, Combinations};
pub use data::{encode_column, prepare, ContinuousData, Dataset, DiscreteData, RawMatrix, RawValue};
pub use graph::{AdjacencyGraph, ConditioningSet, PendingRemovals, SepsetStore};
pub use knowledge::{BackgroundKnowledge, KnowledgeBase};

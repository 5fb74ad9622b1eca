//! Kausal - constraint-based causal skeleton discovery
//!
//! Kausal estimates the undirected skeleton of a causal graph from
//! observational data with the adjacency phase of the PC algorithm, and keeps
//! the separating sets needed to orient it afterwards.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use common_runtime as runtime;
pub use kausal_cit as cit;
pub use kausal_core as core;
pub use kausal_discovery as discovery;

pub use kausal_discovery::{skeleton_discovery, SkeletonDiscovery, SkeletonResult};

/// Kausal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

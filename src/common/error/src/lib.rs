//! Error types and result aliases for Kausal.
//!
//! Every crate in the workspace reports failures through [`KausalError`] so
//! that argument validation, numerical failures from independence tests and
//! run-level aborts share one taxonomy.

mod error;

pub use error::{KausalError, KausalResult};

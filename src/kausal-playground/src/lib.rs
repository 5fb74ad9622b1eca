//! Kausal Playground - Experiments and Examples
//!
//! This crate provides executable apps for experimenting with skeleton
//! discovery on synthetic and file-based data.
//!
//! # Available Binaries
//!
//! - **`skeleton-runner`**: Run discovery on a chain, a random DAG, or a JSON file
//!
//! # Usage
//!
//! ```bash
//! cargo run --package kausal-playground --bin skeleton-runner -- chain --vars 5
//! cargo run --package kausal-playground --bin skeleton-runner -- random --vars 8 --density 0.3
//! cargo run --package kausal-playground --bin skeleton-runner -- file data.json --test chi_sq
//! ```

pub mod data;
pub mod utils;

pub use data::{chain_dag, discrete_chain, linear_gaussian, sample_dag, SampleDag};
pub use utils::{format_comparison, format_result, print_divider, print_header};

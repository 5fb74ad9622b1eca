//! Worker pool utilities for Kausal.
//!
//! The parallel stable variant of skeleton discovery spreads the per-vertex
//! work of a depth pass over a dedicated rayon pool, so that concurrent runs
//! do not contend for the global pool.

use common_config::ExecutionConfig;
use common_error::{KausalError, KausalResult};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Build a worker pool with the given number of threads (`None` = one per core).
pub fn build_pool(parallelism: Option<usize>) -> KausalResult<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("kausal-worker-{i}"));
    if let Some(threads) = parallelism {
        common_error::ensure!(
            threads > 0,
            InvalidArgument: "parallelism must be at least 1"
        );
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|e| KausalError::internal(format!("Failed to create worker pool: {e}")))?;
    debug!("Built worker pool with {} threads", pool.current_num_threads());
    Ok(pool)
}

/// Build a worker pool sized from an execution config.
pub fn pool_for(config: &ExecutionConfig) -> KausalResult<ThreadPool> {
    build_pool(config.parallelism)
}

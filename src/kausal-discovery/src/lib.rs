//! Skeleton discovery for the PC algorithm.
//!
//! The driver starts from the complete undirected graph over all variables
//! and removes an edge `x - y` as soon as some conditioning set drawn from the
//! neighborhood of `x` renders the pair independent. The separating sets are
//! kept for the orientation phase.
//!
//! # Example
//!
//! ```rust,ignore
//! use kausal_discovery::skeleton_discovery;
//! use common_config::DiscoveryConfig;
//!
//! let result = skeleton_discovery(&raw, &DiscoveryConfig::default(), None)?;
//! for (a, b) in result.edges() {
//!     println!("{a} - {b}");
//! }
//! ```

mod events;
mod pass;
mod result;
mod skeleton;

use std::sync::Arc;

use common_config::DiscoveryConfig;
use common_error::KausalResult;
use kausal_cit::build_test;
use kausal_core::{prepare, BackgroundKnowledge, RawMatrix};
use log::debug;

pub use events::{CollectingSink, DiscoveryEvent, EventSink, LogSink, NoopSink};
pub use result::{DiscoveryStats, SkeletonResult};
pub use skeleton::SkeletonDiscovery;

/// Prepare `raw` for the configured test and run sequential discovery.
///
/// The configuration is validated before the data is touched.
pub fn skeleton_discovery(
    raw: &RawMatrix,
    config: &DiscoveryConfig,
    background_knowledge: Option<Arc<dyn BackgroundKnowledge>>,
) -> KausalResult<SkeletonResult> {
    config.validate()?;
    let data = prepare(raw, config.test)?;
    debug!(
        "Prepared {} rows x {} variables for {}",
        data.n_rows(),
        data.n_vars(),
        config.test.name()
    );
    let test = build_test(config.test, &data)?;

    let mut discovery = SkeletonDiscovery::new(config.clone());
    if let Some(knowledge) = background_knowledge {
        discovery = discovery.with_background_knowledge(knowledge);
    }
    discovery.run(test.as_ref(), data.n_vars())
}

//! Conditional independence tests for Kausal.
//!
//! Every test implements [`IndependenceTest`]: given two variables and a
//! conditioning set it returns the p-value of the null hypothesis
//! "x is independent of y given S". Tests are bound to their prepared data
//! at construction and hold no mutable state, so repeated calls with the same
//! arguments return the same p-value.
//!
//! | Test | Data | Statistic |
//! |------|------|-----------|
//! | [`FisherZ`] | continuous | Fisher z-transform of the partial correlation |
//! | [`ChiSquared`] | discrete | Pearson chi-squared over strata of S |
//! | [`GSquared`] | discrete | likelihood-ratio G over strata of S |
//! | [`DSeparation`] | none | d-separation in a known DAG (oracle experiments) |

mod contingency;
mod dsep;
mod fisher_z;
mod linalg;

use common_config::TestKind;
use common_error::{KausalError, KausalResult};
use kausal_core::Dataset;
use log::debug;

pub use contingency::{ChiSquared, GSquared};
pub use dsep::DSeparation;
pub use fisher_z::FisherZ;
pub use linalg::invert;

/// A conditional independence test.
pub trait IndependenceTest: Send + Sync {
    /// Short name used in traces.
    fn name(&self) -> &'static str;

    /// Number of variables the test is defined over.
    fn num_vars(&self) -> usize;

    /// p-value for "x independent of y given `cond`", in `[0, 1]`.
    ///
    /// Fails with `NumericalError` when the test is undefined for the inputs.
    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> KausalResult<f64>;
}

/// Build the test selected by `kind` over prepared data.
pub fn build_test(kind: TestKind, data: &Dataset) -> KausalResult<Box<dyn IndependenceTest>> {
    debug!(
        "Building {} test over {} variables, {} rows",
        kind.name(),
        data.n_vars(),
        data.n_rows()
    );
    let test: Box<dyn IndependenceTest> = match kind {
        TestKind::FisherZ => Box::new(FisherZ::new(data.as_continuous()?)?),
        TestKind::ChiSquared => Box::new(ChiSquared::new(data.as_discrete()?.clone())),
        TestKind::GSquared => Box::new(GSquared::new(data.as_discrete()?.clone())),
    };
    Ok(test)
}

/// Validate the arguments of a single test call.
pub(crate) fn check_arguments(n_vars: usize, x: usize, y: usize, cond: &[usize]) -> KausalResult<()> {
    if x >= n_vars || y >= n_vars {
        return Err(KausalError::invalid_argument(format!(
            "test on ({x}, {y}) out of range for {n_vars} variables"
        )));
    }
    common_error::ensure!(x != y, InvalidArgument: "cannot test variable {x} against itself");
    for &z in cond {
        common_error::ensure!(
            z < n_vars,
            InvalidArgument: "conditioning variable {z} out of range for {n_vars} variables"
        );
        common_error::ensure!(
            z != x && z != y,
            InvalidArgument: "conditioning set contains tested variable {z}"
        );
    }
    Ok(())
}

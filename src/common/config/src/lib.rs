//! Configuration management for Kausal.
//!
//! Provides the parameters of a skeleton discovery run (significance level,
//! removal semantics, test selection, failure policy) and the execution
//! settings for the parallel stable variant.

use std::path::Path;

use common_error::{KausalError, KausalResult};
use serde::{Deserialize, Serialize};

/// Global Kausal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KausalConfig {
    /// Skeleton discovery parameters.
    pub discovery: DiscoveryConfig,
    /// Execution backend configuration.
    pub execution: ExecutionConfig,
}

impl KausalConfig {
    /// Parse a configuration from a JSON string. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> KausalResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KausalResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> KausalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> KausalResult<()> {
        self.discovery.validate()?;
        self.execution.validate()
    }
}

/// The conditional independence test used as the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TestKind {
    /// Fisher's Z test on partial correlations (continuous data).
    #[default]
    FisherZ,
    /// Pearson chi-squared test on stratified contingency tables (discrete data).
    ChiSquared,
    /// G-squared likelihood-ratio test on stratified contingency tables (discrete data).
    GSquared,
}

impl TestKind {
    /// Whether the test needs integer-coded columns and cardinalities.
    pub const fn requires_discrete(self) -> bool {
        matches!(self, Self::ChiSquared | Self::GSquared)
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FisherZ => "fisher_z",
            Self::ChiSquared => "chi_sq",
            Self::GSquared => "g_sq",
        }
    }

    /// Parse a test name as accepted on the command line.
    pub fn parse(name: &str) -> KausalResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fisher_z" | "fisherz" | "fisher-z" => Ok(Self::FisherZ),
            "chi_sq" | "chisq" | "chi-squared" => Ok(Self::ChiSquared),
            "g_sq" | "gsq" | "g-squared" => Ok(Self::GSquared),
            other => Err(KausalError::invalid_argument(format!(
                "unknown independence test '{other}'"
            ))),
        }
    }
}

/// What to do when an independence test is undefined for its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TestFailurePolicy {
    /// Abort the whole run with the numerical error.
    #[default]
    Abort,
    /// Treat the pair as independent (p-value 1.0).
    AssumeIndependent,
    /// Treat the pair as dependent (p-value 0.0).
    AssumeDependent,
}

/// Parameters of a skeleton discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Significance level, in the open interval (0, 1).
    pub alpha: f64,
    /// Defer edge removals to the end of each depth.
    pub stable: bool,
    /// Independence test selection.
    pub test: TestKind,
    /// Handling of degenerate tests.
    pub failure_policy: TestFailurePolicy,
    /// Emit one human-readable line per independence decision.
    pub verbose: bool,
    /// Time budget checked between depths.
    pub max_duration_ms: Option<u64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            stable: true,
            test: TestKind::FisherZ,
            failure_policy: TestFailurePolicy::Abort,
            verbose: false,
            max_duration_ms: None,
        }
    }
}

impl DiscoveryConfig {
    /// Set the significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Choose stable or non-stable removal semantics.
    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    /// Select the independence test.
    pub fn with_test(mut self, test: TestKind) -> Self {
        self.test = test;
        self
    }

    /// Set the failure policy for degenerate tests.
    pub fn with_failure_policy(mut self, policy: TestFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable decision tracing.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set a time budget in milliseconds.
    pub fn with_max_duration_ms(mut self, ms: u64) -> Self {
        self.max_duration_ms = Some(ms);
        self
    }

    /// Check that alpha lies strictly between 0 and 1.
    pub fn validate(&self) -> KausalResult<()> {
        common_error::ensure!(
            self.alpha > 0.0 && self.alpha < 1.0,
            InvalidArgument: "alpha must be in (0, 1), got {}",
            self.alpha
        );
        Ok(())
    }
}

/// How a run is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionMode {
    /// Single-threaded depth passes.
    #[default]
    Sequential,
    /// Per-vertex work of a stable depth pass spread over a worker pool.
    Parallel,
}

/// Execution backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Scheduling mode.
    pub mode: ExecutionMode,
    /// Number of worker threads for parallel execution (`None` = all cores).
    pub parallelism: Option<usize>,
}

impl ExecutionConfig {
    /// Parallel execution with the given number of workers.
    pub fn parallel(parallelism: Option<usize>) -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            parallelism,
        }
    }

    /// Reject a zero-sized worker pool.
    pub fn validate(&self) -> KausalResult<()> {
        common_error::ensure!(
            self.parallelism != Some(0),
            InvalidArgument: "parallelism must be at least 1"
        );
        Ok(())
    }
}

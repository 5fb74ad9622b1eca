//! Skeleton Runner - run skeleton discovery from the command line
//!
//! # Usage
//!
//! ```bash
//! cargo run --package kausal-playground --bin skeleton-runner -- --help
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use common_config::{ExecutionConfig, KausalConfig, TestKind};
use common_error::KausalResult;
use kausal_cit::build_test;
use kausal_core::{prepare, RawMatrix, RawValue};
use kausal_discovery::{DiscoveryEvent, SkeletonDiscovery};

use kausal_playground::{
    chain_dag, discrete_chain, format_comparison, format_result, linear_gaussian, print_divider,
    print_header, sample_dag,
};

/// Skeleton Runner CLI.
#[derive(Parser, Debug)]
#[command(name = "skeleton-runner")]
#[command(about = "Run PC skeleton discovery on synthetic or file data")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Significance level in (0, 1) [default: 0.05]
    #[arg(long, global = true)]
    alpha: Option<f64>,

    /// Independence test (fisher_z, chi_sq, g_sq) [default: fisher_z]
    #[arg(long, global = true)]
    test: Option<String>,

    /// Remove edges immediately instead of at the end of each depth
    #[arg(long, global = true)]
    unstable: bool,

    /// Run stable passes on a worker pool with this many threads
    #[arg(long, global = true)]
    parallel: Option<usize>,

    /// Print every independence decision
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chain X0 -> X1 -> ... (continuous), or a labelled X -> Z -> Y chain for discrete tests
    Chain {
        /// Number of variables
        #[arg(long, default_value_t = 4)]
        vars: usize,

        /// Number of samples
        #[arg(long, default_value_t = 1000)]
        rows: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Random linear Gaussian DAG
    Random {
        /// Number of variables
        #[arg(long, default_value_t = 6)]
        vars: usize,

        /// Edge probability for each forward pair
        #[arg(long, default_value_t = 0.3)]
        density: f64,

        /// Number of samples
        #[arg(long, default_value_t = 2000)]
        rows: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// JSON file holding an array of rows (numbers or strings)
    File {
        /// Path to the JSON file
        path: PathBuf,
    },
}

fn main() -> KausalResult<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    let test = config.discovery.test;

    let (raw, truth) = match &args.command {
        Commands::Chain { vars, rows, seed } => {
            if test.requires_discrete() {
                print_header("Discrete chain X -> Z -> Y as [X, Y, Z]");
                let truth: BTreeSet<(usize, usize)> = [(0, 2), (1, 2)].into_iter().collect();
                (discrete_chain(*rows, 3, *seed)?, Some(truth))
            } else {
                print_header(&format!("Linear Gaussian chain over {vars} variables"));
                let dag = chain_dag(*vars);
                (linear_gaussian(&dag, *rows, *seed)?, Some(dag.skeleton()))
            }
        }
        Commands::Random {
            vars,
            density,
            rows,
            seed,
        } => {
            let dag = sample_dag(*vars, *density, *seed)?;
            print_header(&format!(
                "Random DAG over {vars} variables with {} edges",
                dag.edges.len()
            ));
            (linear_gaussian(&dag, *rows, *seed)?, Some(dag.skeleton()))
        }
        Commands::File { path } => {
            print_header(&format!("Data from {}", path.display()));
            (read_rows(path)?, None)
        }
    };

    run(&args, &config, &raw, truth.as_ref())
}

/// Load the configuration file, if any, apply the flags and validate.
fn resolve_config(args: &Args) -> KausalResult<KausalConfig> {
    let mut config = match &args.config {
        Some(path) => KausalConfig::from_path(path)?,
        None => KausalConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        config.discovery.alpha = alpha;
    }
    if let Some(name) = &args.test {
        config.discovery.test = TestKind::parse(name)?;
    }
    if args.unstable {
        config.discovery.stable = false;
    }
    if args.verbose {
        config.discovery.verbose = true;
    }
    if let Some(threads) = args.parallel {
        config.execution = ExecutionConfig::parallel(Some(threads));
    }
    config.validate()?;
    Ok(config)
}

fn read_rows(path: &Path) -> KausalResult<RawMatrix> {
    let text = std::fs::read_to_string(path)?;
    let rows: Vec<Vec<RawValue>> = serde_json::from_str(&text)?;
    RawMatrix::from_rows(rows)
}

fn run(
    args: &Args,
    config: &KausalConfig,
    raw: &RawMatrix,
    truth: Option<&BTreeSet<(usize, usize)>>,
) -> KausalResult<()> {
    let test = config.discovery.test;
    let data = prepare(raw, test)?;
    let independence = build_test(test, &data)?;
    println!(
        "{} rows x {} variables, test {}, alpha {}",
        data.n_rows(),
        data.n_vars(),
        test.name(),
        config.discovery.alpha
    );
    print_divider();

    let mut discovery = SkeletonDiscovery::new(config.discovery.clone())
        .with_execution(config.execution.clone());
    if config.discovery.verbose {
        discovery = discovery.with_sink(Arc::new(|event: &DiscoveryEvent| println!("{event}")));
    }
    let result = discovery.run(independence.as_ref(), data.n_vars())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_result(&result));
    }

    if let Some(truth) = truth {
        print_divider();
        let estimated: BTreeSet<_> = result.graph.edges().collect();
        println!("{}", format_comparison(&estimated, truth));
    }
    Ok(())
}

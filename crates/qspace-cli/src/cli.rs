use clap::{Args, Parser, Subcommand, ValueEnum};
use qspace::SolverMethod;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "qspace - uniform direction sets on the sphere for diffusion MRI: generation, polarity, ordering and subsampling.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Configuration file in TOML format; flags override its values.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate uniform directions for one or more shells.
    Generate(GenerateArgs),
    /// Choose a sign per direction so the signed set covers the full sphere evenly.
    Flip(DiscreteArgs),
    /// Reorder directions so that every prefix of the acquisition is uniform.
    Order(OrderArgs),
    /// Keep a uniform subset of each shell.
    Subsample(SubsampleArgs),
    /// Split one shell into disjoint uniform groups, each written as a shell.
    Partition(PartitionArgs),
    /// Print uniformity statistics of a scheme.
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of directions per shell, comma separated (e.g., 30,30).
    #[arg(short = 'n', long, required = true, value_delimiter = ',', value_name = "COUNTS")]
    pub counts: Vec<usize>,

    /// Strength (b-value) per shell, comma separated (e.g., 1000,2000).
    #[arg(short = 'b', long, value_delimiter = ',', value_name = "VALUES")]
    pub strengths: Option<Vec<f64>>,

    /// Start from seeded random points instead of the deterministic lattice.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Refine the directions of an existing scheme instead of generating new ones.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["seed"])]
    pub refine: Option<PathBuf>,

    /// Override the descent iteration cap.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Output CSV file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Options shared by the discrete commands.
#[derive(Args, Debug)]
pub struct DiscreteArgs {
    /// Input CSV file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Solver strategy.
    #[arg(long, value_enum, value_name = "METHOD")]
    pub method: Option<MethodArg>,

    /// Wall-clock limit for the exact solver, in seconds.
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<f64>,

    /// Seed of the heuristic solver.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct OrderArgs {
    #[command(flatten)]
    pub common: DiscreteArgs,

    /// Fix this many positions per exact solve instead of ordering everything at once.
    #[arg(long, value_name = "INT")]
    pub segment: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SubsampleArgs {
    #[command(flatten)]
    pub common: DiscreteArgs,

    /// Number of directions to keep per shell, comma separated.
    #[arg(short = 'k', long, required = true, value_delimiter = ',', value_name = "SIZES")]
    pub sizes: Vec<usize>,
}

#[derive(Args, Debug)]
pub struct PartitionArgs {
    #[command(flatten)]
    pub common: DiscreteArgs,

    /// Index of the shell to split.
    #[arg(long, default_value_t = 0, value_name = "INT")]
    pub shell: usize,

    /// Size of each group, comma separated.
    #[arg(short = 'k', long, required = true, value_delimiter = ',', value_name = "SIZES")]
    pub sizes: Vec<usize>,

    /// Strength (b-value) of each group, comma separated.
    #[arg(short = 'b', long, value_delimiter = ',', value_name = "VALUES")]
    pub strengths: Option<Vec<f64>>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Input CSV file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    Auto,
    Exact,
    Heuristic,
}

impl From<MethodArg> for SolverMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Auto => SolverMethod::Auto,
            MethodArg::Exact => SolverMethod::Exact,
            MethodArg::Heuristic => SolverMethod::Heuristic,
        }
    }
}

use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

pub const DEFAULT_PARAMETER_FILE: &str = "parameters.prm";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "IBFSI CLI - Runs a partitioned immersed-boundary fluid-structure interaction simulation on non-matching 2D meshes.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the parameter file (TOML format).
    #[arg(value_name = "PATH", default_value = DEFAULT_PARAMETER_FILE)]
    pub parameters: PathBuf,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Set a specific parameter value, overriding the parameter file.
    /// Can be used multiple times. Example: -S time.end-time=0.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,

    /// Write the per-step coupling history to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,
}

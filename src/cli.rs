use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// UGE to slurm command translator
///
/// Translates Univa Grid Engine command lines into their slurm equivalents
/// and runs them. Run without a subcommand to see which UGE and slurm
/// commands are installed.
///
/// Options without a slurm equivalent are reported as warnings (silently
/// dropped behavior) or errors (the job cannot be translated).
#[derive(Parser, Debug)]
#[command(name = "uge2slurm")]
#[command(version)]
#[command(about, long_about)]
pub struct Cli {
    /// Suppress colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a job with sbatch using qsub options
    Qsub(QsubArgs),
}

// qsub owns `-h` (hold) and `-V` (export environment), so clap's short help
// flag is disabled here and every qsub token is collected verbatim.
#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct QsubArgs {
    /// Print the translated sbatch command instead of running it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Path to the sbatch binary (defaults to the one found on PATH)
    #[arg(long = "sbatch", env = "UGE2SLURM_SBATCH")]
    pub sbatch: Option<PathBuf>,

    /// Seconds to wait for sbatch before giving up
    #[arg(long = "timeout", env = "UGE2SLURM_TIMEOUT", default_value_t = 15)]
    pub timeout: u64,

    /// Print help
    #[arg(long = "help", action = clap::ArgAction::Help)]
    pub help: Option<bool>,

    /// qsub options followed by the job command and its arguments
    #[arg(
        value_name = "QSUB_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

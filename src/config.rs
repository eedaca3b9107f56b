use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, Commands, QsubArgs};
use crate::error::Uge2SlurmError;

#[derive(Debug)]
pub struct Config {
    pub no_color: bool,
    pub verbose: bool,
    pub mode: Mode,
}

/// What the binary was asked to do.
#[derive(Debug)]
pub enum Mode {
    /// Print version and the command status table.
    Status,
    Qsub(QsubConfig),
}

/// Settings for translating and submitting one qsub command line.
#[derive(Debug, Clone)]
pub struct QsubConfig {
    /// Directory `-cwd` and relative output paths resolve against.
    pub working_dir: PathBuf,
    pub dry_run: bool,
    /// Explicit sbatch binary; looked up on PATH when `None`.
    pub sbatch: Option<PathBuf>,
    pub timeout: Duration,
    /// Raw qsub arguments.
    pub args: Vec<String>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, Uge2SlurmError> {
        let mode = match cli.command {
            None => Mode::Status,
            Some(Commands::Qsub(args)) => Mode::Qsub(QsubConfig::from_args(args)?),
        };

        Ok(Self {
            no_color: cli.no_color,
            verbose: cli.verbose,
            mode,
        })
    }
}

impl QsubConfig {
    pub fn from_args(args: QsubArgs) -> Result<Self, Uge2SlurmError> {
        if args.timeout == 0 {
            return Err(Uge2SlurmError::Config(
                "Timeout must be at least one second".to_string(),
            ));
        }

        let working_dir = std::env::current_dir().map_err(|e| {
            Uge2SlurmError::Config(format!("Cannot determine current directory: {}", e))
        })?;

        Ok(Self {
            working_dir,
            dry_run: args.dry_run,
            sbatch: args.sbatch,
            timeout: Duration::from_secs(args.timeout),
            args: args.args,
        })
    }
}

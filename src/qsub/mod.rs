//! qsub to sbatch translation.
//!
//! The raw qsub arguments are parsed into [`ParsedArgs`] by [`QsubParser`],
//! translated by [`CommandMapper`] using the rules in [`registry`], and the
//! resulting sbatch arguments are either printed (`--dry-run`) or handed to
//! [`SlurmRunner`](crate::slurm::SlurmRunner).

pub mod mapper;
pub mod options;
pub mod parser;
pub mod registry;
pub mod rules;

pub use mapper::{CommandMapper, Diagnostic, MapperError, Severity, TargetArgs, Translation};
pub use options::{OptionValue, ParsedArgs, ValueKind};
pub use parser::{ParseError, QsubParser};
pub use registry::{OptionSpec, TranslationRule, REGISTRY};

use crate::config::QsubConfig;
use crate::error::Result;
use crate::slurm::{self, SlurmRunner};

/// Name of the slurm submission command.
pub const SBATCH: &str = "sbatch";

/// Parses and translates qsub arguments into sbatch arguments.
pub fn translate(config: &QsubConfig) -> Result<Translation> {
    let parsed = QsubParser::new().parse(config.args.iter().cloned())?;
    let translation = CommandMapper::new(&config.working_dir).translate(&parsed)?;

    log::debug!("sbatch arguments: {:?}", translation.args);
    Ok(translation)
}

/// Runs the `qsub` subcommand.
pub fn run(config: &QsubConfig) -> Result<()> {
    let translation = translate(config)?;

    if config.dry_run {
        println!("{}", slurm::command_line(SBATCH, &translation.args));
        return Ok(());
    }

    let runner = SlurmRunner::locate(SBATCH, config.sbatch.as_deref())?;
    let stdout = runner.run(&translation.args, config.timeout)?;
    print!("{}", stdout);

    Ok(())
}

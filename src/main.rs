use clap::{CommandFactory, Parser};
use uge2slurm::{
    cli::Cli,
    commands,
    config::{Config, Mode},
    logging::init_logging,
    qsub,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color);

    let config = Config::from_cli(cli)?;

    log::debug!("Configuration: {:?}", config);

    match config.mode {
        Mode::Status => {
            println!("uge2slurm {}", env!("CARGO_PKG_VERSION"));
            println!("{}", Cli::command().render_usage());
            commands::print_status();
        }
        Mode::Qsub(qsub_config) => qsub::run(&qsub_config)?,
    }

    Ok(())
}

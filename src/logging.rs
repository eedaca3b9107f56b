use std::io::Write;

use colored::control::set_override;
use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter};

pub fn init_logging(verbose: bool, no_color: bool) {
    // Disable colors globally if requested
    if no_color {
        set_override(false);
    }

    Builder::new()
        .filter_level(level_filter(verbose))
        .format(|buf, record| writeln!(buf, "{}{}", prefix(record.level()), record.args()))
        .init();
}

fn level_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Severity prefix; info messages are printed bare.
fn prefix(level: Level) -> ColoredString {
    match level {
        Level::Error => "error: ".red().bold(),
        Level::Warn => "warning: ".yellow().bold(),
        Level::Info => "".normal(),
        Level::Debug | Level::Trace => "debug: ".dimmed(),
    }
}

//! Invocation of slurm commands.

mod runner;

pub use runner::{CommandError, SlurmRunner};

/// Renders a command line that a POSIX shell parses back into exactly
/// `program` followed by `args`.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(word: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "%+,-./:=@_".contains(c);

    if !word.is_empty() && word.chars().all(is_safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

use thiserror::Error;

use crate::qsub::{MapperError, ParseError};
use crate::slurm::CommandError;

#[derive(Error, Debug)]
pub enum Uge2SlurmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Mapping(#[from] MapperError),

    #[error("{0}")]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, Uge2SlurmError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
}

pub type CliResult<T> = Result<T, CliError>;

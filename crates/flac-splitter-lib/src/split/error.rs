use crate::audio::error::AudioError;
use crate::cue::error::CueError;
use crate::split::boundary::BoundaryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Cue(#[from] CueError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error("No external splitter available, install shnsplit or ffmpeg")]
    NoSplitterAvailable,

    #[error("Output {0:?} already exists")]
    OutputAlreadyExists(PathBuf),

    #[error("Expected output {0:?} was not produced")]
    MissingOutput(PathBuf),
}

pub type SplitResult<T> = Result<T, SplitError>;

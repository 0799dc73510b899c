use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Malformed sheet at line {line}: {reason}")]
    MalformedSheet { line: usize, reason: String },

    #[error("Sheet is incomplete: {0}")]
    MissingField(MissingField),

    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),
}

/// Required parts of a sheet checked by strict validation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MissingField {
    AudioFile,
    AlbumTitle,
    Tracks,
    TrackTitle(u32),
    TrackIndex(u32),
}

impl Display for MissingField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::AudioFile => write!(f, "missing FILE directive"),
            MissingField::AlbumTitle => write!(f, "missing album TITLE"),
            MissingField::Tracks => write!(f, "no tracks found"),
            MissingField::TrackTitle(number) => write!(f, "track {number} missing TITLE"),
            MissingField::TrackIndex(number) => write!(f, "track {number} missing INDEX 01"),
        }
    }
}

impl From<MissingField> for CueError {
    fn from(field: MissingField) -> Self {
        CueError::MissingField(field)
    }
}

pub type CueResult<T> = Result<T, CueError>;

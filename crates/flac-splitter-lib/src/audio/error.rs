use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Could not decode {path:?}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Could not encode {path:?}: {reason}")]
    EncodeFailure { path: PathBuf, reason: String },

    #[error("Could not write tags to {path:?}: {reason}")]
    TagWriteFailure { path: PathBuf, reason: String },

    #[error("Unsupported audio source: {0:?}")]
    UnsupportedSource(PathBuf),

    #[error("{tool} failed: {output}")]
    ExternalToolFailed { tool: &'static str, output: String },
}

pub type AudioResult<T> = Result<T, AudioError>;

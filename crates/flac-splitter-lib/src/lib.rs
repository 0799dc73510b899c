//! Splits single-file albums described by a CUE sheet into one tagged FLAC file per track.

pub mod audio;
pub mod cue;
pub mod external;
pub mod split;

use crate::split::error::SplitError;
use std::path::PathBuf;

#[derive(Debug)]
pub enum TrackStatus {
    /// Audio and tags are in place.
    Written,
    /// Audio is in place but the tags could not be written.
    Untagged(SplitError),
    /// No usable output for this track.
    Failed(SplitError),
}

#[derive(Debug)]
pub struct TrackOutcome {
    pub number: u32,
    pub title: String,
    pub output: PathBuf,
    pub status: TrackStatus,
}

impl TrackOutcome {
    pub fn has_audio(&self) -> bool {
        !matches!(self.status, TrackStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&SplitError> {
        match &self.status {
            TrackStatus::Written => None,
            TrackStatus::Untagged(err) | TrackStatus::Failed(err) => Some(err),
        }
    }
}

/// Per-track results of splitting one album, in sheet order.
#[derive(Debug)]
pub struct AlbumReport {
    pub album: String,
    /// Name of the strategy that produced the outputs.
    pub strategy: String,
    pub tracks: Vec<TrackOutcome>,
}

impl AlbumReport {
    pub fn written(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Written))
    }

    pub fn untagged(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Untagged(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Failed(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.written() == self.tracks.len()
    }

    /// Tracks that were not fully written, with the reason.
    pub fn problems(&self) -> impl Iterator<Item = (&TrackOutcome, &SplitError)> {
        self.tracks
            .iter()
            .filter_map(|track| track.error().map(|err| (track, err)))
    }

    fn count(&self, predicate: impl Fn(&TrackStatus) -> bool) -> usize {
        self.tracks
            .iter()
            .filter(|track| predicate(&track.status))
            .count()
    }
}

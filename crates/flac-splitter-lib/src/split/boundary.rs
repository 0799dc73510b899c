//! Turns the sheet's track list into per-track sample ranges.
//!
//! Tracks are never reordered. Each one gets its own result so a bad index only costs that
//! track: starts past the end of the source are [`BoundaryError::OutOfRange`], non-monotonic
//! neighbours yield [`BoundaryError::EmptyRange`], and under [`TimecodePolicy::Strict`] a track
//! without a usable index is [`BoundaryError::MissingIndex`].

use crate::cue::models::Track;
use crate::cue::timecode::{Timecode, TimecodePolicy};
use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum BoundaryError {
    #[error("Track {track} starts at sample {start} but the source has only {total} samples")]
    OutOfRange { track: u32, start: u64, total: u64 },

    #[error("Track {track} ends at {end} before it starts at {start}")]
    EmptyRange {
        track: u32,
        start: Timecode,
        end: Timecode,
    },

    #[error("Track {track} has no usable INDEX 01")]
    MissingIndex { track: u32 },
}

/// Half-open `[start, end)` interval of samples per channel belonging to one track.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SampleRange {
    pub track: u32,
    pub start: u64,
    pub end: u64,
}

impl SampleRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Track position in sheet time, before the source's length is known.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TimecodeBounds {
    pub track: u32,
    pub start: Timecode,
    /// Start of the next track; `None` for the last one.
    pub end: Option<Timecode>,
}

fn track_start(track: &Track, policy: TimecodePolicy) -> Option<Timecode> {
    match policy {
        TimecodePolicy::Lenient => Some(track.index.unwrap_or(Timecode::ZERO)),
        TimecodePolicy::Strict => track.index,
    }
}

/// Start and end timecodes of every track, in sheet order.
///
/// A track's end is the start of the next track that has one. Ends that are not after the start
/// make the track an [`BoundaryError::EmptyRange`].
pub fn timecode_bounds(
    tracks: &[Track],
    policy: TimecodePolicy,
) -> Vec<Result<TimecodeBounds, BoundaryError>> {
    let starts: Vec<Option<Timecode>> = tracks
        .iter()
        .map(|track| track_start(track, policy))
        .collect();

    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let start = starts[i].ok_or(BoundaryError::MissingIndex {
                track: track.number,
            })?;
            let end = starts[i + 1..].iter().flatten().next().copied();

            if let Some(end) = end {
                if end.total_frames() <= start.total_frames() {
                    return Err(BoundaryError::EmptyRange {
                        track: track.number,
                        start,
                        end,
                    });
                }
            }

            Ok(TimecodeBounds {
                track: track.number,
                start,
                end,
            })
        })
        .collect()
}

/// Places `bounds` in a source of `total_samples` at `sample_rate`. The end is clamped to the
/// source length and the last track always runs to the end of the source.
pub fn sample_range(
    bounds: &TimecodeBounds,
    total_samples: u64,
    sample_rate: u32,
) -> Result<SampleRange, BoundaryError> {
    let start = bounds.start.to_sample(sample_rate);
    if start >= total_samples {
        return Err(BoundaryError::OutOfRange {
            track: bounds.track,
            start,
            total: total_samples,
        });
    }

    let end = bounds
        .end
        .map_or(total_samples, |end| end.to_sample(sample_rate))
        .min(total_samples);

    // distinct timecodes can still land on the same sample at very low rates
    if end <= start {
        return Err(BoundaryError::EmptyRange {
            track: bounds.track,
            start: bounds.start,
            end: bounds.end.unwrap_or(bounds.start),
        });
    }

    Ok(SampleRange {
        track: bounds.track,
        start,
        end,
    })
}

/// One result per track, in sheet order.
pub fn resolve(
    tracks: &[Track],
    total_samples: u64,
    sample_rate: u32,
    policy: TimecodePolicy,
) -> Vec<Result<SampleRange, BoundaryError>> {
    timecode_bounds(tracks, policy)
        .into_iter()
        .map(|bounds| sample_range(&bounds?, total_samples, sample_rate))
        .collect()
}

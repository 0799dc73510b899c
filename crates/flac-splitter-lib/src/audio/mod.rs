//! Capabilities the splitting engine is written against, and their FLAC/WAV implementations.

use crate::audio::error::{AudioError, AudioResult};
use crate::audio::flac::FlacDecoder;
use crate::audio::tags::TagSet;
use crate::audio::wav::WavDecoder;
use std::path::Path;

pub mod error;
pub mod flac;
pub mod tags;
pub mod vorbis;
pub mod wav;

/// Shape of the PCM data, shared by source and outputs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StreamInfo {
    pub format: PcmFormat,
    /// Samples per channel.
    pub total_samples: u64,
}

impl StreamInfo {
    pub fn duration_seconds(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f64 / self.format.sample_rate as f64
    }
}

/// A fully decoded source, one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub info: StreamInfo,
    pub channels: Vec<Vec<i32>>,
}

impl DecodedAudio {
    /// Builds per-channel buffers from interleaved samples; the sample count comes from the data.
    pub fn from_interleaved(
        path: &Path,
        format: PcmFormat,
        samples: Vec<i32>,
    ) -> AudioResult<Self> {
        let channel_count = format.channels as usize;
        if channel_count == 0 || samples.len() % channel_count != 0 {
            return Err(AudioError::DecodeFailure {
                path: path.to_path_buf(),
                reason: format!(
                    "{} samples cannot be split into {channel_count} channels",
                    samples.len()
                ),
            });
        }

        let frames = samples.len() / channel_count;
        let mut channels: Vec<Vec<i32>> = (0..channel_count)
            .map(|_| Vec::with_capacity(frames))
            .collect();
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Ok(Self {
            info: StreamInfo {
                format,
                total_samples: frames as u64,
            },
            channels,
        })
    }

    /// Borrowed `[start, end)` slice of every channel, clamped to the decoded length.
    pub fn slice(&self, start: u64, end: u64) -> Vec<&[i32]> {
        self.channels
            .iter()
            .map(|channel| {
                let end = (end as usize).min(channel.len());
                let start = (start as usize).min(end);
                &channel[start..end]
            })
            .collect()
    }
}

pub fn interleave(channels: &[&[i32]]) -> Vec<i32> {
    let frames = channels.first().map_or(0, |c| c.len());
    let mut interleaved = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            interleaved.push(channel[i]);
        }
    }
    interleaved
}

pub trait Decoder {
    fn name(&self) -> &'static str;

    /// Reads only what is needed to describe the stream.
    fn probe(&self, path: &Path) -> AudioResult<StreamInfo>;

    fn decode(&self, path: &Path) -> AudioResult<DecodedAudio>;
}

pub trait Encoder {
    fn name(&self) -> &'static str;

    /// Extension of the files this encoder writes, without the dot.
    fn extension(&self) -> &'static str;

    /// Writes a standalone playable file holding `channels`.
    fn encode(&self, path: &Path, format: &PcmFormat, channels: &[&[i32]]) -> AudioResult<()>;
}

pub trait TagWriter {
    fn name(&self) -> &'static str;

    /// Replaces the file's tag block with exactly `tags`.
    fn write_tags(&self, path: &Path, tags: &TagSet) -> AudioResult<()>;
}

/// Picks a decoder from the source file extension.
#[derive(Debug, Clone, Default)]
pub struct SourceDecoder {
    flac: FlacDecoder,
    wav: WavDecoder,
}

impl SourceDecoder {
    fn select(&self, path: &Path) -> AudioResult<&dyn Decoder> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "flac" => Ok(&self.flac),
            "wav" | "wave" => Ok(&self.wav),
            _ => Err(AudioError::UnsupportedSource(path.to_path_buf())),
        }
    }
}

impl Decoder for SourceDecoder {
    fn name(&self) -> &'static str {
        "Source Decoder"
    }

    fn probe(&self, path: &Path) -> AudioResult<StreamInfo> {
        self.select(path)?.probe(path)
    }

    fn decode(&self, path: &Path) -> AudioResult<DecodedAudio> {
        self.select(path)?.decode(path)
    }
}

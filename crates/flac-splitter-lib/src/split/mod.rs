//! Cutting one album into tagged per-track files.
//!
//! [`Splitter`] is written once against the [`Decoder`], [`Encoder`], [`TagWriter`] and
//! [`ExternalSplitter`] capabilities; the [`SplitMode`] only decides which of them take part.

use crate::audio::flac::FlacEncoder;
use crate::audio::vorbis::VorbisTagWriter;
use crate::audio::{Decoder, Encoder, SourceDecoder, TagWriter};
use crate::cue::timecode::TimecodePolicy;
use crate::external::ffmpeg::FfmpegSplitter;
use crate::external::shnsplit::ShnsplitSplitter;
use crate::external::{BoxedSplitter, ExternalSplitter};
use std::path::PathBuf;

pub mod boundary;
mod engine;
pub mod error;
pub mod naming;
pub mod outcome;
pub mod router;
pub mod tags;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum SplitMode {
    /// Decode and re-encode in process. Needs no external tools.
    #[default]
    Full,
    /// Validate track starts against the decoded stream info, cut with an external tool.
    Hybrid,
    /// Cut with an external tool only.
    External,
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub output_dir: PathBuf,
    pub mode: SplitMode,
    /// Replace existing outputs. When off, an existing output fails only its track.
    pub overwrite: bool,
    pub prefer_ffmpeg: bool,
    /// Text between track number and title in output names.
    pub separator: String,
    pub timecodes: TimecodePolicy,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            mode: SplitMode::default(),
            overwrite: true,
            prefer_ffmpeg: false,
            separator: " - ".to_string(),
            timecodes: TimecodePolicy::default(),
        }
    }
}

/// Implementations the splitter works with.
pub struct Capabilities {
    pub decoder: Box<dyn Decoder + Send + Sync>,
    pub encoder: Box<dyn Encoder + Send + Sync>,
    pub tag_writer: Box<dyn TagWriter + Send + Sync>,
    pub external: Vec<BoxedSplitter>,
}

impl Capabilities {
    pub fn with_external(mut self, splitter: impl ExternalSplitter + Send + Sync + 'static) -> Self {
        self.external.push(Box::new(splitter));
        self
    }
}

impl Default for Capabilities {
    /// FLAC/WAV sources, verbatim FLAC outputs, Vorbis comments, and whichever of shnsplit and
    /// ffmpeg are on `PATH`.
    fn default() -> Self {
        Self {
            decoder: Box::new(SourceDecoder::default()),
            encoder: Box::new(FlacEncoder::default()),
            tag_writer: Box::new(VorbisTagWriter),
            external: vec![
                Box::new(ShnsplitSplitter::new()),
                Box::new(FfmpegSplitter::new()),
            ],
        }
    }
}

pub struct Splitter {
    options: SplitOptions,
    capabilities: Capabilities,
}

impl Splitter {
    pub fn new(options: SplitOptions, capabilities: Capabilities) -> Self {
        Self {
            options,
            capabilities,
        }
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }
}

use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{DecodedAudio, Decoder, Encoder, PcmFormat, StreamInfo, interleave};
use claxon::FlacReader;
use flacenc::bitsink::ByteSink;
use flacenc::component::{BitRepr, MetadataBlockData};
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use log::debug;
use std::fs::File;
use std::path::Path;

/// Standard FLAC block size; the last frame of a track is shortened to fit.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Size of the PADDING block written after STREAMINFO, so STREAMINFO is never the last
/// metadata block of an encoded file.
pub const PADDING_LEN: usize = 1024;
const PADDING_TYPE: u8 = 1;

#[derive(Debug, Clone, Default)]
pub struct FlacDecoder;

impl FlacDecoder {
    fn open(&self, path: &Path) -> AudioResult<FlacReader<File>> {
        FlacReader::open(path).map_err(|err| decode_failure(path, err))
    }
}

fn decode_failure(path: &Path, err: impl std::fmt::Display) -> AudioError {
    AudioError::DecodeFailure {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn pcm_format(reader: &FlacReader<File>) -> PcmFormat {
    let info = reader.streaminfo();
    PcmFormat {
        sample_rate: info.sample_rate,
        channels: info.channels as u16,
        bits_per_sample: info.bits_per_sample,
    }
}

impl Decoder for FlacDecoder {
    fn name(&self) -> &'static str {
        "FLAC Decoder"
    }

    fn probe(&self, path: &Path) -> AudioResult<StreamInfo> {
        let reader = self.open(path)?;
        let format = pcm_format(&reader);

        match reader.streaminfo().samples {
            Some(total_samples) if total_samples > 0 => Ok(StreamInfo {
                format,
                total_samples,
            }),
            _ => {
                debug!("STREAMINFO of {path:?} has no sample count, decoding to count samples");
                Ok(self.decode(path)?.info)
            }
        }
    }

    fn decode(&self, path: &Path) -> AudioResult<DecodedAudio> {
        let mut reader = self.open(path)?;
        let format = pcm_format(&reader);
        let expected = reader.streaminfo().samples.unwrap_or(0) * format.channels as u64;

        let mut samples = Vec::with_capacity(expected as usize);
        for sample in reader.samples() {
            samples.push(sample.map_err(|err| decode_failure(path, err))?);
        }

        debug!(
            "Decoded {} samples from {path:?} ({} Hz, {} channels, {} bits)",
            samples.len(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample
        );

        DecodedAudio::from_interleaved(path, format, samples)
    }
}

/// Writes FLAC files with verbatim subframes: every sample is stored as-is, so no prediction
/// or stereo decorrelation is involved and the output is bit-exact with the input.
#[derive(Debug, Clone)]
pub struct FlacEncoder {
    block_size: usize,
}

impl FlacEncoder {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: flac_block_size(block_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Default for FlacEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl Encoder for FlacEncoder {
    fn name(&self) -> &'static str {
        "FLAC Verbatim Encoder"
    }

    fn extension(&self) -> &'static str {
        "flac"
    }

    fn encode(&self, path: &Path, format: &PcmFormat, channels: &[&[i32]]) -> AudioResult<()> {
        let bytes = encode_verbatim(format, channels, self.block_size).map_err(|reason| {
            AudioError::EncodeFailure {
                path: path.to_path_buf(),
                reason,
            }
        })?;

        std::fs::write(path, bytes)?;
        Ok(())
    }
}

pub fn encode_verbatim(
    format: &PcmFormat,
    channels: &[&[i32]],
    block_size: usize,
) -> Result<Vec<u8>, String> {
    if channels.len() != format.channels as usize || channels.is_empty() {
        return Err(format!(
            "expected {} channels, got {}",
            format.channels,
            channels.len()
        ));
    }

    let frames = channels[0].len();
    if frames == 0 {
        return Err("no samples to encode".to_string());
    }
    if channels.iter().any(|channel| channel.len() != frames) {
        return Err("channels have different lengths".to_string());
    }

    let mut config = config::Encoder::default();
    config.block_size = flac_block_size(block_size);
    config.stereo_coding.use_leftside = false;
    config.stereo_coding.use_rightside = false;
    config.stereo_coding.use_midside = false;
    config.subframe_coding.use_constant = false;
    config.subframe_coding.use_fixed = false;
    config.subframe_coding.use_lpc = false;
    let config = config
        .into_verified()
        .map_err(|(_, err)| format!("invalid encoder config: {err}"))?;

    let samples = interleave(channels);
    let source = MemSource::from_samples(
        &samples,
        channels.len(),
        format.bits_per_sample as usize,
        format.sample_rate as usize,
    );
    let mut stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|err| format!("could not encode with fixed block size: {err:?}"))?;
    let padding = MetadataBlockData::new_unknown(PADDING_TYPE, &[0; PADDING_LEN])
        .map_err(|err| format!("invalid padding block: {err:?}"))?;
    stream.add_metadata_block(padding);

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|err| format!("could not write stream: {err:?}"))?;
    Ok(sink.into_inner())
}

fn flac_block_size(block_size: usize) -> usize {
    block_size.clamp(
        flacenc::constant::MIN_BLOCK_SIZE,
        flacenc::constant::MAX_BLOCK_SIZE,
    )
}

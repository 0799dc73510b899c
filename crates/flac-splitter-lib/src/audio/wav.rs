use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{DecodedAudio, Decoder, PcmFormat, StreamInfo};
use hound::{SampleFormat, WavReader};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Integer PCM WAV sources. Float WAV has no lossless FLAC counterpart and is rejected.
#[derive(Debug, Clone, Default)]
pub struct WavDecoder;

impl WavDecoder {
    fn open(&self, path: &Path) -> AudioResult<(WavReader<BufReader<File>>, PcmFormat)> {
        let reader = WavReader::open(path).map_err(|err| AudioError::DecodeFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int {
            return Err(AudioError::DecodeFailure {
                path: path.to_path_buf(),
                reason: "floating point samples are not supported".to_string(),
            });
        }

        let format = PcmFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample as u32,
        };
        Ok((reader, format))
    }
}

impl Decoder for WavDecoder {
    fn name(&self) -> &'static str {
        "WAV Decoder"
    }

    fn probe(&self, path: &Path) -> AudioResult<StreamInfo> {
        let (reader, format) = self.open(path)?;
        Ok(StreamInfo {
            format,
            total_samples: reader.duration() as u64,
        })
    }

    fn decode(&self, path: &Path) -> AudioResult<DecodedAudio> {
        let (mut reader, format) = self.open(path)?;

        let samples = reader
            .samples::<i32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AudioError::DecodeFailure {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        debug!("Decoded {} samples from {path:?}", samples.len());
        DecodedAudio::from_interleaved(path, format, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, spec: WavSpec, samples: &[i32]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for sample in samples {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_integer_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("album.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, &[1, -1, 2, -2, 3, -3]);

        let info = WavDecoder.probe(&path).unwrap();
        assert_eq!(info.total_samples, 3);
        assert_eq!(info.format.bits_per_sample, 16);

        let decoded = WavDecoder.decode(&path).unwrap();
        assert_eq!(decoded.channels, vec![vec![1, 2, 3], vec![-1, -2, -3]]);
    }

    #[test]
    fn rejects_float_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            WavDecoder.probe(&path),
            Err(AudioError::DecodeFailure { .. })
        ));
    }
}

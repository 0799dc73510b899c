use crate::audio::error::AudioResult;
use crate::cue::timecode;
use crate::external::{ExternalSplitRequest, ExternalSplitter, find_executable, run};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Cuts one track per `ffmpeg` invocation, re-encoding to FLAC without carrying over the
/// source's metadata.
#[derive(Debug, Clone)]
pub struct FfmpegSplitter {
    program: Option<PathBuf>,
}

impl FfmpegSplitter {
    pub fn new() -> Self {
        Self {
            program: find_executable("ffmpeg"),
        }
    }

    fn arguments(request: &ExternalSplitRequest, index: usize) -> Vec<String> {
        let track = &request.tracks[index];
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            request.source.to_string_lossy().into_owned(),
            "-ss".to_string(),
            format!("{:.6}", track.start.to_seconds()),
        ];

        if let Some(seconds) = track
            .end
            .as_ref()
            .and_then(|end| timecode::duration(&track.start, end))
        {
            args.push("-t".to_string());
            args.push(format!("{seconds:.6}"));
        }

        args.extend(
            ["-map", "0:a", "-map_metadata", "-1", "-c:a", "flac"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(if request.overwrite { "-y" } else { "-n" }.to_string());
        args.push(track.output.to_string_lossy().into_owned());
        args
    }
}

impl Default for FfmpegSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalSplitter for FfmpegSplitter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()> {
        let program = self.program.as_deref().unwrap_or(Path::new("ffmpeg"));

        for (index, track) in request.tracks.iter().enumerate() {
            let mut command = Command::new(program);
            command.args(Self::arguments(request, index));

            // a failed cut only loses that track
            if let Err(err) = run(self.name(), &mut command) {
                warn!("Failed to extract track {} with ffmpeg: {err}", track.number);
            }
        }

        info!("Split complete with ffmpeg");
        Ok(())
    }
}

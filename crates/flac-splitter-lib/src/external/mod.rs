//! Hand-off to third-party splitters found on `PATH`.

use crate::audio::error::{AudioError, AudioResult};
use crate::cue::models::Album;
use crate::cue::timecode::Timecode;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

pub mod ffmpeg;
pub mod sheet;
pub mod shnsplit;

/// One output the external tool is expected to produce.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlannedTrack {
    pub number: u32,
    /// Sanitized title, as it appears in the output file name.
    pub title: String,
    pub start: Timecode,
    /// Start of the next planned track; `None` runs to the end of the stream.
    pub end: Option<Timecode>,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExternalSplitRequest<'a> {
    pub album: &'a Album,
    pub source: &'a Path,
    pub output_dir: &'a Path,
    pub tracks: &'a [PlannedTrack],
    pub overwrite: bool,
}

pub trait ExternalSplitter {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Cuts `request.source` into `request.tracks`. A tool may skip individual tracks; the caller
    /// checks which planned outputs exist afterwards.
    fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()>;
}

pub type BoxedSplitter = Box<dyn ExternalSplitter + Send + Sync>;

/// Searches `PATH` for an executable called `name`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| executable_candidates(&dir, name))
        .find(|candidate| candidate.is_file())
}

fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(format!("{name}.exe")), dir.join(name)]
    } else {
        vec![dir.join(name)]
    }
}

/// Runs `command` to completion, turning a non-zero exit into [`AudioError::ExternalToolFailed`]
/// carrying the combined output.
fn run(tool: &'static str, command: &mut Command) -> AudioResult<()> {
    debug!("Running {command:?}");

    let output = command.output()?;
    if output.status.success() {
        return Ok(());
    }

    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stdout));
    Err(AudioError::ExternalToolFailed {
        tool,
        output: format!("{} ({})", text.trim(), output.status),
    })
}

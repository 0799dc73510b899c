use crate::audio::error::{AudioError, AudioResult};
use crate::external::sheet::{Piece, render_sheet, split_runs};
use crate::external::{ExternalSplitRequest, ExternalSplitter, find_executable, run};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Splits an album with `shnsplit` driven by rendered sheets. Every run of non-overlapping tracks
/// is cut into a scratch directory inside the output directory, then each piece is moved to its
/// planned output and fillers are discarded with the scratch directory.
#[derive(Debug, Clone)]
pub struct ShnsplitSplitter {
    program: Option<PathBuf>,
}

impl ShnsplitSplitter {
    pub fn new() -> Self {
        Self {
            program: find_executable("shnsplit"),
        }
    }

    fn arguments(sheet_path: &Path, scratch: &Path, source: &Path) -> Vec<OsString> {
        vec![
            "-f".into(),
            sheet_path.into(),
            "-t".into(),
            "%n".into(),
            "-o".into(),
            "flac".into(),
            "-d".into(),
            scratch.into(),
            "-O".into(),
            "always".into(),
            source.into(),
        ]
    }

    fn split_run(
        &self,
        request: &ExternalSplitRequest,
        source: &Path,
        pieces: &[Piece],
    ) -> AudioResult<()> {
        let scratch = tempfile::Builder::new()
            .prefix(".flac-splitter-")
            .tempdir_in(request.output_dir)?;
        let sheet_path = scratch.path().join("split.cue");
        std::fs::write(&sheet_path, render_sheet(request.album, source, pieces))?;
        debug!("Wrote temporary sheet {sheet_path:?}");

        let program = self.program.as_deref().unwrap_or(Path::new("shnsplit"));
        let mut command = Command::new(program);
        command.args(Self::arguments(&sheet_path, scratch.path(), source));
        run(self.name(), &mut command)?;

        let produced = numbered_pieces(scratch.path())?;
        if produced.len() < pieces.len() {
            return Err(AudioError::ExternalToolFailed {
                tool: self.name(),
                output: format!(
                    "expected {} pieces, found {}",
                    pieces.len(),
                    produced.len()
                ),
            });
        }

        // a leading pregap piece, if any, sorts first
        let skip = produced.len() - pieces.len();
        for (piece, path) in pieces.iter().zip(&produced[skip..]) {
            let Some(track) = piece.track else {
                continue;
            };
            if !request.overwrite && track.output.exists() {
                warn!("Keeping existing {:?}", track.output);
                continue;
            }
            std::fs::rename(path, &track.output)?;
        }
        Ok(())
    }
}

/// FLAC files in `dir` named by a bare number, in numeric order.
fn numbered_pieces(dir: &Path) -> AudioResult<Vec<PathBuf>> {
    let mut pieces = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "flac") {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u32>().ok());
        if let Some(number) = number {
            pieces.push((number, path));
        }
    }

    pieces.sort_by_key(|(number, _)| *number);
    Ok(pieces.into_iter().map(|(_, path)| path).collect())
}

impl Default for ShnsplitSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalSplitter for ShnsplitSplitter {
    fn name(&self) -> &'static str {
        "shnsplit"
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()> {
        let source = std::path::absolute(request.source)?;
        let runs = split_runs(request.tracks);
        if runs.len() > 1 {
            debug!("Overlapping tracks, splitting in {} passes", runs.len());
        }

        // one failed pass leaves its tracks missing, the others still count
        let mut failure = None;
        for pieces in &runs {
            if let Err(err) = self.split_run(request, &source, pieces) {
                warn!("shnsplit pass failed: {err}");
                failure = Some(err);
            }
        }

        match failure {
            Some(err) => Err(err),
            None => {
                info!("Split complete with shnsplit");
                Ok(())
            }
        }
    }
}

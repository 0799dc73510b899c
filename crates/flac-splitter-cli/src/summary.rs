use flac_splitter_lib::split::outcome::AlbumReport;
use std::path::{Path, PathBuf};

/// What happened to one sheet.
#[derive(Debug)]
pub enum AlbumOutcome {
    Split(AlbumReport),
    /// The referenced audio file does not exist.
    Skipped { audio: PathBuf },
    Failed(String),
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub found: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub tracks_written: usize,
    /// One line per album or track that did not come out complete.
    pub problems: Vec<String>,
}

impl BatchSummary {
    pub fn new(found: usize) -> Self {
        Self {
            found,
            ..Default::default()
        }
    }

    pub fn record(&mut self, sheet: &Path, outcome: AlbumOutcome) {
        match outcome {
            AlbumOutcome::Split(report) => {
                self.tracks_written += report.written() + report.untagged();
                for (track, err) in report.problems() {
                    self.problems.push(format!(
                        "{}: track {:02} \"{}\": {err}",
                        sheet.display(),
                        track.number,
                        track.title
                    ));
                }

                // an album without a single usable track counts as failed
                if !report.tracks.is_empty() && report.failed() == report.tracks.len() {
                    self.failed += 1;
                } else {
                    self.processed += 1;
                }
            }
            AlbumOutcome::Skipped { audio } => {
                self.skipped += 1;
                self.problems.push(format!(
                    "{}: skipped, audio file {} not found",
                    sheet.display(),
                    audio.display()
                ));
            }
            AlbumOutcome::Failed(reason) => {
                self.failed += 1;
                self.problems
                    .push(format!("{}: {reason}", sheet.display()));
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn render(&self, output: &Path) -> String {
        let mut lines = vec![
            "=== Summary ===".to_string(),
            format!("Total CUE files found: {}", self.found),
            format!("Successfully processed: {}", self.processed),
        ];
        if self.skipped > 0 {
            lines.push(format!("Skipped (audio file missing): {}", self.skipped));
        }
        if self.failed > 0 {
            lines.push(format!("Failed: {}", self.failed));
        }
        lines.push(format!("Tracks written: {}", self.tracks_written));

        if !self.problems.is_empty() {
            lines.push(String::new());
            lines.push("Problems:".to_string());
            lines.extend(self.problems.iter().map(|p| format!("  {p}")));
        }

        lines.push(String::new());
        lines.push(format!("Output directory: {}", output.display()));
        lines.join("\n")
    }
}

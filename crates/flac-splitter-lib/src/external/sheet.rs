use crate::cue::models::Album;
use crate::cue::timecode::Timecode;
use crate::external::PlannedTrack;
use std::path::Path;

/// One cut of a sequential split, from `start` to the next piece's start.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Piece<'a> {
    pub start: Timecode,
    /// `None` for filler between a track's end and the next planned start; it is thrown away.
    pub track: Option<&'a PlannedTrack>,
}

/// Orders `tracks` into runs a sequential splitter can cut in one pass: split points only move
/// forward, and a track that ends before the next one starts gets a filler piece at its end.
/// Tracks overlapping an earlier one go to a later run.
pub fn split_runs(tracks: &[PlannedTrack]) -> Vec<Vec<Piece<'_>>> {
    let mut ordered: Vec<&PlannedTrack> = tracks.iter().collect();
    ordered.sort_by_key(|track| track.start.total_frames());

    // each run with the position it has reached, `None` once it runs to the end of the stream
    let mut runs: Vec<(Vec<Piece<'_>>, Option<u64>)> = Vec::new();
    for track in ordered {
        let start = track.start.total_frames();
        let index = match runs
            .iter()
            .position(|(_, reach)| reach.is_some_and(|reach| reach <= start))
        {
            Some(index) => index,
            None => {
                runs.push((Vec::new(), Some(0)));
                runs.len() - 1
            }
        };

        let (pieces, reach) = &mut runs[index];
        if *reach == Some(start) {
            // filler would be empty, the track takes its split point
            pieces.pop();
        }

        pieces.push(Piece {
            start: track.start,
            track: Some(track),
        });
        *reach = track.end.map(|end| end.total_frames());
        if let Some(end) = track.end {
            pieces.push(Piece {
                start: end,
                track: None,
            });
        }
    }

    runs.into_iter().map(|(pieces, _)| pieces).collect()
}

/// Renders a single-file sheet with one TRACK per piece, pointing at `audio_path`. Tracks are
/// numbered by position so a tool's running counter matches the piece order.
pub fn render_sheet(album: &Album, audio_path: &Path, pieces: &[Piece]) -> String {
    let mut lines = Vec::new();

    let remarks = [
        ("GENRE", &album.genre),
        ("DATE", &album.date),
        ("DISCID", &album.disc_id),
        ("COMMENT", &album.comment),
    ];
    for (key, value) in remarks {
        if let Some(value) = value {
            lines.push(format!("REM {key} {}", quoted(value)));
        }
    }
    if let Some(catalog) = &album.catalog {
        lines.push(format!("CATALOG {catalog}"));
    }
    if let Some(performer) = &album.performer {
        lines.push(format!("PERFORMER {}", quoted(performer)));
    }
    if let Some(title) = &album.title {
        lines.push(format!("TITLE {}", quoted(title)));
    }
    lines.push(format!(
        "FILE {} WAVE",
        quoted(&audio_path.to_string_lossy())
    ));

    for (position, piece) in pieces.iter().enumerate() {
        lines.push(format!("  TRACK {:02} AUDIO", position + 1));

        if let Some(planned) = piece.track {
            lines.push(format!("    TITLE {}", quoted(&planned.title)));
            if let Some(performer) = album
                .track(planned.number)
                .and_then(|track| track.performer.as_ref())
            {
                lines.push(format!("    PERFORMER {}", quoted(performer)));
            }
        }
        lines.push(format!("    INDEX 01 {}", piece.start));
    }

    let mut sheet = lines.join("\n");
    sheet.push('\n');
    sheet
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "'"))
}

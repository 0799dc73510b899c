use crate::commands::SplitCommand;
use crate::locator::{album_output_dir, find_sheets};
use crate::summary::{AlbumOutcome, BatchSummary};
use anyhow::Result;
use flac_splitter_lib::cue::CueParser;
use flac_splitter_lib::cue::ParserConfig;
use flac_splitter_lib::split::{Capabilities, SplitOptions, Splitter};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Splits every album found below `cmd.root`, one at a time.
pub async fn split_all(cmd: SplitCommand, progress: MultiProgress) -> Result<BatchSummary> {
    info!("Finding CUE files in {:?}", cmd.root);
    let sheets = find_sheets(&cmd.root, &cmd.output).await?;
    let mut summary = BatchSummary::new(sheets.len());

    if sheets.is_empty() {
        info!("No CUE files found in {:?}", cmd.root);
        return Ok(summary);
    }
    info!("Found {} CUE file(s)", sheets.len());

    let bar = progress.add(ProgressBar::new(sheets.len() as u64));
    bar.set_style(ProgressStyle::with_template(
        "[{pos}/{len}] {wide_bar} {msg}",
    )?);

    for sheet in sheets {
        let name = sheet
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(name);

        let config = cmd.parser_config();
        let options = cmd.split_options(&album_output_dir(&cmd.root, &cmd.output, &sheet));
        let job_sheet = sheet.clone();
        let outcome =
            tokio::task::spawn_blocking(move || split_sheet(&job_sheet, config, options)).await?;

        summary.record(&sheet, outcome);
        bar.inc(1);
    }

    bar.finish_and_clear();
    Ok(summary)
}

/// Parses one sheet and splits its album with the default capabilities.
fn split_sheet(sheet: &Path, config: ParserConfig, options: SplitOptions) -> AlbumOutcome {
    debug!("Parsing {:?}", sheet);
    let album = match CueParser::new(config).parse_path(sheet) {
        Ok(album) => album,
        Err(err) => {
            warn!("Could not parse {:?}: {err}", sheet);
            return AlbumOutcome::Failed(err.to_string());
        }
    };

    let sheet_dir = sheet.parent().unwrap_or(Path::new("."));
    let Some(audio) = album.audio_file_path(sheet_dir) else {
        return AlbumOutcome::Failed("sheet does not reference an audio file".to_string());
    };
    if !audio.is_file() {
        warn!("Skipping {:?}: audio file {:?} not found", sheet, audio);
        return AlbumOutcome::Skipped { audio };
    }

    debug!("Output directory: {:?}", options.output_dir);
    let splitter = Splitter::new(options, Capabilities::default());
    match splitter.split_album(&album, &audio) {
        Ok(report) => AlbumOutcome::Split(report),
        Err(err) => {
            warn!("Could not split {:?}: {err}", sheet);
            AlbumOutcome::Failed(err.to_string())
        }
    }
}

use crate::commands::InspectCommand;
use anyhow::Result;
use flac_splitter_lib::audio::{Decoder, SourceDecoder, StreamInfo};
use flac_splitter_lib::cue::CueParser;
use flac_splitter_lib::cue::models::Album;
use flac_splitter_lib::cue::timecode::TimecodePolicy;
use flac_splitter_lib::split::boundary::resolve;
use flac_splitter_lib::split::naming::track_file_name;
use log::warn;
use std::path::Path;

/// Prints the parsed sheet and, when its audio is readable, the sample range of every track.
pub async fn inspect(cmd: InspectCommand) -> Result<()> {
    let text = tokio::fs::read(&cmd.cue).await?;
    let album = CueParser::new(cmd.parser_config()).parse(&String::from_utf8_lossy(&text))?;

    let sheet_dir = cmd.cue.parent().unwrap_or(Path::new("."));
    let audio = cmd
        .audio
        .clone()
        .or_else(|| album.audio_file_path(sheet_dir));

    let stream = match audio {
        Some(audio) if audio.is_file() => {
            let probed =
                tokio::task::spawn_blocking(move || SourceDecoder::default().probe(&audio))
                    .await?;
            match probed {
                Ok(info) => Some(info),
                Err(err) => {
                    warn!("Could not read audio: {err}");
                    None
                }
            }
        }
        Some(audio) => {
            warn!("Audio file {:?} not found, showing timecodes only", audio);
            None
        }
        None => None,
    };

    println!("{}", describe(&album, stream.as_ref(), cmd.timecodes()));
    Ok(())
}

fn describe(album: &Album, stream: Option<&StreamInfo>, policy: TimecodePolicy) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        format!("Album:     {}", field(&album.title)),
        format!("Performer: {}", field(&album.performer)),
        format!("Date:      {}", field(&album.date)),
        format!("Genre:     {}", field(&album.genre)),
    ];
    if let Some(audio_file) = &album.audio_file {
        lines.push(format!(
            "File:      {} ({})",
            audio_file.name,
            audio_file.file_type.as_tag()
        ));
    }
    lines.extend(
        album
            .custom_fields
            .iter()
            .map(|(key, value)| format!("{key}: {value}")),
    );
    if let Some(info) = stream {
        lines.push(format!(
            "Stream:    {} Hz, {} channels, {} bits, {} samples ({:.2}s)",
            info.format.sample_rate,
            info.format.channels,
            info.format.bits_per_sample,
            info.total_samples,
            info.duration_seconds()
        ));
    }
    lines.push(String::new());

    let ranges = stream.map(|info| {
        resolve(
            &album.tracks,
            info.total_samples,
            info.format.sample_rate,
            policy,
        )
    });

    for (i, track) in album.tracks.iter().enumerate() {
        let index = track
            .index
            .map_or_else(|| "--:--:--".to_string(), |index| index.to_string());
        let mut line = format!(
            "{:>3}  {index}  {}",
            track.number,
            track_file_name(track, " - ", "flac")
        );

        if let Some(performer) = &track.performer {
            line.push_str(&format!("  [{performer}]"));
        }
        match ranges.as_ref().map(|ranges| &ranges[i]) {
            Some(Ok(range)) => line.push_str(&format!("  samples {}..{}", range.start, range.end)),
            Some(Err(err)) => line.push_str(&format!("  ! {err}")),
            None => {}
        }
        lines.push(line);
    }

    lines.join("\n")
}

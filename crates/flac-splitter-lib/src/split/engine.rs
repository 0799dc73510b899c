use crate::audio::DecodedAudio;
use crate::cue::models::{Album, Track};
use crate::external::{ExternalSplitRequest, ExternalSplitter, PlannedTrack};
use crate::split::Splitter;
use crate::split::boundary::{SampleRange, TimecodeBounds, resolve, sample_range, timecode_bounds};
use crate::split::error::{SplitError, SplitResult};
use crate::split::naming::{track_file_name, track_title};
use crate::split::outcome::{AlbumReport, TrackOutcome, TrackStatus};
use crate::split::router::{Strategy, route};
use crate::split::tags::track_tags;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

impl Splitter {
    /// Splits `album`, whose audio lives at `source`, into the output directory.
    ///
    /// Errors are returned only when nothing can be produced for the album: no external tool
    /// for a delegated mode, or a source that cannot be read. Everything else is recorded per
    /// track in the report.
    pub fn split_album(&self, album: &Album, source: &Path) -> SplitResult<AlbumReport> {
        let strategy = route(
            self.options.mode,
            self.options.prefer_ffmpeg,
            &self.capabilities.external,
        )?;
        let title = album
            .title
            .clone()
            .unwrap_or_else(|| source.display().to_string());

        let strategy_name = strategy.describe();
        info!(
            "Splitting \"{title}\" ({} tracks) using {strategy_name}",
            album.track_count()
        );
        std::fs::create_dir_all(&self.options.output_dir)?;

        let tracks = match strategy {
            Strategy::InProcess => self.split_in_process(album, source)?,
            Strategy::Validated(splitter) => self.split_validated(album, source, splitter)?,
            Strategy::Delegated(splitter) => self.split_delegated(album, source, splitter),
        };

        let report = AlbumReport {
            album: title,
            strategy: strategy_name,
            tracks,
        };
        info!(
            "\"{}\": {} written, {} untagged, {} failed",
            report.album,
            report.written(),
            report.untagged(),
            report.failed()
        );
        Ok(report)
    }

    fn output_path(&self, track: &Track) -> PathBuf {
        self.options.output_dir.join(track_file_name(
            track,
            &self.options.separator,
            self.capabilities.encoder.extension(),
        ))
    }

    fn split_in_process(&self, album: &Album, source: &Path) -> SplitResult<Vec<TrackOutcome>> {
        let audio = self.capabilities.decoder.decode(source)?;
        let info = audio.info;
        debug!(
            "Decoded {:?}: {} samples at {} Hz",
            source, info.total_samples, info.format.sample_rate
        );

        let ranges = resolve(
            &album.tracks,
            info.total_samples,
            info.format.sample_rate,
            self.options.timecodes,
        );

        Ok(album
            .tracks
            .iter()
            .zip(ranges)
            .map(|(track, range)| {
                let written = range
                    .map_err(SplitError::from)
                    .and_then(|range| self.encode_track(track, &audio, range));
                self.finish_track(album, track, written)
            })
            .collect())
    }

    fn encode_track(&self, track: &Track, audio: &DecodedAudio, range: SampleRange) -> SplitResult<()> {
        let output = self.output_path(track);
        if !self.options.overwrite && output.exists() {
            return Err(SplitError::OutputAlreadyExists(output));
        }

        debug!(
            "Track {}: samples {}..{} -> {:?}",
            track.number, range.start, range.end, output
        );
        let channels = audio.slice(range.start, range.end);
        self.capabilities
            .encoder
            .encode(&output, &audio.info.format, &channels)?;
        Ok(())
    }

    /// Applies the tag set once the audio for `track` exists; `written` says whether it does.
    fn finish_track(&self, album: &Album, track: &Track, written: SplitResult<()>) -> TrackOutcome {
        let output = self.output_path(track);

        let status = match written {
            Err(err) => {
                warn!("Track {}: {err}", track.number);
                TrackStatus::Failed(err)
            }
            Ok(()) => match self
                .capabilities
                .tag_writer
                .write_tags(&output, &track_tags(album, track))
            {
                Ok(()) => {
                    info!("Wrote {:?}", output);
                    TrackStatus::Written
                }
                Err(err) => {
                    warn!("Track {}: audio written but tagging failed: {err}", track.number);
                    TrackStatus::Untagged(err.into())
                }
            },
        };

        TrackOutcome {
            number: track.number,
            title: track_title(track),
            output,
            status,
        }
    }

    fn split_validated(
        &self,
        album: &Album,
        source: &Path,
        splitter: &dyn ExternalSplitter,
    ) -> SplitResult<Vec<TrackOutcome>> {
        let info = self.capabilities.decoder.probe(source)?;
        let rate = info.format.sample_rate;
        info!(
            "Source: {} Hz, {} channels, {} bits, {:.2}s",
            rate,
            info.format.channels,
            info.format.bits_per_sample,
            info.duration_seconds()
        );

        let seconds = |sample: u64| sample as f64 / rate.max(1) as f64;
        let plan: Vec<SplitResult<TimecodeBounds>> =
            timecode_bounds(&album.tracks, self.options.timecodes)
                .into_iter()
                .map(|bounds| -> SplitResult<TimecodeBounds> {
                    let bounds = bounds?;
                    let range = sample_range(&bounds, info.total_samples, rate)?;
                    info!(
                        "Track {}: {:.2}s - {:.2}s ({:.2}s)",
                        bounds.track,
                        seconds(range.start),
                        seconds(range.end),
                        seconds(range.len())
                    );
                    Ok(bounds)
                })
                .collect();

        Ok(self.hand_off(album, source, splitter, plan))
    }

    fn split_delegated(
        &self,
        album: &Album,
        source: &Path,
        splitter: &dyn ExternalSplitter,
    ) -> Vec<TrackOutcome> {
        let plan: Vec<SplitResult<TimecodeBounds>> =
            timecode_bounds(&album.tracks, self.options.timecodes)
                .into_iter()
                .map(|bounds| bounds.map_err(SplitError::from))
                .collect();

        self.hand_off(album, source, splitter, plan)
    }

    /// Runs `splitter` over the tracks `plan` accepted, then tags whatever it produced.
    fn hand_off(
        &self,
        album: &Album,
        source: &Path,
        splitter: &dyn ExternalSplitter,
        plan: Vec<SplitResult<TimecodeBounds>>,
    ) -> Vec<TrackOutcome> {
        let mut planned = Vec::new();
        let accepted: Vec<SplitResult<()>> = album
            .tracks
            .iter()
            .zip(plan)
            .map(|(track, bounds)| -> SplitResult<()> {
                let bounds = bounds?;
                let output = self.output_path(track);
                self.prepare_output(&output)?;
                planned.push(PlannedTrack {
                    number: track.number,
                    title: track_title(track),
                    start: bounds.start,
                    end: bounds.end,
                    output,
                });
                Ok(())
            })
            .collect();

        if !planned.is_empty() {
            let request = ExternalSplitRequest {
                album,
                source,
                output_dir: &self.options.output_dir,
                tracks: &planned,
                overwrite: self.options.overwrite,
            };
            if let Err(err) = splitter.split(&request) {
                warn!("{} failed: {err}", splitter.name());
            }
        }

        album
            .tracks
            .iter()
            .zip(accepted)
            .map(|(track, accepted)| {
                let written = accepted.and_then(|()| {
                    let output = self.output_path(track);
                    if output.is_file() {
                        Ok(())
                    } else {
                        Err(SplitError::MissingOutput(output))
                    }
                });
                self.finish_track(album, track, written)
            })
            .collect()
    }

    /// Clears the way for an external tool. An existing output is removed when overwriting so a
    /// stale file is never mistaken for a fresh one.
    fn prepare_output(&self, output: &Path) -> SplitResult<()> {
        if !output.exists() {
            return Ok(());
        }
        if !self.options.overwrite {
            return Err(SplitError::OutputAlreadyExists(output.to_path_buf()));
        }

        std::fs::remove_file(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::error::{AudioError, AudioResult};
    use crate::audio::flac::{FlacDecoder, FlacEncoder};
    use crate::audio::tags::TagSet;
    use crate::audio::{Decoder, Encoder, PcmFormat, TagWriter};
    use crate::cue::CueParser;
    use crate::cue::models::Album;
    use crate::external::sheet::split_runs;
    use crate::external::{ExternalSplitRequest, ExternalSplitter};
    use crate::split::boundary::BoundaryError;
    use crate::split::error::SplitError;
    use crate::split::outcome::TrackStatus;
    use crate::split::{Capabilities, SplitMode, SplitOptions, Splitter};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    const RATE: u32 = 8_000;

    const SHEET: &str = r#"REM GENRE "Test"
REM MOOD Energetic
PERFORMER "Band A"
TITLE "Test Album"
FILE "album.flac" WAVE
  TRACK 01 AUDIO
    TITLE "Intro"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Middle: Part 1"
    PERFORMER "Guest"
    INDEX 01 00:01:00
  TRACK 03 AUDIO
    TITLE "End"
    INDEX 01 00:02:00
"#;

    const NAMES: [&str; 3] = ["01 - Intro.flac", "02 - Middle_ Part 1.flac", "03 - End.flac"];

    fn format() -> PcmFormat {
        PcmFormat {
            sample_rate: RATE,
            channels: 2,
            bits_per_sample: 16,
        }
    }

    /// Writes a stereo source of `samples` samples per channel next to the sheet.
    fn write_source(dir: &Path, samples: usize) -> (PathBuf, Vec<Vec<i32>>) {
        let left: Vec<i32> = (0..samples as i32).map(|i| (i * 37) % 2_000 - 1_000).collect();
        let right: Vec<i32> = left.iter().map(|s| -s / 2).collect();

        let path = dir.join("album.flac");
        FlacEncoder::default()
            .encode(&path, &format(), &[&left, &right])
            .unwrap();
        (path, vec![left, right])
    }

    fn album() -> Album {
        CueParser::default().parse(SHEET).unwrap()
    }

    fn options(output_dir: &Path, mode: SplitMode) -> SplitOptions {
        SplitOptions {
            output_dir: output_dir.to_path_buf(),
            mode,
            ..Default::default()
        }
    }

    fn no_tools() -> Capabilities {
        Capabilities {
            external: Vec::new(),
            ..Default::default()
        }
    }

    fn read_tags(path: &Path) -> BTreeMap<String, String> {
        let reader = claxon::FlacReader::open(path).unwrap();
        reader
            .tags()
            .map(|(k, v)| (k.to_ascii_uppercase(), v.to_string()))
            .collect()
    }

    fn read_samples(path: &Path) -> Vec<Vec<i32>> {
        FlacDecoder.decode(path).unwrap().channels
    }

    #[test]
    fn full_mode_splits_losslessly_and_tags_every_track() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, channels) = write_source(dir.path(), 3 * RATE as usize);

        let splitter = Splitter::new(options(&out, SplitMode::Full), no_tools());
        let report = splitter.split_album(&album(), &source).unwrap();

        assert_eq!(report.strategy, "in-process");
        assert!(report.is_complete());

        let bounds = [(0, 8_000), (8_000, 16_000), (16_000, 24_000)];
        for ((name, (start, end)), outcome) in NAMES.iter().zip(bounds).zip(&report.tracks) {
            let path = out.join(name);
            assert_eq!(outcome.output, path);

            let decoded = read_samples(&path);
            assert_eq!(decoded[0], channels[0][start..end]);
            assert_eq!(decoded[1], channels[1][start..end]);
        }

        let tags = read_tags(&out.join(NAMES[1]));
        assert_eq!(tags["TITLE"], "Middle: Part 1");
        assert_eq!(tags["ARTIST"], "Guest");
        assert_eq!(tags["PERFORMER"], "Band A");
        assert_eq!(tags["ALBUM"], "Test Album");
        assert_eq!(tags["TRACKNUMBER"], "2");
        assert_eq!(tags["TOTALTRACKS"], "3");
        assert_eq!(tags["GENRE"], "Test");
        assert_eq!(tags["MOOD"], "Energetic");

        // performer defaults from the album
        assert_eq!(read_tags(&out.join(NAMES[0]))["ARTIST"], "Band A");
    }

    #[test]
    fn track_past_the_end_fails_alone() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, channels) = write_source(dir.path(), 12_000);

        let splitter = Splitter::new(options(&out, SplitMode::Full), no_tools());
        let report = splitter.split_album(&album(), &source).unwrap();

        assert_eq!(report.written(), 2);
        assert!(matches!(
            report.tracks[2].status,
            TrackStatus::Failed(SplitError::Boundary(BoundaryError::OutOfRange {
                track: 3,
                start: 16_000,
                total: 12_000
            }))
        ));
        assert!(!out.join(NAMES[2]).exists());
        assert_eq!(read_samples(&out.join(NAMES[1]))[0], channels[0][8_000..12_000]);
    }

    #[test]
    fn rerunning_with_overwrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, _) = write_source(dir.path(), 3 * RATE as usize);
        let splitter = Splitter::new(options(&out, SplitMode::Full), no_tools());

        splitter.split_album(&album(), &source).unwrap();
        let first: Vec<Vec<u8>> = NAMES
            .iter()
            .map(|name| std::fs::read(out.join(name)).unwrap())
            .collect();

        let report = splitter.split_album(&album(), &source).unwrap();
        assert!(report.is_complete());
        for (name, bytes) in NAMES.iter().zip(first) {
            assert_eq!(std::fs::read(out.join(name)).unwrap(), bytes);
        }
    }

    #[test]
    fn existing_outputs_are_kept_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, _) = write_source(dir.path(), 3 * RATE as usize);

        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join(NAMES[0]), b"keep me").unwrap();

        let options = SplitOptions {
            overwrite: false,
            ..options(&out, SplitMode::Full)
        };
        let report = Splitter::new(options, no_tools())
            .split_album(&album(), &source)
            .unwrap();

        assert!(matches!(
            report.tracks[0].status,
            TrackStatus::Failed(SplitError::OutputAlreadyExists(_))
        ));
        assert_eq!(report.written(), 2);
        assert_eq!(std::fs::read(out.join(NAMES[0])).unwrap(), b"keep me");
    }

    #[test]
    fn unreadable_source_fails_the_album() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("album.flac");
        std::fs::write(&source, b"not audio").unwrap();

        let splitter = Splitter::new(options(&dir.path().join("out"), SplitMode::Full), no_tools());
        assert!(matches!(
            splitter.split_album(&album(), &source),
            Err(SplitError::Audio(AudioError::DecodeFailure { .. }))
        ));
    }

    struct FailingTagWriter;

    impl TagWriter for FailingTagWriter {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn write_tags(&self, path: &Path, _tags: &TagSet) -> AudioResult<()> {
            Err(AudioError::TagWriteFailure {
                path: path.to_path_buf(),
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn tag_failures_keep_the_audio() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, _) = write_source(dir.path(), 3 * RATE as usize);

        let capabilities = Capabilities {
            tag_writer: Box::new(FailingTagWriter),
            ..no_tools()
        };
        let report = Splitter::new(options(&out, SplitMode::Full), capabilities)
            .split_album(&album(), &source)
            .unwrap();

        assert_eq!(report.untagged(), 3);
        assert!(report.tracks.iter().all(|t| t.has_audio()));
        assert!(out.join(NAMES[2]).is_file());
    }

    /// Stands in for a command line splitter: cuts the planned tracks with the crate's own codec.
    struct FakeTool {
        skip: Option<u32>,
        seen: Mutex<Vec<u32>>,
    }

    impl FakeTool {
        fn new(skip: Option<u32>) -> Self {
            Self {
                skip,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ExternalSplitter for FakeTool {
        fn name(&self) -> &'static str {
            "shnsplit"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()> {
            let audio = FlacDecoder.decode(request.source)?;
            let rate = audio.info.format.sample_rate;

            for track in request.tracks {
                self.seen.lock().unwrap().push(track.number);
                if self.skip == Some(track.number) {
                    continue;
                }
                let end = track
                    .end
                    .map_or(audio.info.total_samples, |end| end.to_sample(rate));
                let channels = audio.slice(track.start.to_sample(rate), end);
                FlacEncoder::default().encode(&track.output, &audio.info.format, &channels)?;
            }
            Ok(())
        }
    }

    impl ExternalSplitter for Arc<FakeTool> {
        fn name(&self) -> &'static str {
            (**self).name()
        }

        fn is_available(&self) -> bool {
            (**self).is_available()
        }

        fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()> {
            (**self).split(request)
        }
    }

    #[test]
    fn external_mode_tags_what_the_tool_produced() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, channels) = write_source(dir.path(), 3 * RATE as usize);

        let tool = Arc::new(FakeTool::new(Some(2)));
        let capabilities = no_tools().with_external(Arc::clone(&tool));
        let report = Splitter::new(options(&out, SplitMode::External), capabilities)
            .split_album(&album(), &source)
            .unwrap();

        assert_eq!(report.strategy, "shnsplit");
        assert_eq!(*tool.seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(report.written(), 2);
        assert!(matches!(
            &report.tracks[1].status,
            TrackStatus::Failed(SplitError::MissingOutput(path)) if path == &out.join(NAMES[1])
        ));

        assert_eq!(read_tags(&out.join(NAMES[2]))["TITLE"], "End");
        assert_eq!(read_samples(&out.join(NAMES[0]))[0], channels[0][..8_000]);
    }

    #[test]
    fn hybrid_mode_only_delegates_tracks_inside_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (source, _) = write_source(dir.path(), 12_000);

        let tool = Arc::new(FakeTool::new(None));
        let capabilities = no_tools().with_external(Arc::clone(&tool));
        let report = Splitter::new(options(&out, SplitMode::Hybrid), capabilities)
            .split_album(&album(), &source)
            .unwrap();

        assert_eq!(report.strategy, "validated + shnsplit");
        assert_eq!(*tool.seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(report.written(), 2);
        assert!(matches!(
            report.tracks[2].status,
            TrackStatus::Failed(SplitError::Boundary(BoundaryError::OutOfRange { track: 3, .. }))
        ));
    }

    /// Cuts each run at consecutive split points, the way a sheet-driven splitter does.
    struct SequentialTool;

    impl ExternalSplitter for SequentialTool {
        fn name(&self) -> &'static str {
            "shnsplit"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn split(&self, request: &ExternalSplitRequest) -> AudioResult<()> {
            let audio = FlacDecoder.decode(request.source)?;
            let rate = audio.info.format.sample_rate;

            for pieces in split_runs(request.tracks) {
                for (i, piece) in pieces.iter().enumerate() {
                    let Some(track) = piece.track else {
                        continue;
                    };
                    let end = pieces
                        .get(i + 1)
                        .map_or(audio.info.total_samples, |next| next.start.to_sample(rate));
                    let channels = audio.slice(piece.start.to_sample(rate), end);
                    FlacEncoder::default().encode(&track.output, &audio.info.format, &channels)?;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn sequential_tool_matches_in_process_around_a_non_monotonic_track() {
        let sheet = r#"FILE "album.flac" WAVE
  TRACK 01 AUDIO
    TITLE "A"
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "B"
    INDEX 01 00:02:00
  TRACK 03 AUDIO
    TITLE "C"
    INDEX 01 00:01:00
  TRACK 04 AUDIO
    TITLE "D"
    INDEX 01 00:03:00
"#;
        let album = CueParser::default().parse(sheet).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (source, channels) = write_source(dir.path(), 4 * RATE as usize);

        let full_out = dir.path().join("full");
        let full = Splitter::new(options(&full_out, SplitMode::Full), no_tools())
            .split_album(&album, &source)
            .unwrap();

        let external_out = dir.path().join("external");
        let capabilities = no_tools().with_external(SequentialTool);
        let external = Splitter::new(options(&external_out, SplitMode::External), capabilities)
            .split_album(&album, &source)
            .unwrap();

        for report in [&full, &external] {
            assert_eq!(report.written(), 3);
            assert!(matches!(
                report.tracks[1].status,
                TrackStatus::Failed(SplitError::Boundary(BoundaryError::EmptyRange { track: 2, .. }))
            ));
        }

        let expected = [
            ("01 - A.flac", 0, 16_000),
            ("03 - C.flac", 8_000, 24_000),
            ("04 - D.flac", 24_000, 32_000),
        ];
        for (name, start, end) in expected {
            assert_eq!(read_samples(&full_out.join(name))[0], channels[0][start..end]);
            assert_eq!(read_samples(&external_out.join(name))[0], channels[0][start..end]);
        }
    }

    #[test]
    fn delegated_modes_need_a_tool() {
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = write_source(dir.path(), RATE as usize);

        for mode in [SplitMode::External, SplitMode::Hybrid] {
            let splitter = Splitter::new(options(&dir.path().join("out"), mode), no_tools());
            assert!(matches!(
                splitter.split_album(&album(), &source),
                Err(SplitError::NoSplitterAvailable)
            ));
        }
        assert!(!dir.path().join("out").exists());
    }
}

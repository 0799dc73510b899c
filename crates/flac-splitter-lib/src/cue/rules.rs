//! Line classification for the sheet parser.
//!
//! Every recognised directive is a [`LineRule`]: a pattern, the part of the sheet it is valid
//! in and a handler that folds the captured values into the [`SheetBuilder`]. Rules are tried in
//! order and the first one that applies consumes the line.

use crate::cue::ParserConfig;
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{Album, AudioFile, FileType, Track};
use crate::cue::timecode::{Timecode, TimecodePolicy};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Captures, Regex};

/// `REM` keys with a dedicated rule; never copied into the custom field maps.
const KNOWN_REMARKS: [&str; 7] = [
    "DATE",
    "YEAR",
    "GENRE",
    "COMMENT",
    "DISCID",
    "DISCNUMBER",
    "DISC",
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Scope {
    Anywhere,
    /// Only before the first `TRACK` line.
    Album,
    /// Only after a `TRACK` line.
    Track,
}

#[derive(Debug, Eq, PartialEq)]
pub enum RuleMatch {
    Applied,
    /// The pattern matched but the cursor is in the wrong part of the sheet.
    OutOfScope,
    NoMatch,
}

type Handler = fn(&mut SheetBuilder, &Captures) -> CueResult<()>;

pub struct LineRule {
    pub name: &'static str,
    pub scope: Scope,
    pattern: Regex,
    handler: Handler,
}

impl LineRule {
    fn new(name: &'static str, scope: Scope, pattern: &str, handler: Handler) -> Self {
        Self {
            name,
            scope,
            pattern: Regex::new(pattern).unwrap(),
            handler,
        }
    }

    pub fn apply(&self, builder: &mut SheetBuilder, line: &str) -> CueResult<RuleMatch> {
        let Some(captures) = self.pattern.captures(line) else {
            return Ok(RuleMatch::NoMatch);
        };

        let in_scope = match self.scope {
            Scope::Anywhere => true,
            Scope::Album => !builder.inside_track(),
            Scope::Track => builder.inside_track(),
        };
        if !in_scope {
            return Ok(RuleMatch::OutOfScope);
        }

        (self.handler)(builder, &captures)?;
        Ok(RuleMatch::Applied)
    }
}

lazy_static! {
    pub static ref RULES: Vec<LineRule> = vec![
        LineRule::new(
            "FILE",
            Scope::Anywhere,
            r#"^\s*FILE\s+(?:"([^"]*)"|(\S+))\s+(\w+)\s*$"#,
            on_file,
        ),
        LineRule::new("CATALOG", Scope::Album, r"^\s*CATALOG\s+([0-9]+)", on_catalog),
        LineRule::new(
            "REM DATE",
            Scope::Anywhere,
            r#"^\s*REM\s+DATE\s+"?([0-9]{4}(?:-[0-9]{2}-[0-9]{2})?)"#,
            on_rem_date,
        ),
        LineRule::new(
            "REM YEAR",
            Scope::Anywhere,
            r#"^\s*REM\s+YEAR\s+"?([0-9]{4})"#,
            on_rem_year,
        ),
        LineRule::new(
            "REM GENRE",
            Scope::Anywhere,
            r"^\s*REM\s+GENRE\s+(.+)$",
            on_rem_genre,
        ),
        LineRule::new(
            "REM COMMENT",
            Scope::Anywhere,
            r"^\s*REM\s+COMMENT\s+(.+)$",
            on_rem_comment,
        ),
        LineRule::new(
            "REM DISCID",
            Scope::Anywhere,
            r#"^\s*REM\s+DISCID\s+"?([A-Fa-f0-9]+)"#,
            on_rem_disc_id,
        ),
        LineRule::new(
            "REM DISCNUMBER",
            Scope::Anywhere,
            r#"^\s*REM\s+DISC(?:NUMBER)?\s+"?([0-9]+)(?:\s*/\s*([0-9]+))?"#,
            on_rem_disc_number,
        ),
        LineRule::new(
            "REM custom",
            Scope::Anywhere,
            r"^\s*REM\s+([A-Za-z_][A-Za-z0-9_]*)\s+(.+)$",
            on_rem_custom,
        ),
        LineRule::new("REM", Scope::Anywhere, r"^\s*REM(?:\s|$)", on_ignored),
        LineRule::new(
            "PERFORMER",
            Scope::Anywhere,
            r"^\s*PERFORMER\s+(.+?)\s*$",
            on_performer,
        ),
        LineRule::new(
            "COMPOSER",
            Scope::Anywhere,
            r"^\s*COMPOSER\s+(.+?)\s*$",
            on_composer,
        ),
        LineRule::new(
            "SONGWRITER",
            Scope::Anywhere,
            r"^\s*SONGWRITER\s+(.+?)\s*$",
            on_songwriter,
        ),
        LineRule::new("TITLE", Scope::Anywhere, r"^\s*TITLE\s+(.+?)\s*$", on_title),
        LineRule::new(
            "TRACK",
            Scope::Anywhere,
            r"^\s*TRACK\s+([0-9]+)\s+(\S+)",
            on_track,
        ),
        LineRule::new("INDEX 01", Scope::Track, r"^\s*INDEX\s+0?1\s+(\S+)", on_index),
        LineRule::new("INDEX 00", Scope::Track, r"^\s*INDEX\s+0?0\s+(\S+)", on_pregap),
        LineRule::new("ISRC", Scope::Track, r"^\s*ISRC\s+([A-Za-z0-9]+)", on_isrc),
    ];
}

/// Where the cursor is relative to the track list.
#[derive(Debug)]
pub enum Cursor {
    BeforeFirstTrack,
    InsideTrack(Track),
}

/// Album-in-progress threaded through the line loop.
#[derive(Debug)]
pub struct SheetBuilder {
    config: ParserConfig,
    album: Album,
    cursor: Cursor,
    line: usize,
}

impl SheetBuilder {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            album: Album::default(),
            cursor: Cursor::BeforeFirstTrack,
            line: 0,
        }
    }

    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn inside_track(&self) -> bool {
        matches!(self.cursor, Cursor::InsideTrack(_))
    }

    pub fn finish(mut self) -> Album {
        self.close_track();
        self.album
    }

    fn current_track(&mut self) -> Option<&mut Track> {
        match &mut self.cursor {
            Cursor::InsideTrack(track) => Some(track),
            Cursor::BeforeFirstTrack => None,
        }
    }

    fn close_track(&mut self) {
        let cursor = std::mem::replace(&mut self.cursor, Cursor::BeforeFirstTrack);
        if let Cursor::InsideTrack(mut track) = cursor {
            // Album-level credits can only be set before the first TRACK line.
            if track.performer.is_none() {
                track.performer = self.album.performer.clone();
            }
            if track.composer.is_none() {
                track.composer = self.album.composer.clone();
            }
            if track.songwriter.is_none() {
                track.songwriter = self.album.songwriter.clone();
            }
            self.album.tracks.push(track);
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CueError {
        CueError::MalformedSheet {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn timecode(&self, text: &str) -> CueResult<Option<Timecode>> {
        match text.parse::<Timecode>() {
            Ok(timecode) => Ok(Some(timecode)),
            Err(_) if self.config.strict => {
                Err(self.malformed(format!("invalid timecode `{text}`")))
            }
            Err(_) => match self.config.timecodes {
                TimecodePolicy::Lenient => {
                    warn!(
                        "Line {}: invalid timecode `{text}`, treating it as 00:00:00",
                        self.line
                    );
                    Ok(Some(Timecode::ZERO))
                }
                TimecodePolicy::Strict => {
                    warn!("Line {}: invalid timecode `{text}`, ignoring it", self.line);
                    Ok(None)
                }
            },
        }
    }
}

/// Trims `raw` and removes one pair of surrounding double quotes.
pub fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Unquoted text of a group, `None` when it is blank (`TITLE ""`).
fn text(captures: &Captures, group: usize) -> Option<String> {
    Some(unquote(&capture(captures, group))).filter(|value| !value.is_empty())
}

fn capture(captures: &Captures, group: usize) -> String {
    captures
        .get(group)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn on_file(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let name = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    if builder.album.audio_file.is_some() {
        if builder.config.strict {
            return Err(builder.malformed("sheets referencing several audio files are not supported"));
        }
        warn!(
            "Line {}: ignoring additional FILE `{name}`, only the first one is used",
            builder.line
        );
        return Ok(());
    }

    builder.album.audio_file = Some(AudioFile {
        name,
        file_type: FileType::from_tag(&capture(captures, 3)),
    });
    Ok(())
}

fn on_catalog(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    builder.album.catalog = Some(capture(captures, 1));
    Ok(())
}

fn on_rem_date(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let date = capture(captures, 1);
    builder.album.year = Some(date.chars().take(4).collect());
    builder.album.date = Some(date);
    Ok(())
}

fn on_rem_year(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let year = capture(captures, 1);
    if builder.album.date.is_none() {
        builder.album.date = Some(year.clone());
    }
    builder.album.year = Some(year);
    Ok(())
}

fn on_rem_genre(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    if let Some(genre) = text(captures, 1) {
        builder.album.genre = Some(genre);
    }
    Ok(())
}

fn on_rem_comment(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    if let Some(comment) = text(captures, 1) {
        builder.album.comment = Some(comment);
    }
    Ok(())
}

fn on_rem_disc_id(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    builder.album.disc_id = Some(capture(captures, 1));
    Ok(())
}

fn on_rem_disc_number(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    builder.album.disc_number = Some(capture(captures, 1));
    if let Some(total) = captures.get(2) {
        builder.album.total_discs = Some(total.as_str().to_string());
    }
    Ok(())
}

fn on_rem_custom(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    if !builder.config.parse_custom_remarks {
        return Ok(());
    }

    let key = capture(captures, 1).to_ascii_uppercase();
    if KNOWN_REMARKS.contains(&key.as_str()) {
        debug!("Line {}: unrecognised value for REM {key}", builder.line);
        return Ok(());
    }

    let value = unquote(&capture(captures, 2));
    match builder.current_track() {
        Some(track) => track.custom_fields.insert(key, value),
        None => builder.album.custom_fields.insert(key, value),
    };
    Ok(())
}

fn on_ignored(builder: &mut SheetBuilder, _: &Captures) -> CueResult<()> {
    debug!("Line {}: skipping remark", builder.line);
    Ok(())
}

fn on_performer(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let Some(performer) = text(captures, 1) else {
        return Ok(());
    };
    match builder.current_track() {
        Some(track) => track.performer = Some(performer),
        None => {
            // first album performer wins, it becomes the default for every track
            if builder.album.performer.is_none() {
                builder.album.performer = Some(performer);
            }
        }
    }
    Ok(())
}

fn on_composer(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let Some(composer) = text(captures, 1) else {
        return Ok(());
    };
    match builder.current_track() {
        Some(track) => track.composer = Some(composer),
        None => builder.album.composer = Some(composer),
    }
    Ok(())
}

fn on_songwriter(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let Some(songwriter) = text(captures, 1) else {
        return Ok(());
    };
    match builder.current_track() {
        Some(track) => track.songwriter = Some(songwriter),
        None => builder.album.songwriter = Some(songwriter),
    }
    Ok(())
}

fn on_title(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let Some(title) = text(captures, 1) else {
        return Ok(());
    };
    match builder.current_track() {
        Some(track) => track.title = Some(title),
        None => {
            if builder.album.title.is_none() {
                builder.album.title = Some(title);
            }
        }
    }
    Ok(())
}

fn on_track(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    builder.close_track();

    let track_type = capture(captures, 2);
    if track_type != "AUDIO" {
        debug!(
            "Line {}: track {} has type {track_type}",
            builder.line,
            capture(captures, 1)
        );
    }

    let number = builder.album.tracks.len() as u32 + 1;
    builder.cursor = Cursor::InsideTrack(Track::new(number));
    Ok(())
}

fn on_index(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let index = builder.timecode(&capture(captures, 1))?;
    if let Some(track) = builder.current_track() {
        track.index = index;
    }
    Ok(())
}

fn on_pregap(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let pregap = builder.timecode(&capture(captures, 1))?;
    if let Some(track) = builder.current_track() {
        track.pregap = pregap;
    }
    Ok(())
}

fn on_isrc(builder: &mut SheetBuilder, captures: &Captures) -> CueResult<()> {
    let isrc = capture(captures, 1);
    if let Some(track) = builder.current_track() {
        track.isrc = Some(isrc);
    }
    Ok(())
}

use crate::cue::error::{CueResult, MissingField};
use crate::cue::timecode::Timecode;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One parsed sheet: album metadata plus its tracks in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Album {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub composer: Option<String>,
    pub songwriter: Option<String>,

    pub date: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,

    pub catalog: Option<String>,
    pub disc_id: Option<String>,
    pub disc_number: Option<String>,
    pub total_discs: Option<String>,

    pub audio_file: Option<AudioFile>,
    pub tracks: Vec<Track>,

    /// Non-standard `REM` keys, uppercased.
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub name: String,
    pub file_type: FileType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// 1-based position in the sheet, independent of the number written after `TRACK`.
    pub number: u32,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub composer: Option<String>,
    pub songwriter: Option<String>,
    pub isrc: Option<String>,
    /// `INDEX 01`
    pub index: Option<Timecode>,
    /// `INDEX 00`
    pub pregap: Option<Timecode>,
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    Wave,
    Flac,
    Mp3,
    Aiff,
    Binary,
    Motorola,
    Other(String),
}

impl FileType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "WAVE" => FileType::Wave,
            "FLAC" => FileType::Flac,
            "MP3" => FileType::Mp3,
            "AIFF" => FileType::Aiff,
            "BINARY" => FileType::Binary,
            "MOTOROLA" => FileType::Motorola,
            _ => FileType::Other(tag.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            FileType::Wave => "WAVE",
            FileType::Flac => "FLAC",
            FileType::Mp3 => "MP3",
            FileType::Aiff => "AIFF",
            FileType::Binary => "BINARY",
            FileType::Motorola => "MOTOROLA",
            FileType::Other(tag) => tag,
        }
    }
}

impl Album {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Track by its 1-based number.
    pub fn track(&self, number: u32) -> Option<&Track> {
        let index = (number as usize).checked_sub(1)?;
        self.tracks.get(index)
    }

    pub fn custom_field(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Location of the referenced audio file; relative names resolve against `sheet_dir`.
    pub fn audio_file_path(&self, sheet_dir: &Path) -> Option<PathBuf> {
        let audio_file = self.audio_file.as_ref()?;
        let path = Path::new(&audio_file.name);

        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(sheet_dir.join(path))
        }
    }

    /// Checks the fields a strict parse requires, reporting the first one missing.
    pub fn validate(&self) -> CueResult<()> {
        if self.audio_file.is_none() {
            return Err(MissingField::AudioFile.into());
        }
        if is_blank(self.title.as_deref()) {
            return Err(MissingField::AlbumTitle.into());
        }
        if self.tracks.is_empty() {
            return Err(MissingField::Tracks.into());
        }

        for track in &self.tracks {
            if is_blank(track.title.as_deref()) {
                return Err(MissingField::TrackTitle(track.number).into());
            }
            if track.index.is_none() {
                return Err(MissingField::TrackIndex(track.number).into());
            }
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

impl Track {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    pub fn custom_field(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

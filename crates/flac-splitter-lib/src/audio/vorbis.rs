use crate::audio::TagWriter;
use crate::audio::error::{AudioError, AudioResult};
use crate::audio::tags::TagSet;
use lofty::TagExt;
use lofty::ogg::VorbisComments;
use log::trace;
use std::path::Path;

/// Replaces the Vorbis comment block of a FLAC file with the given entries.
#[derive(Debug, Clone, Default)]
pub struct VorbisTagWriter;

impl TagWriter for VorbisTagWriter {
    fn name(&self) -> &'static str {
        "Vorbis Comment Writer"
    }

    fn write_tags(&self, path: &Path, tags: &TagSet) -> AudioResult<()> {
        let mut comments = VorbisComments::default();
        for (key, value) in tags.iter() {
            trace!("{path:?}: {key}={value}");
            comments.push(key.to_string(), value.to_string());
        }

        comments
            .save_to_path(path)
            .map_err(|err| AudioError::TagWriteFailure {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })
    }
}

use crate::audio::tags::TagSet;
use crate::cue::models::{Album, Track};

/// Vorbis comments for one output track.
///
/// The first six keys are always present. Custom fields come last and never replace a key that
/// is already set; track fields are added before album fields so they win on a shared key.
pub fn track_tags(album: &Album, track: &Track) -> TagSet {
    let mut tags = TagSet::new();

    tags.set("TITLE", track.display_title());
    tags.set("ARTIST", track.performer.as_deref().unwrap_or_default());
    tags.set("ALBUM", album.title.as_deref().unwrap_or_default());
    tags.set("PERFORMER", album.performer.as_deref().unwrap_or_default());
    tags.set("TRACKNUMBER", track.number.to_string());
    tags.set("TOTALTRACKS", album.track_count().to_string());

    let optional = [
        ("DATE", album.date.as_ref().or(album.year.as_ref())),
        ("GENRE", album.genre.as_ref()),
        ("DESCRIPTION", album.comment.as_ref()),
        ("CATALOG", album.catalog.as_ref()),
        ("DISCID", album.disc_id.as_ref()),
        ("COMPOSER", track.composer.as_ref()),
        ("ISRC", track.isrc.as_ref()),
        ("DISCNUMBER", album.disc_number.as_ref()),
        ("TOTALDISCS", album.total_discs.as_ref()),
    ];
    for (key, value) in optional {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            tags.set(key, value.as_str());
        }
    }

    for (key, value) in track.custom_fields.iter().chain(&album.custom_fields) {
        tags.set_if_absent(key, value.as_str());
    }

    tags
}

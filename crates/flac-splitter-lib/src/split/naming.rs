use crate::cue::models::Track;

/// Characters that are not allowed in file names on at least one common platform.
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitized title used in output names, `Track NN` when nothing is left of it.
pub fn track_title(track: &Track) -> String {
    let title = sanitize_file_name(track.display_title());
    if title.is_empty() {
        format!("Track {:02}", track.number)
    } else {
        title
    }
}

/// `NN<separator>Title.<extension>`
pub fn track_file_name(track: &Track, separator: &str, extension: &str) -> String {
    format!(
        "{:02}{separator}{}.{extension}",
        track.number,
        track_title(track)
    )
}

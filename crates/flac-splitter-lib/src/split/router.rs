use crate::external::{BoxedSplitter, ExternalSplitter};
use crate::split::SplitMode;
use crate::split::error::{SplitError, SplitResult};
use log::debug;

/// Concrete way an album gets split.
pub enum Strategy<'a> {
    /// Decode, slice and encode in this process.
    InProcess,
    /// Check track starts against the source, then hand off.
    Validated(&'a dyn ExternalSplitter),
    /// Hand off without looking at the source.
    Delegated(&'a dyn ExternalSplitter),
}

impl Strategy<'_> {
    pub fn describe(&self) -> String {
        match self {
            Strategy::InProcess => "in-process".to_string(),
            Strategy::Validated(splitter) => format!("validated + {}", splitter.name()),
            Strategy::Delegated(splitter) => splitter.name().to_string(),
        }
    }
}

/// Picks the strategy for `mode`. `External` favours shnsplit unless `prefer_ffmpeg` is set,
/// `Hybrid` favours ffmpeg; either falls back to any available tool.
pub fn route(
    mode: SplitMode,
    prefer_ffmpeg: bool,
    splitters: &[BoxedSplitter],
) -> SplitResult<Strategy<'_>> {
    let preferred = match mode {
        SplitMode::Full => return Ok(Strategy::InProcess),
        SplitMode::Hybrid => "ffmpeg",
        SplitMode::External if prefer_ffmpeg => "ffmpeg",
        SplitMode::External => "shnsplit",
    };

    let available: Vec<&dyn ExternalSplitter> = splitters
        .iter()
        .filter(|splitter| splitter.is_available())
        .map(|splitter| splitter.as_ref() as &dyn ExternalSplitter)
        .collect();
    debug!(
        "Available external splitters: {:?}",
        available.iter().map(|s| s.name()).collect::<Vec<_>>()
    );

    let splitter = available
        .iter()
        .find(|splitter| splitter.name() == preferred)
        .or_else(|| available.first())
        .copied()
        .ok_or(SplitError::NoSplitterAvailable)?;

    Ok(match mode {
        SplitMode::Hybrid => Strategy::Validated(splitter),
        _ => Strategy::Delegated(splitter),
    })
}

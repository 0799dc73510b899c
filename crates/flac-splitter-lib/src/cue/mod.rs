use crate::cue::error::{CueError, CueResult};
use crate::cue::models::Album;
use crate::cue::rules::{RULES, RuleMatch, Scope, SheetBuilder};
use crate::cue::timecode::TimecodePolicy;
use log::debug;
use std::path::Path;

pub mod error;
pub mod models;
mod rules;
pub mod timecode;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ParserConfig {
    /// Fail on structural problems and validate required fields after parsing.
    pub strict: bool,
    /// Keep unknown `REM` keys in the custom field maps.
    pub parse_custom_remarks: bool,
    pub timecodes: TimecodePolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict: false,
            parse_custom_remarks: true,
            timecodes: TimecodePolicy::Lenient,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CueParser {
    config: ParserConfig,
}

impl CueParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Reads and parses the sheet at `cue_path`. Bytes that are not valid UTF-8 are replaced.
    pub fn parse_path(&self, cue_path: impl AsRef<Path>) -> CueResult<Album> {
        let data = std::fs::read(cue_path.as_ref())?;
        debug!("Parsing CUE file: {:?}", cue_path.as_ref());
        self.parse(&String::from_utf8_lossy(&data))
    }

    pub fn parse(&self, text: &str) -> CueResult<Album> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut builder = SheetBuilder::new(self.config);

        for (idx, line) in text.lines().enumerate() {
            builder.set_line(idx + 1);
            if line.trim().is_empty() {
                continue;
            }
            self.classify(&mut builder, line)?;
        }

        let album = builder.finish();

        if self.config.strict {
            album.validate()?;
        }

        Ok(album)
    }

    fn classify(&self, builder: &mut SheetBuilder, line: &str) -> CueResult<()> {
        for rule in RULES.iter() {
            match rule.apply(builder, line)? {
                RuleMatch::Applied => return Ok(()),
                RuleMatch::OutOfScope if self.config.strict && rule.scope == Scope::Track => {
                    return Err(CueError::MalformedSheet {
                        line: builder.line(),
                        reason: format!("{} outside of a TRACK", rule.name),
                    });
                }
                RuleMatch::OutOfScope | RuleMatch::NoMatch => {}
            }
        }

        debug!("Line {}: ignoring `{}`", builder.line(), line.trim());
        Ok(())
    }
}

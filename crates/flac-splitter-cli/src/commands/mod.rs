use clap::{Parser, Subcommand, ValueEnum};
use flac_splitter_lib::cue::ParserConfig;
use flac_splitter_lib::cue::timecode::TimecodePolicy;
use flac_splitter_lib::split::{SplitMode, SplitOptions};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Splits single-file FLAC/WAV albums into tagged tracks using their CUE sheets.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show detailed processing information
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings, errors and the summary
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Split(SplitCommand),
    Inspect(InspectCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ModeArg {
    /// Decode, split and encode in process
    Full,
    /// Validate against the decoded source, cut with ffmpeg or shnsplit
    Hybrid,
    /// Cut with shnsplit or ffmpeg only
    External,
}

impl From<ModeArg> for SplitMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => SplitMode::Full,
            ModeArg::Hybrid => SplitMode::Hybrid,
            ModeArg::External => SplitMode::External,
        }
    }
}

/// Finds every .cue file below a directory and splits the album it describes.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct SplitCommand {
    /// Directory searched recursively for .cue files
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Base directory for split tracks; each album gets <OUTPUT>/<relative dir>/<sheet name>
    #[arg(long, short = 'o', value_name = "DIR", default_value = "split")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::Full)]
    pub mode: ModeArg,

    /// Prefer ffmpeg over shnsplit in external mode
    #[arg(long, default_value_t = false)]
    pub ffmpeg: bool,

    /// Keep existing track files instead of replacing them
    #[arg(long, default_value_t = false)]
    pub no_overwrite: bool,

    /// Reject sheets with structural problems or missing required fields
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Fail tracks with malformed or missing INDEX 01 instead of treating them as 00:00:00
    #[arg(long, default_value_t = false)]
    pub strict_timecodes: bool,
}

impl SplitCommand {
    pub fn parser_config(&self) -> ParserConfig {
        parser_config(self.strict, self.strict_timecodes)
    }

    pub fn split_options(&self, output_dir: &Path) -> SplitOptions {
        SplitOptions {
            output_dir: output_dir.to_path_buf(),
            mode: self.mode.into(),
            overwrite: !self.no_overwrite,
            prefer_ffmpeg: self.ffmpeg,
            timecodes: timecode_policy(self.strict_timecodes),
            ..Default::default()
        }
    }
}

/// Parses a sheet and prints its tracks, with sample ranges when the audio can be read.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InspectCommand {
    #[arg(value_name = "CUE")]
    pub cue: PathBuf,

    /// Audio file to resolve against instead of the one the sheet references
    #[arg(long, value_name = "FILE")]
    pub audio: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub strict: bool,

    #[arg(long, default_value_t = false)]
    pub strict_timecodes: bool,
}

impl InspectCommand {
    pub fn parser_config(&self) -> ParserConfig {
        parser_config(self.strict, self.strict_timecodes)
    }

    pub fn timecodes(&self) -> TimecodePolicy {
        timecode_policy(self.strict_timecodes)
    }
}

fn timecode_policy(strict: bool) -> TimecodePolicy {
    if strict {
        TimecodePolicy::Strict
    } else {
        TimecodePolicy::Lenient
    }
}

fn parser_config(strict: bool, strict_timecodes: bool) -> ParserConfig {
    ParserConfig {
        strict,
        timecodes: timecode_policy(strict_timecodes),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_defaults() {
        let cli = Cli::try_parse_from(["flac-splitter", "split"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Info);

        let Commands::Split(cmd) = cli.command else {
            panic!("expected split");
        };

        assert_eq!(cmd.root, PathBuf::from("."));
        assert_eq!(cmd.output, PathBuf::from("split"));
        assert_eq!(cmd.mode, ModeArg::Full);

        let options = cmd.split_options(Path::new("split/album"));
        assert!(options.overwrite);
        assert_eq!(options.mode, SplitMode::Full);
        assert_eq!(options.timecodes, TimecodePolicy::Lenient);
    }

    #[test]
    fn split_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "flac-splitter",
            "-v",
            "split",
            "music",
            "-o",
            "out",
            "--mode",
            "external",
            "--ffmpeg",
            "--no-overwrite",
            "--strict",
            "--strict-timecodes",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Debug);

        let Commands::Split(cmd) = cli.command else {
            panic!("expected split");
        };
        let options = cmd.split_options(Path::new("out/album"));
        assert_eq!(options.mode, SplitMode::External);
        assert!(options.prefer_ffmpeg);
        assert!(!options.overwrite);
        assert_eq!(options.timecodes, TimecodePolicy::Strict);

        let config = cmd.parser_config();
        assert!(config.strict);
        assert_eq!(config.timecodes, TimecodePolicy::Strict);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["flac-splitter", "-v", "-q", "split"]).is_err());
    }

    #[test]
    fn inspect_takes_optional_audio() {
        let cli =
            Cli::try_parse_from(["flac-splitter", "inspect", "a.cue", "--audio", "a.flac"]).unwrap();
        let Commands::Inspect(cmd) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(cmd.cue, PathBuf::from("a.cue"));
        assert_eq!(cmd.audio, Some(PathBuf::from("a.flac")));
    }
}

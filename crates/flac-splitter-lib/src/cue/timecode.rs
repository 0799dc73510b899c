use crate::cue::error::{CueError, CueResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// CD audio subdivides a second into 75 frames.
pub const FRAMES_PER_SECOND: u32 = 75;

/// A `MM:SS:FF` position inside the sheet's audio file.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Timecode {
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

/// How the parser and the boundary resolver treat an index they cannot read.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum TimecodePolicy {
    /// Malformed or missing indices count as `00:00:00`.
    #[default]
    Lenient,
    /// Malformed or missing indices fail the track they belong to.
    Strict,
}

impl Timecode {
    pub const ZERO: Timecode = Timecode {
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    pub fn new(minutes: u32, seconds: u32, frames: u32) -> CueResult<Self> {
        if seconds >= 60 || frames >= FRAMES_PER_SECOND {
            return Err(CueError::InvalidTimecode(format!(
                "{minutes:02}:{seconds:02}:{frames:02}"
            )));
        }

        Ok(Self {
            minutes,
            seconds,
            frames,
        })
    }

    /// Parses `text`, falling back to [`Timecode::ZERO`] when it is not a valid timecode.
    pub fn parse_lenient(text: &str) -> Self {
        text.parse().unwrap_or(Self::ZERO)
    }

    pub fn total_frames(&self) -> u64 {
        (self.minutes as u64 * 60 + self.seconds as u64) * FRAMES_PER_SECOND as u64
            + self.frames as u64
    }

    pub fn to_seconds(&self) -> f64 {
        self.minutes as f64 * 60.0 + self.seconds as f64 + self.frames as f64 / 75.0
    }

    /// Sample index of this position at `sample_rate`, rounded to the nearest sample.
    ///
    /// Computed in integers so that e.g. `03:00:00` at 44.1 kHz is exactly `7_938_000`
    /// regardless of floating point error.
    pub fn to_sample(&self, sample_rate: u32) -> u64 {
        let fps = FRAMES_PER_SECOND as u128;
        let scaled = self.total_frames() as u128 * sample_rate as u128;
        ((scaled + fps / 2) / fps) as u64
    }
}

impl FromStr for Timecode {
    type Err = CueError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        if parts.len() != 3 {
            return Err(CueError::InvalidTimecode(text.to_string()));
        }

        let field = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| CueError::InvalidTimecode(text.to_string()))
        };

        Self::new(field(parts[0])?, field(parts[1])?, field(parts[2])?)
    }
}

impl Display for Timecode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}

/// Seconds from `start` to `end`, or `None` when `end` is not strictly after `start`.
pub fn duration(start: &Timecode, end: &Timecode) -> Option<f64> {
    let seconds = end.to_seconds() - start.to_seconds();
    (seconds > 0.0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(minutes: u32, seconds: u32, frames: u32) -> Timecode {
        Timecode::new(minutes, seconds, frames).unwrap()
    }

    #[test]
    fn parses_well_formed_timecode() {
        let parsed: Timecode = "03:25:74".parse().unwrap();
        assert_eq!(parsed, tc(3, 25, 74));
    }

    #[test]
    fn allows_minutes_beyond_two_digits() {
        let parsed: Timecode = "120:00:00".parse().unwrap();
        assert_eq!(parsed.minutes, 120);
    }

    #[test]
    fn rejects_frame_75_and_above() {
        assert!(matches!(
            "00:00:75".parse::<Timecode>(),
            Err(CueError::InvalidTimecode(_))
        ));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!("00:00".parse::<Timecode>().is_err());
        assert!("00:00:00:00".parse::<Timecode>().is_err());
        assert!("".parse::<Timecode>().is_err());
    }

    #[test]
    fn rejects_non_numeric_segments() {
        assert!("aa:00:00".parse::<Timecode>().is_err());
        assert!("00:-1:00".parse::<Timecode>().is_err());
    }

    #[test]
    fn lenient_parse_defaults_to_zero() {
        assert_eq!(Timecode::parse_lenient("garbage"), Timecode::ZERO);
        assert_eq!(Timecode::parse_lenient("01:02"), Timecode::ZERO);
        assert_eq!(Timecode::parse_lenient("01:02:03"), tc(1, 2, 3));
    }

    #[test]
    fn converts_to_seconds() {
        assert_eq!(tc(0, 0, 0).to_seconds(), 0.0);
        assert_eq!(tc(3, 0, 0).to_seconds(), 180.0);
        assert!((tc(1, 2, 30).to_seconds() - 62.4).abs() < 1e-9);
    }

    #[test]
    fn converts_to_sample_exactly_for_cd_rate() {
        assert_eq!(tc(3, 0, 0).to_sample(44_100), 7_938_000);
        assert_eq!(tc(0, 0, 1).to_sample(44_100), 588);
        assert_eq!(tc(6, 0, 0).to_sample(44_100), 15_876_000);
    }

    #[test]
    fn rounds_to_nearest_sample_for_non_multiple_rates() {
        // 1/75 s at 32 kHz is 426.67 samples
        assert_eq!(tc(0, 0, 1).to_sample(32_000), 427);
        // 2/75 s at 32 kHz is 853.33 samples
        assert_eq!(tc(0, 0, 2).to_sample(32_000), 853);
    }

    #[test]
    fn to_sample_is_monotonic_in_sample_rate() {
        let rates = [8_000, 11_025, 22_050, 32_000, 44_100, 48_000, 88_200, 96_000, 192_000];
        for t in [tc(0, 0, 1), tc(0, 59, 74), tc(12, 34, 56), tc(79, 59, 74)] {
            let samples: Vec<u64> = rates.iter().map(|r| t.to_sample(*r)).collect();
            assert!(samples.windows(2).all(|w| w[0] <= w[1]), "{t}: {samples:?}");
        }
    }

    #[test]
    fn to_sample_over_rate_converges_to_seconds() {
        let t = tc(4, 33, 17);
        let mut previous_error = f64::MAX;
        for rate in [1_000u32, 10_000, 100_000, 1_000_000] {
            let error = (t.to_sample(rate) as f64 / rate as f64 - t.to_seconds()).abs();
            assert!(error <= 0.5 / rate as f64 + 1e-12);
            assert!(error <= previous_error);
            previous_error = error;
        }
    }

    #[test]
    fn duration_is_positive_or_unknown() {
        assert_eq!(duration(&tc(0, 0, 0), &tc(3, 0, 0)), Some(180.0));
        assert_eq!(duration(&tc(3, 0, 0), &tc(3, 0, 0)), None);
        assert_eq!(duration(&tc(3, 0, 0), &tc(2, 0, 0)), None);
    }

    #[test]
    fn displays_zero_padded() {
        assert_eq!(tc(3, 5, 7).to_string(), "03:05:07");
        assert_eq!(Timecode::ZERO.to_string(), "00:00:00");
    }
}

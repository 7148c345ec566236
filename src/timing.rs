//! Tempo and symbolic note durations.
//!
//! An [`Interval`] is a fraction of a whole note. It only becomes a wall-clock
//! duration when paired with a [`Tempo`], and the tempo is always passed in:
//! there is no global clock. Hosts that want a live, adjustable tempo share a
//! [`TempoClock`] handle and snapshot it whenever they convert.

use std::ops::{Add, Sub};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Beats (quarter notes) per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(SynthError::invalid("tempo", format!("{bpm} bpm must be positive")));
        }
        Ok(Tempo { bpm })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Length of a whole note (four beats) in seconds.
    pub fn whole_note_seconds(&self) -> f64 {
        4.0 * (60.0 / self.bpm)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo { bpm: 120.0 }
    }
}

/// Shared, adjustable tempo.
///
/// Clones observe the same value. Readers take a [`Tempo`] snapshot at the
/// moment they convert an interval, so a change never reaches back into a
/// note that has already been rendered.
#[derive(Debug, Clone)]
pub struct TempoClock {
    bpm_bits: Arc<AtomicU64>,
}

impl TempoClock {
    pub fn new(tempo: Tempo) -> Self {
        TempoClock {
            bpm_bits: Arc::new(AtomicU64::new(tempo.bpm.to_bits())),
        }
    }

    pub fn with_bpm(bpm: f64) -> Result<Self> {
        Ok(Self::new(Tempo::new(bpm)?))
    }

    /// Current tempo.
    pub fn tempo(&self) -> Tempo {
        Tempo {
            bpm: f64::from_bits(self.bpm_bits.load(Ordering::Acquire)),
        }
    }

    pub fn bpm(&self) -> f64 {
        self.tempo().bpm
    }

    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        let tempo = Tempo::new(bpm)?;
        self.bpm_bits.store(tempo.bpm.to_bits(), Ordering::Release);
        Ok(())
    }
}

impl Default for TempoClock {
    fn default() -> Self {
        Self::new(Tempo::default())
    }
}

/// A note length as a multiple of a whole note.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Interval {
    whole_notes: f64,
}

impl Interval {
    pub const WHOLE: Interval = Interval { whole_notes: 1.0 };
    pub const HALF: Interval = Interval { whole_notes: 0.5 };
    pub const QUARTER: Interval = Interval { whole_notes: 0.25 };
    pub const EIGHTH: Interval = Interval { whole_notes: 0.125 };
    pub const SIXTEENTH: Interval = Interval { whole_notes: 0.0625 };
    pub const THIRTY_SECOND: Interval = Interval { whole_notes: 0.03125 };
    pub const SIXTY_FOURTH: Interval = Interval { whole_notes: 0.015625 };
    pub const TRIPLET: Interval = Interval { whole_notes: 1.0 / 3.0 };
    pub const SEXTUPLET: Interval = Interval { whole_notes: 1.0 / 6.0 };

    /// An arbitrary positive fraction of a whole note.
    pub fn new(whole_notes: f64) -> Result<Self> {
        if !(whole_notes.is_finite() && whole_notes > 0.0) {
            return Err(SynthError::invalid(
                "interval",
                format!("{whole_notes} whole notes must be positive"),
            ));
        }
        Ok(Interval { whole_notes })
    }

    pub fn whole_notes(&self) -> f64 {
        self.whole_notes
    }

    /// Multiply by a positive whole number.
    pub fn times(self, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(SynthError::invalid("interval scalar", "cannot multiply an interval by zero"));
        }
        Ok(Interval {
            whole_notes: self.whole_notes * count as f64,
        })
    }

    /// Multiply by a positive factor.
    pub fn scale(self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(SynthError::invalid(
                "interval scalar",
                format!("cannot multiply an interval by {factor}"),
            ));
        }
        Ok(Interval {
            whole_notes: self.whole_notes * factor,
        })
    }

    /// Wall-clock length at `tempo`.
    pub fn to_seconds(&self, tempo: Tempo) -> f64 {
        self.whole_notes * tempo.whole_note_seconds()
    }

    /// Same as [`Interval::to_seconds`], clamped at zero for intervals
    /// produced by subtraction. Fails when the length does not fit in a
    /// [`Duration`].
    pub fn to_duration(&self, tempo: Tempo) -> Result<Duration> {
        let seconds = self.to_seconds(tempo).max(0.0);
        Duration::try_from_secs_f64(seconds).map_err(|_| {
            SynthError::invalid(
                "interval",
                format!("{} whole notes at {} bpm is too long", self.whole_notes, tempo.bpm),
            )
        })
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, other: Interval) -> Interval {
        Interval {
            whole_notes: self.whole_notes + other.whole_notes,
        }
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, other: Interval) -> Interval {
        Interval {
            whole_notes: self.whole_notes - other.whole_notes,
        }
    }
}

impl FromStr for Interval {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whole" | "1" => Ok(Interval::WHOLE),
            "half" | "1/2" => Ok(Interval::HALF),
            "quarter" | "1/4" => Ok(Interval::QUARTER),
            "eighth" | "1/8" => Ok(Interval::EIGHTH),
            "sixteenth" | "1/16" => Ok(Interval::SIXTEENTH),
            "thirty_second" | "1/32" => Ok(Interval::THIRTY_SECOND),
            "sixty_fourth" | "1/64" => Ok(Interval::SIXTY_FOURTH),
            "triplet" | "1/3" => Ok(Interval::TRIPLET),
            "sextuplet" | "1/6" => Ok(Interval::SEXTUPLET),
            _ => Err(SynthError::invalid("interval", format!("'{s}' is not an interval name"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn quarter_at_120_is_half_a_second() {
        assert_eq!(Interval::QUARTER.to_seconds(Tempo::default()), 0.5);
    }

    #[test]
    fn doubled_whole_at_120_is_four_seconds() {
        let interval = Interval::WHOLE.times(2).unwrap();
        assert_eq!(interval.to_seconds(Tempo::default()), 4.0);
        assert_eq!(Interval::WHOLE.scale(2.0).unwrap(), interval);
    }

    #[test]
    fn rejects_non_positive_scalars() {
        assert!(Interval::WHOLE.times(0).unwrap_err().is_invalid_argument());
        assert!(Interval::WHOLE.scale(0.0).unwrap_err().is_invalid_argument());
        assert!(Interval::WHOLE.scale(-1.0).unwrap_err().is_invalid_argument());
        assert!(Interval::WHOLE.scale(f64::NAN).is_err());
        assert!(Interval::new(-0.25).is_err());
    }

    #[test]
    fn arithmetic() {
        let dotted_quarter = Interval::QUARTER + Interval::EIGHTH;
        assert_eq!(dotted_quarter.whole_notes(), 0.375);
        assert_eq!((Interval::HALF - Interval::QUARTER), Interval::QUARTER);
        let triplets = Interval::TRIPLET.times(3).unwrap();
        assert!(approx_eq!(f64, triplets.whole_notes(), 1.0, ulps = 2));
    }

    #[test]
    fn negative_difference_clamps_to_zero_duration() {
        let negative = Interval::QUARTER - Interval::HALF;
        assert!(negative.to_seconds(Tempo::default()) < 0.0);
        assert_eq!(negative.to_duration(Tempo::default()).unwrap(), Duration::ZERO);
    }

    #[test]
    fn unrepresentable_duration_is_rejected() {
        let huge = Interval::new(1e19).unwrap();
        assert!(huge.to_duration(Tempo::default()).unwrap_err().is_invalid_argument());

        let glacial = Tempo::new(1e-300).unwrap();
        assert!(Interval::QUARTER.to_duration(glacial).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn tempo_scales_conversion() {
        let slow = Tempo::new(60.0).unwrap();
        assert_eq!(Interval::QUARTER.to_seconds(slow), 1.0);
        assert_eq!(Interval::SIXTEENTH.to_seconds(slow), 0.25);
        assert!(Tempo::new(0.0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn tempo_clock_is_shared_and_read_at_conversion_time() {
        let clock = TempoClock::default();
        let handle = clock.clone();
        let before = clock.tempo();

        handle.set_bpm(60.0).unwrap();
        assert_eq!(clock.bpm(), 60.0);
        assert_eq!(Interval::QUARTER.to_seconds(before), 0.5);
        assert_eq!(Interval::QUARTER.to_seconds(clock.tempo()), 1.0);

        assert!(clock.set_bpm(-5.0).is_err());
        assert_eq!(clock.bpm(), 60.0);
    }

    #[test]
    fn interval_names() {
        assert_eq!("quarter".parse::<Interval>().unwrap(), Interval::QUARTER);
        assert_eq!("1/16".parse::<Interval>().unwrap(), Interval::SIXTEENTH);
        assert!("breve".parse::<Interval>().unwrap_err().is_invalid_argument());
    }
}

//! Stateless oscillators.
//!
//! Every waveform is a pure function of absolute time, so a note can be
//! rendered from any sample index without carrying phase between calls.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Detune of the outer super-saw voices, in cents.
pub const SUPER_SAW_DETUNE_CENTS: f64 = 15.0;
/// Detune of the second strings voice, in cents.
pub const STRINGS_DETUNE_CENTS: f64 = 10.0;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    SawTooth,
    Sine,
    Square,
    Triangle,
    /// Three saws: centre, +15 and -15 cents.
    SuperSaw,
    /// Two saws: centre and +10 cents.
    Strings,
}

impl Waveform {
    pub const ALL: [Waveform; 6] = [
        Waveform::SawTooth,
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::SuperSaw,
        Waveform::Strings,
    ];

    /// Sample at `t` seconds for a tone of `frequency` Hz, peaking at
    /// `amplitude`.
    #[inline]
    pub fn sample(self, t: f64, frequency: f64, amplitude: f64) -> f64 {
        match self {
            Waveform::SawTooth => sawtooth(t, frequency, amplitude),
            Waveform::Sine => sine(t, frequency, amplitude),
            Waveform::Square => square(t, frequency, amplitude),
            Waveform::Triangle => triangle(t, frequency, amplitude),
            Waveform::SuperSaw => super_saw(t, frequency, amplitude),
            Waveform::Strings => strings(t, frequency, amplitude),
        }
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sawtooth" | "saw_tooth" | "saw" => Ok(Waveform::SawTooth),
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "super_saw" | "supersaw" => Ok(Waveform::SuperSaw),
            "strings" => Ok(Waveform::Strings),
            _ => Err(SynthError::invalid("waveform", format!("'{s}' is not a waveform"))),
        }
    }
}

/// Fractional part, always in [0, 1).
#[inline]
fn frac(x: f64) -> f64 {
    x - x.floor()
}

/// Frequency shifted by `cents`.
#[inline]
fn detuned(frequency: f64, cents: f64) -> f64 {
    frequency * 2.0_f64.powf(cents / 1200.0)
}

/// Rises from -A to +A once per period.
pub fn sawtooth(t: f64, frequency: f64, amplitude: f64) -> f64 {
    2.0 * amplitude * (frac(t * frequency) - 0.5)
}

pub fn sine(t: f64, frequency: f64, amplitude: f64) -> f64 {
    amplitude * (2.0 * PI * frequency * t).sin()
}

/// +A for the first half of each period, -A for the second.
pub fn square(t: f64, frequency: f64, amplitude: f64) -> f64 {
    if frac(t * frequency) < 0.5 { amplitude } else { -amplitude }
}

/// Starts at 0, peaks at a quarter period, troughs at three quarters.
pub fn triangle(t: f64, frequency: f64, amplitude: f64) -> f64 {
    let phase = frac(t * frequency);
    if phase < 0.25 {
        amplitude * phase * 4.0
    } else if phase < 0.75 {
        amplitude * (1.0 - (phase - 0.25) * 4.0)
    } else {
        amplitude * (phase - 1.0) * 4.0
    }
}

pub fn super_saw(t: f64, frequency: f64, amplitude: f64) -> f64 {
    let centre = sawtooth(t, frequency, amplitude);
    let sharp = sawtooth(t, detuned(frequency, SUPER_SAW_DETUNE_CENTS), amplitude);
    let flat = sawtooth(t, detuned(frequency, -SUPER_SAW_DETUNE_CENTS), amplitude);
    (centre + sharp + flat) / 3.0
}

pub fn strings(t: f64, frequency: f64, amplitude: f64) -> f64 {
    let centre = sawtooth(t, frequency, amplitude);
    let sharp = sawtooth(t, detuned(frequency, STRINGS_DETUNE_CENTS), amplitude);
    (centre + sharp) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const SAMPLE_RATE: f64 = 44100.0;

    fn samples(waveform: Waveform, frequency: f64, amplitude: f64) -> impl Iterator<Item = f64> {
        (0..SAMPLE_RATE as usize)
            .map(move |i| waveform.sample(i as f64 / SAMPLE_RATE, frequency, amplitude))
    }

    #[test]
    fn sawtooth_starts_at_negative_amplitude() {
        assert_eq!(Waveform::SawTooth.sample(0.0, 440.0, 0.8), -0.8);
        assert!(approx_eq!(f64, Waveform::SuperSaw.sample(0.0, 440.0, 0.8), -0.8, ulps = 4));
        assert_eq!(Waveform::Strings.sample(0.0, 440.0, 0.8), -0.8);
    }

    #[test]
    fn sine_zero_at_start() {
        assert_eq!(Waveform::Sine.sample(0.0, 440.0, 1.0), 0.0);
        let quarter_period = 1.0 / (4.0 * 440.0);
        assert!(approx_eq!(f64, Waveform::Sine.sample(quarter_period, 440.0, 0.5), 0.5, epsilon = 1e-12));
    }

    #[test]
    fn square_flips_at_half_period() {
        let frequency = 4.0;
        let half_period = 0.5 / frequency;
        assert_eq!(Waveform::Square.sample(0.0, frequency, 1.0), 1.0);
        assert_eq!(Waveform::Square.sample(half_period - 1e-9, frequency, 1.0), 1.0);
        assert_eq!(Waveform::Square.sample(half_period, frequency, 1.0), -1.0);

        let a4_half = 0.5 / 440.0;
        assert_eq!(Waveform::Square.sample(a4_half * 0.999, 440.0, 0.3), 0.3);
        assert_eq!(Waveform::Square.sample(a4_half * 1.001, 440.0, 0.3), -0.3);
    }

    #[test]
    fn triangle_breakpoints() {
        let f = 1.0;
        assert_eq!(Waveform::Triangle.sample(0.0, f, 1.0), 0.0);
        assert_eq!(Waveform::Triangle.sample(0.25, f, 1.0), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.5, f, 1.0), 0.0);
        assert_eq!(Waveform::Triangle.sample(0.75, f, 1.0), -1.0);
        assert!(approx_eq!(f64, Waveform::Triangle.sample(0.875, f, 1.0), -0.5, ulps = 2));
    }

    #[test]
    fn all_waveforms_stay_within_amplitude() {
        let amplitude = 0.7;
        for waveform in Waveform::ALL {
            for s in samples(waveform, 440.0, amplitude) {
                assert!(
                    s.abs() <= amplitude + 1e-12,
                    "{waveform:?} out of range: {s}"
                );
            }
        }
    }

    #[test]
    fn detune_ratio() {
        assert!(approx_eq!(f64, detuned(440.0, 1200.0), 880.0, ulps = 2));
        assert!(detuned(440.0, SUPER_SAW_DETUNE_CENTS) > 440.0);
        assert!(detuned(440.0, -SUPER_SAW_DETUNE_CENTS) < 440.0);
    }

    #[test]
    fn strings_differs_from_plain_saw_over_time() {
        let t = 0.123;
        assert_ne!(
            Waveform::Strings.sample(t, 220.0, 1.0),
            Waveform::SawTooth.sample(t, 220.0, 1.0)
        );
    }

    #[test]
    fn waveform_names() {
        assert_eq!("saw".parse::<Waveform>().unwrap(), Waveform::SawTooth);
        assert_eq!("SuperSaw".parse::<Waveform>().unwrap(), Waveform::SuperSaw);
        assert!("kazoo".parse::<Waveform>().unwrap_err().is_invalid_argument());
    }
}

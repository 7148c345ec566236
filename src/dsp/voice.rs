//! Note and instrument — what to play and how it should sound.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::timing::{Interval, Tempo};

use super::envelope::Envelope;
use super::oscillator::Waveform;

/// A single pitched event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Peak gain. Nominally [0, 1] but not clamped.
    pub amplitude: f64,
    /// How long the note is held before release, in seconds.
    pub duration: f64,
}

impl Note {
    pub fn new(frequency: f64, amplitude: f64, duration: f64) -> Result<Self> {
        let note = Note {
            frequency,
            amplitude,
            duration,
        };
        note.validate()?;
        Ok(note)
    }

    /// A note held for `interval` at `tempo`.
    pub fn with_interval(frequency: f64, amplitude: f64, interval: Interval, tempo: Tempo) -> Result<Self> {
        Self::new(frequency, amplitude, interval.to_seconds(tempo))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(SynthError::invalid(
                "note",
                format!("frequency {} Hz must be positive", self.frequency),
            ));
        }
        if !self.amplitude.is_finite() {
            return Err(SynthError::invalid("note", "amplitude must be finite"));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SynthError::invalid(
                "note",
                format!("duration {} s must be non-negative", self.duration),
            ));
        }
        Ok(())
    }
}

/// Waveform plus envelope: everything needed to turn a [`Note`] into sound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub waveform: Waveform,
    #[serde(default)]
    pub envelope: Envelope,
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            waveform: Waveform::Triangle,
            envelope: Envelope::default(),
        }
    }
}

impl Instrument {
    pub fn new(waveform: Waveform, envelope: Envelope) -> Self {
        Instrument { waveform, envelope }
    }

    /// Decode an instrument patch such as
    /// `{"waveform": "super_saw", "envelope": {...}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let instrument: Instrument = serde_json::from_str(json)?;
        instrument.envelope.validate()?;
        Ok(instrument)
    }

    /// Mono sample of `note` at `t` seconds after its onset.
    #[inline]
    pub fn sample(&self, note: &Note, t: f64) -> f64 {
        self.waveform.sample(t, note.frequency, note.amplitude) * self.envelope.value(t, note.duration)
    }

    /// Seconds from onset until `note` is silent.
    pub fn sounding_time(&self, note: &Note) -> f64 {
        self.envelope.end_time(note.duration)
    }
}

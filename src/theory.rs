//! Pitch table — note names to frequencies, scales and chords.
//!
//! Pitches are semitone offsets from C within an octave. The table is
//! anchored on a reference pitch (A4 = 440 Hz by default) and every other
//! frequency is derived from it on the twelve-tone equal grid, except chords
//! voiced in just intonation, which apply small-integer ratios to the root.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TuningConfig;
use crate::error::{Result, SynthError};

/// Offsets of the major scale degrees from the root, in semitones.
pub const MAJOR_SCALE_OFFSETS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// A semitone offset from C. Values outside 0..12 are allowed and simply
/// land in a neighbouring octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pitch(pub i32);

impl Pitch {
    pub const C: Pitch = Pitch(0);
    pub const C_SHARP: Pitch = Pitch(1);
    pub const D_FLAT: Pitch = Pitch(1);
    pub const D: Pitch = Pitch(2);
    pub const D_SHARP: Pitch = Pitch(3);
    pub const E_FLAT: Pitch = Pitch(3);
    pub const E: Pitch = Pitch(4);
    pub const F: Pitch = Pitch(5);
    pub const F_SHARP: Pitch = Pitch(6);
    pub const G_FLAT: Pitch = Pitch(6);
    pub const G: Pitch = Pitch(7);
    pub const G_SHARP: Pitch = Pitch(8);
    pub const A_FLAT: Pitch = Pitch(8);
    pub const A: Pitch = Pitch(9);
    pub const A_SHARP: Pitch = Pitch(10);
    pub const B_FLAT: Pitch = Pitch(10);
    pub const B: Pitch = Pitch(11);

    /// Semitones above C.
    pub fn semitones(self) -> i32 {
        self.0
    }
}

impl Add<i32> for Pitch {
    type Output = Pitch;

    fn add(self, semitones: i32) -> Pitch {
        Pitch(self.0 + semitones)
    }
}

impl Sub<i32> for Pitch {
    type Output = Pitch;

    fn sub(self, semitones: i32) -> Pitch {
        Pitch(self.0 - semitones)
    }
}

impl FromStr for Pitch {
    type Err = SynthError;

    /// Parse a pitch name such as `C`, `F#` or `Bb`.
    fn from_str(s: &str) -> Result<Self> {
        match parse_pitch_prefix(s) {
            Some((pitch, rest)) if rest.is_empty() => Ok(pitch),
            _ => Err(SynthError::invalid("pitch", format!("'{s}' is not a pitch name"))),
        }
    }
}

/// Parse the letter and optional accidental at the start of `s`, returning
/// the pitch and whatever follows it.
fn parse_pitch_prefix(s: &str) -> Option<(Pitch, &str)> {
    let mut chars = s.chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (semitone, rest) = match rest.chars().next() {
        Some('#') => (base + 1, &rest[1..]),
        Some('b') => (base - 1, &rest[1..]),
        _ => (base, rest),
    };
    Some((Pitch(semitone), rest))
}

/// Parse a note name with octave (e.g. `A4`, `F#3`, `Bb-1`).
pub fn parse_note(note: &str) -> Result<(Pitch, i32)> {
    let invalid = || SynthError::invalid("note", format!("'{note}' is not a note name"));
    let (pitch, octave_str) = parse_pitch_prefix(note).ok_or_else(invalid)?;
    let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
    Ok((pitch, octave))
}

/// How a chord's upper notes are derived from its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intonation {
    /// Fixed semitone offsets on the twelve-tone equal grid.
    EqualTemperament,
    /// Small-integer frequency ratios applied to the root frequency.
    JustIntonation,
}

impl FromStr for Intonation {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal_temperament" | "equal" | "et" => Ok(Intonation::EqualTemperament),
            "just_intonation" | "just" | "ji" => Ok(Intonation::JustIntonation),
            _ => Err(SynthError::invalid("intonation", format!("'{s}' is not an intonation"))),
        }
    }
}

/// Supported chord qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordType {
    Major,
    Minor,
    Seventh,
    MajorSeventh,
    Augmented,
    Diminished,
}

impl ChordType {
    pub const ALL: [ChordType; 6] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Seventh,
        ChordType::MajorSeventh,
        ChordType::Augmented,
        ChordType::Diminished,
    ];

    /// Semitone offsets from the root under equal temperament.
    ///
    /// Seventh chords are built on the minor third and augmented uses
    /// 0, 5, 8. Both are kept exactly as tabulated.
    pub fn semitone_offsets(self) -> &'static [i32] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Seventh => &[0, 3, 7, 10],
            ChordType::MajorSeventh => &[0, 3, 7, 11],
            ChordType::Augmented => &[0, 5, 8],
            ChordType::Diminished => &[0, 3, 6],
        }
    }

    /// Frequency ratios to the root under just intonation.
    pub fn just_ratios(self) -> &'static [f64] {
        match self {
            ChordType::Major => &[1.0, 5.0 / 4.0, 3.0 / 2.0],
            ChordType::Minor => &[1.0, 6.0 / 5.0, 3.0 / 2.0],
            ChordType::Seventh => &[1.0, 6.0 / 5.0, 3.0 / 2.0, 9.0 / 5.0],
            ChordType::MajorSeventh => &[1.0, 6.0 / 5.0, 3.0 / 2.0, 15.0 / 8.0],
            ChordType::Augmented => &[1.0, 5.0 / 4.0, 25.0 / 16.0],
            ChordType::Diminished => &[1.0, 256.0 / 225.0, 64.0 / 45.0],
        }
    }
}

impl FromStr for ChordType {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" | "maj" => Ok(ChordType::Major),
            "minor" | "min" | "m" => Ok(ChordType::Minor),
            "seventh" | "7" => Ok(ChordType::Seventh),
            "major_seventh" | "maj7" => Ok(ChordType::MajorSeventh),
            "augmented" | "aug" => Ok(ChordType::Augmented),
            "diminished" | "dim" => Ok(ChordType::Diminished),
            _ => Err(SynthError::invalid("chord type", format!("'{s}' is not a chord type"))),
        }
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordType::Major => "major",
            ChordType::Minor => "minor",
            ChordType::Seventh => "seventh",
            ChordType::MajorSeventh => "major_seventh",
            ChordType::Augmented => "augmented",
            ChordType::Diminished => "diminished",
        };
        f.write_str(name)
    }
}

/// Converts pitches to frequencies relative to a reference tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTable {
    /// Frequency of A in the reference octave, in Hz.
    pub reference_frequency: f64,
    /// Octave the reference A lives in.
    pub reference_octave: i32,
}

impl Default for PitchTable {
    fn default() -> Self {
        PitchTable {
            reference_frequency: 440.0,
            reference_octave: 4,
        }
    }
}

impl PitchTable {
    pub fn new(reference_frequency: f64, reference_octave: i32) -> Result<Self> {
        if !(reference_frequency.is_finite() && reference_frequency > 0.0) {
            return Err(SynthError::invalid(
                "reference frequency",
                format!("{reference_frequency} Hz must be positive"),
            ));
        }
        Ok(PitchTable {
            reference_frequency,
            reference_octave,
        })
    }

    pub fn from_config(tuning: &TuningConfig) -> Result<Self> {
        Self::new(tuning.reference_frequency, tuning.reference_octave)
    }

    /// Frequency of `pitch` in `octave`.
    ///
    /// `reference * 2^((pitch - A) / 12) * 2^(octave - reference_octave)`.
    /// The octave factor is an exact power of two, so moving up an octave
    /// doubles the result bit-for-bit.
    pub fn frequency(&self, pitch: Pitch, octave: i32) -> f64 {
        let semitones = (pitch.0 - Pitch::A.0) as f64;
        self.reference_frequency
            * 2.0_f64.powf(semitones / 12.0)
            * 2.0_f64.powi(octave - self.reference_octave)
    }

    /// Major scale on `root` from `lowest_octave` through `highest_octave`,
    /// closed by the root one octave above the highest octave.
    ///
    /// `None` (or a value below `lowest_octave`) means a single octave.
    pub fn scale(&self, root: Pitch, lowest_octave: i32, highest_octave: Option<i32>) -> Vec<f64> {
        let highest = highest_octave.unwrap_or(lowest_octave).max(lowest_octave);
        let octaves = (highest - lowest_octave + 1) as usize;
        let mut frequencies = Vec::with_capacity(octaves * MAJOR_SCALE_OFFSETS.len() + 1);

        for octave in lowest_octave..=highest {
            frequencies.extend(
                MAJOR_SCALE_OFFSETS
                    .iter()
                    .map(|&offset| self.frequency(root + offset, octave)),
            );
        }
        frequencies.push(self.frequency(root + 12, highest));
        frequencies
    }

    /// Frequencies of a chord built on `root` in `octave`.
    pub fn chord(
        &self,
        root: Pitch,
        octave: i32,
        chord_type: ChordType,
        intonation: Intonation,
    ) -> Vec<f64> {
        match intonation {
            Intonation::EqualTemperament => chord_type
                .semitone_offsets()
                .iter()
                .map(|&offset| self.frequency(root + offset, octave))
                .collect(),
            Intonation::JustIntonation => {
                let root_frequency = self.frequency(root, octave);
                chord_type
                    .just_ratios()
                    .iter()
                    .map(|&ratio| root_frequency * ratio)
                    .collect()
            }
        }
    }

    /// Frequency of a note name such as `C#3`.
    pub fn note_frequency(&self, note: &str) -> Result<f64> {
        let (pitch, octave) = parse_note(note)?;
        Ok(self.frequency(pitch, octave))
    }
}

//! Generative helpers — seeded randomness, pitch-based panning and the
//! random-walk pad.

use crate::dsp::chorus::StereoChorus;
use crate::dsp::delay::StereoEcho;
use crate::dsp::effects::{Effect, EffectChain};
use crate::dsp::envelope::Envelope;
use crate::dsp::oscillator::Waveform;
use crate::dsp::voice::Instrument;
use crate::sequencer::Sequence;
use crate::theory::{Pitch, PitchTable};
use crate::timing::Interval;

/// A small seeded PRNG. The same seed always yields the same stream.
#[derive(Debug, Clone)]
pub struct Rng(oorandom::Rand32);

impl Rng {
    pub fn new_with_seed(seed: u64) -> Self {
        Self(oorandom::Rand32::new(seed))
    }

    /// Uniform in `range`, which must be non-empty.
    pub fn rand_range(&mut self, range: std::ops::Range<u32>) -> u32 {
        self.0.rand_range(range)
    }

    /// Uniform in [0, 1).
    pub fn rand_float(&mut self) -> f32 {
        self.0.rand_float()
    }
}

/// Pan position for `frequency` within `[lowest, highest]`: `-width` at the
/// bottom of the register, `+width` at the top, clamped outside it.
pub fn register_pan(frequency: f64, lowest: f64, highest: f64, width: f64) -> f64 {
    let position = if highest == lowest {
        0.5
    } else {
        ((frequency - lowest) / (highest - lowest)).clamp(0.0, 1.0)
    };
    -width + 2.0 * width * position
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T>(items: &mut [T], rng: &mut Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..i as u32 + 1) as usize;
        items.swap(i, j);
    }
}

/// Semitone offsets of the pad's pentatonic degrees within one octave.
pub const PAD_DEGREES: [i32; 5] = [1, 3, 6, 8, 10];
/// Octave in which pad degree offsets are resolved.
pub const PAD_OCTAVE: i32 = 1;

/// Three pad voices wandering upward through a four-octave pentatonic set.
///
/// Each call to [`PadWalk::next_chord`] returns the current voicing, then
/// nudges one randomly chosen voice up a degree, wrapping from the top of
/// the set back to the bottom.
#[derive(Debug, Clone)]
pub struct PadWalk {
    degrees: Vec<i32>,
    voices: [usize; 3],
    rng: Rng,
}

impl PadWalk {
    pub fn new(seed: u64) -> Self {
        let degrees = (0..4)
            .flat_map(|octave| PAD_DEGREES.iter().map(move |d| d + 12 * octave))
            .collect();
        PadWalk {
            degrees,
            voices: [4, 8, 12],
            rng: Rng::new_with_seed(seed),
        }
    }

    /// Every semitone offset a voice can sit on, lowest first.
    pub fn degrees(&self) -> &[i32] {
        &self.degrees
    }

    /// Current degree index of each voice.
    pub fn voices(&self) -> [usize; 3] {
        self.voices
    }

    /// Current voicing as frequencies, then advance one voice.
    pub fn next_chord(&mut self, table: &PitchTable) -> Vec<f64> {
        let chord = self
            .voices
            .iter()
            .map(|&index| table.frequency(Pitch(self.degrees[index]), PAD_OCTAVE))
            .collect();
        let voice = self.rng.rand_range(0..self.voices.len() as u32) as usize;
        self.voices[voice] = (self.voices[voice] + 1) % self.degrees.len();
        chord
    }

    /// The next `steps` chords as a playable sequence: slow saw pad held for
    /// two whole notes per chord, through echo then chorus.
    pub fn sequence(&mut self, table: &PitchTable, steps: usize) -> Sequence {
        let chords = (0..steps).map(|_| self.next_chord(table)).collect();
        let effects = EffectChain::default()
            .with(Effect::StereoEcho(StereoEcho::default()))
            .with(Effect::StereoChorus(StereoChorus::default()));
        Sequence::chords(chords, pad_instrument())
            .with_interval(Interval::WHOLE + Interval::WHOLE)
            .with_gate(1.0)
            .with_effects(effects)
    }
}

/// Slow-attack sawtooth pad.
pub fn pad_instrument() -> Instrument {
    Instrument::new(
        Waveform::SawTooth,
        Envelope {
            attack: 2.0,
            decay: 2.0,
            sustain: 0.5,
            release: 2.0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn register_pan_spans_the_width() {
        assert_eq!(register_pan(100.0, 100.0, 300.0, 0.5), -0.5);
        assert_eq!(register_pan(200.0, 100.0, 300.0, 0.5), 0.0);
        assert_eq!(register_pan(300.0, 100.0, 300.0, 0.5), 0.5);
        assert_eq!(register_pan(900.0, 100.0, 300.0, 0.5), 0.5);
        assert_eq!(register_pan(50.0, 100.0, 100.0, 0.5), 0.0);
    }

    #[test]
    fn shuffle_is_reproducible_permutation() {
        let table = PitchTable::default();
        let scale = table.scale(Pitch::C, 3, None);

        let mut a = scale.clone();
        let mut b = scale.clone();
        shuffle(&mut a, &mut Rng::new_with_seed(7));
        shuffle(&mut b, &mut Rng::new_with_seed(7));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, scale);
    }

    #[test]
    fn pad_degrees_cover_four_octaves() {
        let walk = PadWalk::new(1);
        assert_eq!(walk.degrees().len(), 20);
        assert_eq!(&walk.degrees()[..6], &[1, 3, 6, 8, 10, 13]);
        assert_eq!(walk.degrees()[19], 46);
        assert_eq!(walk.voices(), [4, 8, 12]);
    }

    #[test]
    fn pad_walk_moves_one_voice_per_step() {
        let table = PitchTable::default();
        let mut walk = PadWalk::new(42);

        let first = walk.next_chord(&table);
        assert_eq!(first.len(), 3);
        // Degree 10 (A#) at octave 1: a semitone above A1.
        let a_sharp_1 = 55.0 * 2.0_f64.powf(1.0 / 12.0);
        assert!(approx_eq!(f64, first[0], a_sharp_1, epsilon = 1e-9));

        for _ in 0..50 {
            let before = walk.voices();
            walk.next_chord(&table);
            let after = walk.voices();
            let moved: Vec<usize> = (0..3).filter(|&v| before[v] != after[v]).collect();
            assert_eq!(moved.len(), 1);
            let v = moved[0];
            assert_eq!(after[v], (before[v] + 1) % 20);
        }
    }

    #[test]
    fn pad_walk_is_seeded() {
        let table = PitchTable::default();
        let mut a = PadWalk::new(3);
        let mut b = PadWalk::new(3);
        for _ in 0..10 {
            assert_eq!(a.next_chord(&table), b.next_chord(&table));
        }
    }

    #[test]
    fn pad_sequence() {
        let mut walk = PadWalk::new(9);
        let sequence = walk.sequence(&PitchTable::default(), 4);
        assert_eq!(sequence.steps.len(), 4);
        assert!(sequence.steps.iter().all(|chord| chord.len() == 3));
        assert_eq!(sequence.interval, Interval::WHOLE.times(2).unwrap());
        assert_eq!(sequence.effects.len(), 2);
        assert!(sequence.validate().is_ok());
    }
}

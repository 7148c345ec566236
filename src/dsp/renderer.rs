//! Sample renderer — turns one note into an interleaved stereo buffer.

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Result, SynthError};

use super::effects::EffectChain;
use super::voice::{Instrument, Note};

/// Number of interleaved channels in every rendered buffer.
pub const CHANNELS: u16 = 2;

/// Longest buffer a single note may render to, in frames.
pub const MAX_FRAMES: usize = 1 << 28;

/// A finished block of interleaved stereo audio, `[L0, R0, L1, R1, ...]`.
///
/// This is what the playback side receives: the samples plus the rate and
/// channel count they were rendered at.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RenderedBuffer {
    /// A silent buffer of `frames` stereo frames.
    pub fn silent(frames: usize, sample_rate: u32) -> Self {
        RenderedBuffer {
            samples: vec![0.0; frames * CHANNELS as usize],
            sample_rate,
            channels: CHANNELS,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn frame(&self, index: usize) -> (f32, f32) {
        (self.samples[index * 2], self.samples[index * 2 + 1])
    }

    /// Every sample of one channel, in order.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().skip(channel).step_by(self.channels as usize).copied()
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }
}

/// Left/right gains for `pan` in [-1, 1].
///
/// Only the channel being panned away from is attenuated; the other stays
/// at unity.
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let left = if pan <= 0.0 { 1.0 } else { 1.0 - pan };
    let right = if pan >= 0.0 { 1.0 } else { 1.0 + pan };
    (left, right)
}

/// Renders notes at a fixed output sample rate.
///
/// Holds no per-note state, so one renderer can be shared across threads
/// and used to pre-render several notes in parallel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRenderer {
    sample_rate: u32,
}

impl SampleRenderer {
    pub fn new(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample rate", "must be positive"));
        }
        Ok(SampleRenderer { sample_rate })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames needed to hold `note` through the end of its release.
    pub fn frame_count(&self, note: &Note, instrument: &Instrument) -> Result<usize> {
        let frames = (instrument.sounding_time(note) * self.sample_rate as f64).ceil();
        if !(frames.is_finite() && frames <= MAX_FRAMES as f64) {
            return Err(SynthError::invalid(
                "note",
                format!(
                    "{} s at {} Hz exceeds {MAX_FRAMES} frames",
                    instrument.sounding_time(note),
                    self.sample_rate
                ),
            ));
        }
        Ok(frames as usize)
    }

    /// Render `note` played by `instrument`, placed at `pan`.
    pub fn render(&self, note: &Note, instrument: &Instrument, pan: f64) -> Result<RenderedBuffer> {
        note.validate()?;
        instrument.envelope.validate()?;
        if !(-1.0..=1.0).contains(&pan) {
            return Err(SynthError::invalid("pan", format!("{pan} must lie in [-1, 1]")));
        }

        let frames = self.frame_count(note, instrument)?;
        let sample_rate = self.sample_rate as f64;
        let (left_gain, right_gain) = pan_gains(pan);

        let mut samples = Vec::with_capacity(frames * CHANNELS as usize);
        for i in 0..frames {
            let t = i as f64 / sample_rate;
            let sample = instrument.sample(note, t);
            samples.push((sample * left_gain) as f32);
            samples.push((sample * right_gain) as f32);
        }

        debug!(
            frequency = note.frequency,
            duration = note.duration,
            waveform = ?instrument.waveform,
            frames,
            "rendered note"
        );

        Ok(RenderedBuffer {
            samples,
            sample_rate: self.sample_rate,
            channels: CHANNELS,
        })
    }

    /// Render `note` and run `effects` over the result.
    pub fn render_with_effects(
        &self,
        note: &Note,
        instrument: &Instrument,
        pan: f64,
        effects: &EffectChain,
    ) -> Result<RenderedBuffer> {
        effects.validate()?;
        let mut buffer = self.render(note, instrument, pan)?;
        effects.apply(&mut buffer);
        Ok(buffer)
    }
}

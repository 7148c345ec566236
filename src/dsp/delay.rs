//! Stereo echo — a fixed train of reflections bouncing between channels.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

use super::renderer::RenderedBuffer;

/// Echo with a fixed number of reflections.
///
/// Reflection `r` (counting from 0) lands `(r + 1) * step` seconds after
/// the dry signal, on channel `r % 2`, with gain `amplitude * decay^(r + 1)`.
/// Every reflection taps the dry signal, so reflections do not feed back
/// into one another. Reflections falling past the end of the buffer are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoEcho {
    /// Spacing between reflections in seconds.
    pub step: f64,
    /// Starting gain before the first decay is applied.
    pub amplitude: f64,
    /// Gain multiplier applied once per reflection.
    pub decay: f64,
    pub reflections: usize,
}

impl Default for StereoEcho {
    fn default() -> Self {
        StereoEcho {
            step: 0.3,
            amplitude: 0.5,
            decay: 0.5,
            reflections: 5,
        }
    }
}

impl StereoEcho {
    /// Wider, faster-fading voicing: 0.8 s spacing, ×0.3 per reflection.
    pub fn long() -> Self {
        StereoEcho {
            step: 0.8,
            amplitude: 0.5,
            decay: 0.3,
            reflections: 5,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step >= 0.0) {
            return Err(SynthError::invalid(
                "stereo echo",
                format!("step {} s must be a non-negative time", self.step),
            ));
        }
        for (name, value) in [("amplitude", self.amplitude), ("decay", self.decay)] {
            if !value.is_finite() {
                return Err(SynthError::invalid("stereo echo", format!("{name} {value} must be finite")));
            }
        }
        Ok(())
    }

    /// Spacing between reflections in frames at `sample_rate`.
    pub fn step_frames(&self, sample_rate: u32) -> usize {
        (self.step * sample_rate as f64) as usize
    }

    /// Gain of reflection `reflection` (0-based).
    pub fn reflection_gain(&self, reflection: usize) -> f64 {
        self.amplitude * self.decay.powi(reflection as i32 + 1)
    }

    /// Add the reflections into `buffer` in place.
    pub fn process(&self, buffer: &mut RenderedBuffer) {
        let step = self.step_frames(buffer.sample_rate);
        let frames = buffer.frames();
        if step == 0 {
            return;
        }

        let dry = buffer.samples.clone();
        let mut delay = 0;
        for reflection in 0..self.reflections {
            delay += step;
            if delay >= frames {
                break;
            }
            let channel = reflection % 2;
            let gain = self.reflection_gain(reflection) as f32;
            for i in 0..frames - delay {
                buffer.samples[(i + delay) * 2 + channel] += gain * dry[i * 2 + channel];
            }
        }
    }
}

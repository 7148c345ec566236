//! Mixer — sums several rendered notes into one buffer (chords).

use crate::error::{Result, SynthError};

use super::renderer::{CHANNELS, RenderedBuffer};

/// A summing mixer for rendered buffers of one sample rate.
///
/// Shorter buffers are treated as silent past their end.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f32,
    buffer: Vec<f32>,
    sample_rate: Option<u32>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 1.0,
            buffer: Vec::new(),
            sample_rate: None,
        }
    }

    /// Accumulate `rendered` starting at frame 0.
    pub fn add(&mut self, rendered: &RenderedBuffer) -> Result<()> {
        match self.sample_rate {
            Some(rate) if rate != rendered.sample_rate => {
                return Err(SynthError::invalid(
                    "mix",
                    format!("cannot mix {} Hz into a {rate} Hz bus", rendered.sample_rate),
                ));
            }
            _ => self.sample_rate = Some(rendered.sample_rate),
        }
        if rendered.channels != CHANNELS {
            return Err(SynthError::invalid(
                "mix",
                format!("expected {CHANNELS} channels, got {}", rendered.channels),
            ));
        }

        if self.buffer.len() < rendered.samples.len() {
            self.buffer.resize(rendered.samples.len(), 0.0);
        }
        for (acc, &s) in self.buffer.iter_mut().zip(&rendered.samples) {
            *acc += s;
        }
        Ok(())
    }

    /// Number of frames accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len() / CHANNELS as usize
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The mixed buffer with master gain applied, or `None` if nothing was added.
    pub fn finish(self) -> Option<RenderedBuffer> {
        let sample_rate = self.sample_rate?;
        let gain = self.master_gain;
        Some(RenderedBuffer {
            samples: self.buffer.into_iter().map(|s| s * gain).collect(),
            sample_rate,
            channels: CHANNELS,
        })
    }
}

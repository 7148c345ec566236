//! Stereo chorus — widens a centred note by sliding the left channel late.

use serde::{Deserialize, Serialize};

use super::renderer::RenderedBuffer;

/// Shifts the left channel later by a fixed number of frames.
///
/// Destination samples are overwritten, not summed. The first
/// `delay_frames` left samples keep their original values and the right
/// channel is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoChorus {
    pub delay_frames: usize,
}

impl Default for StereoChorus {
    fn default() -> Self {
        StereoChorus { delay_frames: 100 }
    }
}

impl StereoChorus {
    pub fn process(&self, buffer: &mut RenderedBuffer) {
        let frames = buffer.frames();
        let delay = self.delay_frames;
        if delay == 0 || delay >= frames {
            return;
        }
        // Walk from the tail so each source is read before it is overwritten.
        for i in (0..frames - delay).rev() {
            buffer.samples[(i + delay) * 2] = buffer.samples[i * 2];
        }
    }
}

//! Signal path — oscillators, envelope, note rendering and buffer effects.
//!
//! Rendering is a pure function of its inputs: a note, an instrument, a pan
//! position and an output sample rate go in, an interleaved stereo buffer
//! comes out. Effects then rewrite that buffer in place before it is handed
//! to playback.

pub mod chorus;
pub mod delay;
pub mod effects;
pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;

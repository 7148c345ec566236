pub mod config;
pub mod dsp;
pub mod error;
pub mod generative;
pub mod sequencer;
pub mod theory;
pub mod timing;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub use crate::config::{EngineConfig, TuningConfig};
pub use crate::dsp::effects::{Effect, EffectChain};
pub use crate::dsp::envelope::Envelope;
pub use crate::dsp::oscillator::Waveform;
pub use crate::dsp::renderer::{RenderedBuffer, SampleRenderer};
pub use crate::dsp::voice::{Instrument, Note};
pub use crate::error::{Result, SynthError};
pub use crate::sequencer::{Clock, PlaybackSink, Sequence, Sequencer, VirtualClock};
pub use crate::theory::{ChordType, Intonation, Pitch, PitchTable};
pub use crate::timing::{Interval, Tempo, TempoClock};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tonewalk-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn default_amplitude() -> f64 {
    0.5
}

fn default_sample_rate() -> u32 {
    EngineConfig::default().sample_rate
}

/// One note to render, as a host describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub frequency: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Seconds held before release.
    pub duration: f64,
    #[serde(default)]
    pub pan: f64,
    #[serde(default)]
    pub instrument: Instrument,
    #[serde(default)]
    pub effects: EffectChain,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Render a [`NoteRequest`] through its effects.
pub fn render_request(request: &NoteRequest) -> Result<RenderedBuffer> {
    let note = Note::new(request.frequency, request.amplitude, request.duration)?;
    let renderer = SampleRenderer::new(request.sample_rate)?;
    renderer.render_with_effects(&note, &request.instrument, request.pan, &request.effects)
}

/// Chord frequencies from names, e.g. `("Bb", 2, "major", "just")`.
pub fn named_chord(root: &str, octave: i32, chord: &str, intonation: &str) -> Result<Vec<f64>> {
    let root: Pitch = root.parse()?;
    let chord: ChordType = chord.parse()?;
    let intonation: Intonation = intonation.parse()?;
    Ok(PitchTable::default().chord(root, octave, chord, intonation))
}

/// Major scale frequencies on a named root.
pub fn named_scale(root: &str, lowest_octave: i32, highest_octave: i32) -> Result<Vec<f64>> {
    let root: Pitch = root.parse()?;
    Ok(PitchTable::default().scale(root, lowest_octave, Some(highest_octave)))
}

fn to_js(e: SynthError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: render one note to interleaved stereo f32 samples.
/// Accepts a `NoteRequest`-shaped object.
#[wasm_bindgen]
pub fn render_note_samples(request: JsValue) -> std::result::Result<Vec<f32>, JsValue> {
    let request: NoteRequest =
        serde_wasm_bindgen::from_value(request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    render_request(&request).map(|buffer| buffer.samples).map_err(to_js)
}

/// WASM-exposed: frequencies of a named chord.
#[wasm_bindgen]
pub fn chord_frequencies(
    root: &str,
    octave: i32,
    chord: &str,
    intonation: &str,
) -> std::result::Result<Vec<f64>, JsValue> {
    named_chord(root, octave, chord, intonation).map_err(to_js)
}

/// WASM-exposed: major scale from `lowest_octave` through `highest_octave`.
#[wasm_bindgen]
pub fn scale_frequencies(
    root: &str,
    lowest_octave: i32,
    highest_octave: i32,
) -> std::result::Result<Vec<f64>, JsValue> {
    named_scale(root, lowest_octave, highest_octave).map_err(to_js)
}

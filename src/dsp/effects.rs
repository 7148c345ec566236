//! Buffer effects applied after rendering and before playback.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SynthError};

use super::chorus::StereoChorus;
use super::delay::StereoEcho;
use super::renderer::RenderedBuffer;

/// One in-place effect with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    StereoEcho(StereoEcho),
    StereoChorus(StereoChorus),
}

impl Effect {
    pub fn apply(&self, buffer: &mut RenderedBuffer) {
        match self {
            Effect::StereoEcho(echo) => echo.process(buffer),
            Effect::StereoChorus(chorus) => chorus.process(buffer),
        }
    }

    /// Check parameters that deserialization may have let through.
    /// The chorus shift is a frame count, so any value is usable.
    pub fn validate(&self) -> Result<()> {
        match self {
            Effect::StereoEcho(echo) => echo.validate(),
            Effect::StereoChorus(_) => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::StereoEcho(_) => "stereo_echo",
            Effect::StereoChorus(_) => "stereo_chorus",
        }
    }
}

impl FromStr for Effect {
    type Err = SynthError;

    /// An effect with default parameters, by name.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stereo_echo" | "echo" => Ok(Effect::StereoEcho(StereoEcho::default())),
            "stereo_chorus" | "chorus" => Ok(Effect::StereoChorus(StereoChorus::default())),
            _ => Err(SynthError::invalid("effect", format!("'{s}' is not an effect"))),
        }
    }
}

/// Ordered list of effects, applied first to last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectChain(pub Vec<Effect>);

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain of default-parameter effects from their names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>>>()
            .map(EffectChain)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let chain: EffectChain = serde_json::from_str(json)?;
        chain.validate()?;
        Ok(chain)
    }

    pub fn validate(&self) -> Result<()> {
        self.0.iter().try_for_each(Effect::validate)
    }

    pub fn with(mut self, effect: Effect) -> Self {
        self.0.push(effect);
        self
    }

    pub fn push(&mut self, effect: Effect) {
        self.0.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Run every effect over `buffer`, in order.
    pub fn apply(&self, buffer: &mut RenderedBuffer) {
        for effect in &self.0 {
            debug!(effect = effect.name(), frames = buffer.frames(), "applying effect");
            effect.apply(buffer);
        }
    }
}

impl From<Vec<Effect>> for EffectChain {
    fn from(effects: Vec<Effect>) -> Self {
        EffectChain(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_to_default_effects() {
        let chain = EffectChain::from_names(&["echo", "stereo_chorus"]).unwrap();
        assert_eq!(
            chain,
            EffectChain(vec![
                Effect::StereoEcho(StereoEcho::default()),
                Effect::StereoChorus(StereoChorus::default()),
            ])
        );
    }

    #[test]
    fn unknown_effect_is_rejected() {
        let err = EffectChain::from_names(&["echo", "reverb"]).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(format!("{err}").contains("reverb"));
    }

    #[test]
    fn chain_from_json() {
        let chain = EffectChain::from_json(
            r#"[ { "type": "stereo_echo", "step": 0.8, "decay": 0.3 },
                 { "type": "stereo_chorus" } ]"#,
        )
        .unwrap();
        assert_eq!(chain.len(), 2);
        match chain.0[0] {
            Effect::StereoEcho(echo) => {
                assert_eq!(echo.step, 0.8);
                assert_eq!(echo.amplitude, 0.5);
                assert_eq!(echo.reflections, 5);
            }
            other => panic!("expected echo, got {other:?}"),
        }
        assert!(EffectChain::from_json(r#"[ { "type": "flanger" } ]"#).is_err());
    }

    #[test]
    fn chain_from_json_rejects_bad_parameters() {
        let err = EffectChain::from_json(r#"[ { "type": "stereo_echo", "step": -1 } ]"#).unwrap_err();
        assert!(err.is_invalid_argument(), "{err}");
        assert!(
            EffectChain::from_json(r#"[ { "type": "stereo_chorus" }, { "type": "stereo_echo", "decay": 1e400 } ]"#)
                .is_err()
        );
    }

    #[test]
    fn effects_apply_in_order() {
        // Echo first, then chorus: the chorus shifts the echo's left-channel
        // reflection 100 frames later.
        let mut a = RenderedBuffer::silent(1_000, 1_000);
        a.samples[0] = 1.0;
        let echo = Effect::StereoEcho(StereoEcho {
            step: 0.2,
            ..StereoEcho::default()
        });
        let chorus = Effect::StereoChorus(StereoChorus::default());

        let mut b = a.clone();
        EffectChain(vec![echo, chorus]).apply(&mut a);
        EffectChain(vec![chorus, echo]).apply(&mut b);

        assert_eq!(a.frame(0).0, 1.0, "left head is kept");
        assert_eq!(a.frame(100).0, 1.0);
        assert_eq!(a.frame(200).0, 0.0);
        assert_eq!(a.frame(300).0, 0.25);
        assert_eq!(b.frame(200).0, 0.25);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_chain_is_identity() {
        let mut buffer = RenderedBuffer::silent(10, 100);
        buffer.samples[3] = 0.5;
        let before = buffer.clone();
        EffectChain::new().apply(&mut buffer);
        assert_eq!(buffer, before);
    }
}

//! Engine configuration.
//!
//! Everything the host hands the core before the first note is rendered:
//! output sample rate, starting tempo and the reference tuning. Missing
//! fields fall back to their defaults, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// Reference tuning for the pitch table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Frequency of A in the reference octave (Hz).
    pub reference_frequency: f64,
    /// Octave number of the reference A.
    pub reference_octave: i32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            reference_frequency: 440.0,
            reference_octave: 4,
        }
    }
}

/// Top-level configuration for a synthesis session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Initial tempo in beats per minute.
    pub bpm: f64,
    pub tuning: TuningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 48_000,
            bpm: 120.0,
            tuning: TuningConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Decode and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SynthError::invalid("sample rate", "must be positive"));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(SynthError::invalid("tempo", format!("{} bpm must be positive", self.bpm)));
        }
        if !(self.tuning.reference_frequency.is_finite() && self.tuning.reference_frequency > 0.0) {
            return Err(SynthError::invalid(
                "reference frequency",
                format!("{} Hz must be positive", self.tuning.reference_frequency),
            ));
        }
        Ok(())
    }
}

//! ADSR envelope as a pure function of time.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// ADSR envelope with linear attack, decay and release ramps.
///
/// A zero-length phase is skipped outright: its ramp formula is never
/// evaluated, so there is no division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            attack: 0.05,
            decay: 0.0,
            sustain: 1.0,
            release: 0.05,
        }
    }
}

impl Envelope {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Result<Self> {
        let envelope = Envelope {
            attack,
            decay,
            sustain,
            release,
        };
        envelope.validate()?;
        Ok(envelope)
    }

    /// Check the invariants that deserialized envelopes may have skipped.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SynthError::invalid(
                    "envelope",
                    format!("{name} {value} s must be a non-negative time"),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(SynthError::invalid(
                "envelope",
                format!("sustain {} must lie in [0, 1]", self.sustain),
            ));
        }
        Ok(())
    }

    /// Attack/decay/sustain level at `t`, ignoring release.
    fn held_level(&self, t: f64) -> f64 {
        if t < self.attack {
            return t / self.attack;
        }
        let into_decay = t - self.attack;
        if into_decay < self.decay {
            return 1.0 + (self.sustain - 1.0) * (into_decay / self.decay);
        }
        self.sustain
    }

    /// Gain at `t` seconds into a note held for `duration` seconds.
    ///
    /// Release starts at `duration` and ramps linearly from the level
    /// reached at that moment down to silence at `duration + release`.
    pub fn value(&self, t: f64, duration: f64) -> f64 {
        if t < 0.0 || t >= duration + self.release {
            return 0.0;
        }
        if t < duration {
            return self.held_level(t);
        }
        let into_release = t - duration;
        self.held_level(duration) * (1.0 - into_release / self.release)
    }

    /// Time at which a note held for `duration` falls silent.
    pub fn end_time(&self, duration: f64) -> f64 {
        duration + self.release
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn shaped() -> Envelope {
        Envelope::new(0.1, 0.1, 0.5, 0.1).unwrap()
    }

    #[test]
    fn silent_at_start_with_attack() {
        assert_eq!(shaped().value(0.0, 1.0), 0.0);
    }

    #[test]
    fn silent_at_end_of_release() {
        let env = shaped();
        assert_eq!(env.value(1.0 + env.release, 1.0), 0.0);
        assert_eq!(env.value(5.0, 1.0), 0.0);
        assert_eq!(env.value(-0.01, 1.0), 0.0);
    }

    #[test]
    fn phase_values() {
        let env = shaped();
        assert!(approx_eq!(f64, env.value(0.05, 1.0), 0.5, ulps = 2));
        assert!(approx_eq!(f64, env.value(0.1, 1.0), 1.0, ulps = 2));
        assert!(approx_eq!(f64, env.value(0.15, 1.0), 0.75, epsilon = 1e-12));
        assert_eq!(env.value(0.5, 1.0), 0.5);
        assert!(approx_eq!(f64, env.value(1.05, 1.0), 0.25, epsilon = 1e-12));
    }

    #[test]
    fn continuous_at_phase_boundaries() {
        let env = shaped();
        let duration = 1.0;
        let eps = 1e-9;
        for boundary in [0.1, 0.2, duration, duration + 0.1] {
            let before = env.value(boundary - eps, duration);
            let after = env.value(boundary + eps, duration);
            assert!(
                (before - after).abs() < 1e-6,
                "jump at {boundary}: {before} -> {after}"
            );
        }
    }

    #[test]
    fn stays_in_unit_range() {
        let env = Envelope::new(0.01, 0.05, 0.3, 0.2).unwrap();
        for i in 0..20_000 {
            let v = env.value(i as f64 / 10_000.0, 0.5);
            assert!((0.0..=1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn zero_length_phases_are_instant() {
        let env = Envelope::new(0.0, 0.0, 0.6, 0.0).unwrap();
        assert_eq!(env.value(0.0, 1.0), 0.6);
        assert_eq!(env.value(0.999, 1.0), 0.6);
        assert_eq!(env.value(1.0, 1.0), 0.0);
        for i in 0..2000 {
            assert!(env.value(i as f64 / 1000.0, 1.0).is_finite());
        }

        let no_decay = Envelope::new(0.1, 0.0, 0.4, 0.1).unwrap();
        assert!(approx_eq!(f64, no_decay.value(0.05, 1.0), 0.5, ulps = 2));
        assert_eq!(no_decay.value(0.1, 1.0), 0.4);
    }

    #[test]
    fn release_before_attack_finishes() {
        let env = Envelope::new(1.0, 0.0, 1.0, 0.5).unwrap();
        // Released at 0.2 s, while still at 20 % of the attack ramp.
        assert!(approx_eq!(f64, env.value(0.2, 0.2), 0.2, ulps = 2));
        assert!(approx_eq!(f64, env.value(0.45, 0.2), 0.1, epsilon = 1e-12));
    }

    #[test]
    fn default_envelope() {
        let env = Envelope::default();
        assert_eq!(env.attack, 0.05);
        assert_eq!(env.decay, 0.0);
        assert_eq!(env.sustain, 1.0);
        assert_eq!(env.release, 0.05);
        assert!(env.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(Envelope::new(-0.1, 0.0, 1.0, 0.0).unwrap_err().is_invalid_argument());
        assert!(Envelope::new(0.0, f64::NAN, 1.0, 0.0).is_err());
        assert!(Envelope::new(0.0, 0.0, 1.5, 0.0).is_err());
        assert!(Envelope::new(0.0, 0.0, 0.5, -1.0).is_err());
    }
}

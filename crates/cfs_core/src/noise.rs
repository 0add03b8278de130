//! Observation noise applied to finished feature vectors.

use rand::Rng;
use rand_distr::StandardNormal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoiseFunction {
    #[default]
    None,
    /// Multiplicative noise: `x * (1 + g)`, `g` normal around 0 with sigma
    /// `|amplitude| / 3`, clamped to `+-|amplitude|`. A non-finite amplitude
    /// disables the noise.
    Gaussian { amplitude: f32 },
}

impl NoiseFunction {
    pub fn gaussian(amplitude: f32) -> Self {
        NoiseFunction::Gaussian { amplitude }
    }

    pub fn is_active(&self) -> bool {
        match self {
            NoiseFunction::None => false,
            NoiseFunction::Gaussian { amplitude } => *amplitude != 0.0 && amplitude.is_finite(),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, value: f32, rng: &mut R) -> f32 {
        match self {
            NoiseFunction::None => value,
            NoiseFunction::Gaussian { amplitude } => {
                let amp = amplitude.abs();
                if amp == 0.0 || !amp.is_finite() {
                    return value;
                }
                value * (1.0 + clamped_gaussian(-amp, amp, rng))
            }
        }
    }

    pub fn apply_in_place<R: Rng + ?Sized>(&self, values: &mut [f32], rng: &mut R) {
        if !self.is_active() {
            return;
        }
        for v in values.iter_mut() {
            *v = self.apply(*v, rng);
        }
    }
}

/// Normal sample centred between `min` and `max`, clamped by the three-sigma
/// rule.
pub fn clamped_gaussian<R: Rng + ?Sized>(min: f32, max: f32, rng: &mut R) -> f32 {
    let std: f32 = rng.sample(StandardNormal);
    let mean = (min + max) / 2.0;
    let sigma = (max - mean) / 3.0;
    (std * sigma + mean).clamp(min, max)
}

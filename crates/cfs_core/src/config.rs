//! # Encoder configuration
//!
//! Runtime knobs that sit outside a definition: observation noise, colour
//! instance noise at spawn, and the RNG seed.
//!
//! ```rust
//! use cfs_core::config::EncoderConfig;
//!
//! let config = EncoderConfig::default();
//! let reproducible = EncoderConfig::deterministic();
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::definition::FeatureVectorDefinition;
use crate::noise::NoiseFunction;
use crate::provider::PropertyProvider;
use crate::requester::PropertyRequester;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncoderConfig {
    /// Noise applied to every requested feature vector
    pub noise: NoiseFunction,
    /// Re-draw colour instance noise when a provider is spawned
    pub color_instance_noise: bool,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { noise: NoiseFunction::None, color_instance_noise: true, seed: None }
    }
}

impl EncoderConfig {
    /// No noise of any kind, fixed seed. For tests and reference dumps.
    pub fn deterministic() -> Self {
        Self { noise: NoiseFunction::None, color_instance_noise: false, seed: Some(0) }
    }

    pub fn noisy(amplitude: f32) -> Self {
        Self { noise: NoiseFunction::gaussian(amplitude), ..Self::default() }
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn requester(&self, definition: Arc<FeatureVectorDefinition>) -> PropertyRequester {
        PropertyRequester::new(definition).with_noise(self.noise)
    }

    /// Copy of `provider` for a newly spawned entity.
    pub fn spawn<R: rand::Rng + ?Sized>(
        &self,
        provider: &PropertyProvider,
        rng: &mut R,
    ) -> PropertyProvider {
        if self.color_instance_noise {
            provider.spawn(rng)
        } else {
            provider.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyValue, Rgba};
    use crate::settings::PropertySettings;
    use rand::Rng;

    fn tinted() -> (FeatureVectorDefinition, PropertyProvider) {
        let def = FeatureVectorDefinition::new()
            .with_property("color", PropertySettings::color(Rgba::BLACK, false));
        let mut provider = PropertyProvider::new(&def);
        provider
            .set_property(
                &def,
                "color",
                PropertyValue::color(Rgba::rgb(1.0, 0.0, 0.0)).with_instance_noise(0.2),
            )
            .unwrap();
        (def, provider)
    }

    #[test]
    fn test_default_config() {
        let cfg = EncoderConfig::default();
        assert_eq!(cfg.noise, NoiseFunction::None);
        assert!(cfg.color_instance_noise);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let cfg = EncoderConfig::deterministic();
        let a: u64 = cfg.rng().gen();
        let b: u64 = cfg.rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_noisy_preset() {
        let cfg = EncoderConfig::noisy(0.1);
        assert_eq!(cfg.noise, NoiseFunction::gaussian(0.1));
        assert!(cfg.noise.is_active());
        assert!(!EncoderConfig::deterministic().noise.is_active());
    }

    #[test]
    fn test_spawn_respects_color_noise_flag() {
        let (_, provider) = tinted();

        let cfg = EncoderConfig::deterministic();
        let mut rng = cfg.rng();
        assert_eq!(cfg.spawn(&provider, &mut rng), provider);

        let cfg = EncoderConfig { seed: Some(3), ..EncoderConfig::default() };
        let mut rng = cfg.rng();
        let spawned = cfg.spawn(&provider, &mut rng);
        assert_eq!(spawned.definition_id(), provider.definition_id());
        assert_ne!(spawned.get("color"), provider.get("color"));
    }

    #[test]
    fn test_requester_carries_noise() {
        let (def, _) = tinted();
        let requester = EncoderConfig::noisy(0.3).requester(Arc::new(def));
        assert_eq!(requester.noise(), NoiseFunction::gaussian(0.3));
        assert_eq!(requester.feature_length(), 3);
    }

    #[test]
    fn test_config_from_partial_yaml() {
        let cfg: EncoderConfig = serde_yaml::from_str(
            "noise:\n  type: gaussian\n  amplitude: 0.05\nseed: 7\n",
        )
        .unwrap();
        assert_eq!(cfg.noise, NoiseFunction::gaussian(0.05));
        assert_eq!(cfg.seed, Some(7));
        assert!(cfg.color_instance_noise);
    }
}

//! Consumer-side access to feature vectors.

use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::definition::FeatureVectorDefinition;
use crate::error::Result;
use crate::noise::NoiseFunction;
use crate::provider::PropertyProvider;

/// Produces fixed-width feature vectors for one definition, whatever the
/// entity in front of it carries.
#[derive(Debug, Clone)]
pub struct PropertyRequester {
    definition: Arc<FeatureVectorDefinition>,
    noise: NoiseFunction,
}

impl PropertyRequester {
    pub fn new(definition: Arc<FeatureVectorDefinition>) -> Self {
        Self { definition, noise: NoiseFunction::None }
    }

    pub fn with_noise(mut self, noise: NoiseFunction) -> Self {
        self.noise = noise;
        self
    }

    pub fn definition(&self) -> &FeatureVectorDefinition {
        &self.definition
    }

    pub fn noise(&self) -> NoiseFunction {
        self.noise
    }

    pub fn feature_length(&self) -> usize {
        self.definition.total_length()
    }

    /// Feature vector of an entity. Entities without a provider, or with a
    /// provider of another definition, get the default vector.
    pub fn request<R: Rng + ?Sized>(
        &self,
        provider: Option<&PropertyProvider>,
        rng: &mut R,
    ) -> Result<Vec<f32>> {
        let mut out = match provider {
            Some(p) => p.feature_vector(&self.definition)?,
            None => {
                debug!("entity has no property provider, using default vector");
                self.definition.default_vector()
            }
        };
        self.noise.apply_in_place(&mut out, rng);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyKind, PropertyValue};
    use crate::settings::PropertySettings;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn definition() -> Arc<FeatureVectorDefinition> {
        Arc::new(
            FeatureVectorDefinition::new()
                .with_property(
                    "speed",
                    PropertySettings::new(PropertyKind::Float)
                        .with_default(PropertyValue::float(2.0)),
                )
                .with_property(
                    "hist",
                    PropertySettings::new(PropertyKind::FloatList).with_array_length(2),
                ),
        )
    }

    #[test]
    fn test_missing_provider_uses_defaults() {
        let def = definition();
        let requester = PropertyRequester::new(def.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(requester.request(None, &mut rng).unwrap(), vec![2.0, 0.0, 0.0]);
        assert_eq!(requester.feature_length(), 3);
    }

    #[test]
    fn test_foreign_provider_uses_defaults() {
        let def = definition();
        let other = definition();
        let mut provider = PropertyProvider::new(&other);
        provider.set_property(&other, "speed", PropertyValue::float(9.0)).unwrap();

        let requester = PropertyRequester::new(def);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(requester.request(Some(&provider), &mut rng).unwrap(), vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_noise_keeps_length() {
        let def = definition();
        let mut provider = PropertyProvider::new(&def);
        provider.set_property(&def, "speed", PropertyValue::float(5.0)).unwrap();

        let requester = PropertyRequester::new(def).with_noise(NoiseFunction::gaussian(0.5));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let v = requester.request(Some(&provider), &mut rng).unwrap();
        assert_eq!(v.len(), 3);
        assert!((2.5..=7.5).contains(&v[0]));
        assert_eq!(&v[1..], &[0.0, 0.0]);
    }
}

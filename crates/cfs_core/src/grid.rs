//! Feature grids: per-pixel feature vectors from an object-id image.
//!
//! ## Layout
//! ```text
//! shape  = [height, width, L]        L = definition.total_length()
//! offset = (row * width + col) * L   rows top to bottom
//! ```
//!
//! Each distinct id is encoded once per call. Background pixels and ids
//! without a provider take the definition's default vector.

use rand::Rng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{FeatureError, Result};
use crate::object_id::{ObjectId, BACKGROUND_ID};
use crate::provider::PropertyProvider;
use crate::requester::PropertyRequester;

/// Resolves object ids to their property providers.
pub trait ProviderLookup {
    fn provider(&self, id: ObjectId) -> Option<&PropertyProvider>;
}

impl ProviderLookup for HashMap<ObjectId, PropertyProvider> {
    fn provider(&self, id: ObjectId) -> Option<&PropertyProvider> {
        self.get(&id)
    }
}

pub struct FeatureGridEncoder {
    requester: PropertyRequester,
    width: usize,
    height: usize,
}

impl FeatureGridEncoder {
    pub fn new(requester: PropertyRequester, width: usize, height: usize) -> Self {
        Self { requester, width, height }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, self.requester.feature_length()]
    }

    pub fn requester(&self) -> &PropertyRequester {
        &self.requester
    }

    /// Encodes an id image (`width * height` ids, row-major) into a flat
    /// `[height, width, L]` tensor.
    pub fn encode<L, R>(&self, ids: &[ObjectId], lookup: &L, rng: &mut R) -> Result<Vec<f32>>
    where
        L: ProviderLookup + ?Sized,
        R: Rng + ?Sized,
    {
        let pixels = self.width * self.height;
        if ids.len() != pixels {
            return Err(FeatureError::GridSizeMismatch { expected: pixels, found: ids.len() });
        }

        let depth = self.requester.feature_length();
        let mut vectors: HashMap<ObjectId, Vec<f32>> = HashMap::new();
        let mut out = Vec::with_capacity(pixels * depth);

        for &id in ids {
            let vector = match vectors.entry(id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let provider = if id == BACKGROUND_ID { None } else { lookup.provider(id) };
                    e.insert(self.requester.request(provider, rng)?)
                }
            };
            out.extend_from_slice(vector);
        }

        tracing::debug!(
            width = self.width,
            height = self.height,
            depth,
            distinct_ids = vectors.len(),
            "encoded feature grid"
        );
        Ok(out)
    }
}

//! Per-entity property values and feature vector assembly.
//!
//! A provider is bound to one definition (by id) and owns its values. Keys
//! are restricted to the definition's properties; every value stored is
//! shaped by the matching settings, so each slice of the vector has the
//! length the definition promises.

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::debug_flags::encoding_debug_enabled;
use crate::definition::FeatureVectorDefinition;
use crate::error::{FeatureError, Result};
use crate::property::PropertyValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PropertyProvider {
    definition_id: Uuid,
    #[serde(default)]
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyProvider {
    /// Empty provider; every slot encodes to its default.
    pub fn new(definition: &FeatureVectorDefinition) -> Self {
        Self { definition_id: definition.id(), values: BTreeMap::new() }
    }

    pub fn definition_id(&self) -> Uuid {
        self.definition_id
    }

    pub fn belongs_to(&self, definition: &FeatureVectorDefinition) -> bool {
        self.definition_id == definition.id()
    }

    /// Binds the provider to another definition, dropping all values.
    pub fn rebind(&mut self, definition: &FeatureVectorDefinition) {
        self.definition_id = definition.id();
        self.values.clear();
    }

    /// Stores `value` under `name`, shaped by the definition's settings.
    ///
    /// A value of the wrong kind is ignored (`Ok(false)`); a name the
    /// definition does not know is an error.
    pub fn set_property(
        &mut self,
        definition: &FeatureVectorDefinition,
        name: &str,
        mut value: PropertyValue,
    ) -> Result<bool> {
        if !self.belongs_to(definition) {
            return Err(FeatureError::DefinitionMismatch {
                expected: self.definition_id,
                found: definition.id(),
            });
        }
        let settings = definition
            .settings(name)
            .ok_or_else(|| FeatureError::UnknownProperty { name: name.to_string() })?;

        if settings.kind() != value.kind() {
            warn!(
                property = name,
                expected = %settings.kind(),
                found = %value.kind(),
                "ignoring property value of the wrong kind"
            );
            return Ok(false);
        }

        value.apply_settings(settings);
        self.values.insert(name.to_string(), value);
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Mutable access for in-place updates. Changing the shape of a value
    /// here (e.g. resizing a list) is caught when the vector is built.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.values.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Re-applies the definition's settings to every value after the
    /// definition changed. Values without a matching entry are dropped.
    pub fn refresh(&mut self, definition: &FeatureVectorDefinition) {
        if !self.belongs_to(definition) {
            warn!(
                provider_definition = %self.definition_id,
                definition = %definition.id(),
                "refresh skipped: provider is bound to another definition"
            );
            return;
        }

        self.values.retain(|name, value| match definition.settings(name) {
            Some(settings) => value.apply_settings(settings),
            None => {
                warn!(property = name.as_str(), "dropping property removed from definition");
                false
            }
        });
    }

    /// Spawn-time copy for a new entity: values are deep copied and colour
    /// instance noise is drawn afresh.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut copy = self.clone();
        for value in copy.values.values_mut() {
            value.apply_instance_noise(rng);
        }
        copy
    }

    /// Builds the feature vector for `definition`.
    pub fn feature_vector(&self, definition: &FeatureVectorDefinition) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(definition.total_length());
        self.write_feature_vector(definition, &mut out)?;
        Ok(out)
    }

    /// Appends the feature vector to `out`. On error `out` is restored to
    /// its previous length.
    ///
    /// A provider bound to another definition yields the definition's
    /// default vector.
    pub fn write_feature_vector(
        &self,
        definition: &FeatureVectorDefinition,
        out: &mut Vec<f32>,
    ) -> Result<()> {
        if !self.belongs_to(definition) {
            debug!(
                provider_definition = %self.definition_id,
                definition = %definition.id(),
                "definitions differ, using default vector"
            );
            out.extend(definition.default_vector());
            return Ok(());
        }

        let base = out.len();
        out.reserve(definition.total_length());
        let trace_slots = encoding_debug_enabled();

        for (name, settings) in definition.iter() {
            let start = out.len();
            match self.values.get(name) {
                Some(value) if value.kind() == settings.kind() => value.encode_into(out),
                Some(value) => {
                    warn!(
                        property = name,
                        expected = %settings.kind(),
                        found = %value.kind(),
                        "stored value has the wrong kind, using default"
                    );
                    settings.default_value().encode_into(out);
                }
                None => settings.default_value().encode_into(out),
            }

            let expected = settings.encoded_length();
            let found = out.len() - start;
            if found != expected {
                out.truncate(base);
                return Err(FeatureError::LengthDrift { name: name.to_string(), expected, found });
            }
            if trace_slots {
                trace!(property = name, offset = start - base, values = ?&out[start..], "slot");
            }
        }
        Ok(())
    }
}

//! Per-property settings: kind, configured length and default value.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FeatureError, Result};
use crate::property::{PropertyKind, PropertyValue, Rgba};

/// Describes one named property of a feature vector definition.
///
/// The default value is used whenever an entity does not carry the property.
/// After construction and after every edit through the definition,
/// `encoded_length() == default_value().encoded_length()` holds.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PropertySettings {
    kind: PropertyKind,
    /// Configured length for list and categorical kinds; ignored otherwise.
    /// Documents that leave it out take the default value's length.
    #[serde(default)]
    array_length: usize,
    default_value: PropertyValue,
}

/// On-disk shape of [`PropertySettings`], with the length optional.
#[derive(Deserialize)]
struct SettingsFields {
    kind: PropertyKind,
    #[serde(default)]
    array_length: Option<usize>,
    default_value: PropertyValue,
}

impl<'de> Deserialize<'de> for PropertySettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let SettingsFields { kind, array_length, default_value } =
            SettingsFields::deserialize(deserializer)?;
        let array_length = match array_length {
            Some(len) => len,
            None if kind.is_list() => default_value.encoded_length(),
            None => 0,
        };
        Ok(Self { kind, array_length, default_value })
    }
}

impl PropertySettings {
    /// Settings with the zero default of `kind`.
    pub fn new(kind: PropertyKind) -> Self {
        Self { kind, array_length: 0, default_value: PropertyValue::zero(kind) }
    }

    /// Settings whose kind and length are taken from `default_value`.
    pub fn from_default(default_value: PropertyValue) -> Self {
        let kind = default_value.kind();
        let array_length = if kind.is_list() { default_value.encoded_length() } else { 0 };
        Self { kind, array_length, default_value }
    }

    pub fn one_hot(code_book: Vec<String>) -> Self {
        Self::from_default(PropertyValue::one_hot::<String>(code_book, None))
    }

    pub fn multi_hot(code_book: Vec<String>) -> Self {
        Self::from_default(PropertyValue::multi_hot(code_book, Vec::new()))
    }

    pub fn color(default: Rgba, use_alpha: bool) -> Self {
        let value = if use_alpha {
            PropertyValue::color_with_alpha(default)
        } else {
            PropertyValue::color(default)
        };
        Self::from_default(value)
    }

    pub fn with_array_length(mut self, len: usize) -> Self {
        self.set_array_length(len);
        self
    }

    /// Replaces the default. A default of another kind is ignored.
    pub fn with_default(mut self, value: PropertyValue) -> Self {
        self.set_default(value);
        self
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn array_length(&self) -> usize {
        self.array_length
    }

    pub fn default_value(&self) -> &PropertyValue {
        &self.default_value
    }

    pub fn set_array_length(&mut self, len: usize) {
        self.array_length = len;
        self.sync();
    }

    /// Returns `false` if `value` is of another kind; the settings are then
    /// unchanged.
    pub fn set_default(&mut self, value: PropertyValue) -> bool {
        if value.kind() != self.kind {
            tracing::warn!(
                settings_kind = %self.kind,
                value_kind = %value.kind(),
                "rejecting default value of another property kind"
            );
            return false;
        }
        self.default_value = value;
        self.sync();
        true
    }

    /// Re-applies the configured length to the default value.
    pub fn sync(&mut self) {
        if self.kind.is_list() {
            self.default_value.resize(self.array_length);
        }
    }

    /// Length of this property's slice in the feature vector.
    pub fn encoded_length(&self) -> usize {
        if self.kind.is_list() {
            self.array_length
        } else {
            self.default_value.encoded_length()
        }
    }

    pub fn default_vector(&self) -> Vec<f32> {
        self.default_value.encode()
    }

    /// Checks that the default matches the declared kind, reporting `name`.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.default_value.kind() != self.kind {
            return Err(FeatureError::SettingsKindMismatch {
                name: name.to_string(),
                expected: self.kind,
                found: self.default_value.kind(),
            });
        }
        Ok(())
    }
}

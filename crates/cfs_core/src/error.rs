use thiserror::Error;
use uuid::Uuid;

use crate::property::PropertyKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("No settings entry for property '{name}'")]
    UnknownProperty { name: String },

    #[error("Property '{name}' is defined more than once")]
    DuplicateProperty { name: String },

    #[error("Settings for '{name}' declare {expected} but the default value is {found}")]
    SettingsKindMismatch { name: String, expected: PropertyKind, found: PropertyKind },

    #[error("Provider belongs to definition {found}, expected {expected}")]
    DefinitionMismatch { expected: Uuid, found: Uuid },

    #[error("Encoded length of '{name}' drifted: settings say {expected}, value produced {found}")]
    LengthDrift { name: String, expected: usize, found: usize },

    #[error("Id image has {found} pixels, expected {expected}")]
    GridSizeMismatch { expected: usize, found: usize },

    #[error("Unsupported definition schema version: found {found}, expected {expected}")]
    UnsupportedSchemaVersion { found: u32, expected: u32 },
}

impl FeatureError {
    /// Errors caused by an inconsistent definition or a caller addressing a
    /// property the definition does not know.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            FeatureError::UnknownProperty { .. } => true,
            FeatureError::DuplicateProperty { .. } => true,
            FeatureError::SettingsKindMismatch { .. } => true,
            FeatureError::UnsupportedSchemaVersion { .. } => true,
            FeatureError::DefinitionMismatch { .. } => true,
            FeatureError::LengthDrift { .. } => false,
            FeatureError::GridSizeMismatch { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;

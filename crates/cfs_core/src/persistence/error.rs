use thiserror::Error;

use crate::error::FeatureError;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    #[error("Bundle declares {size} bytes of document data, limit is {limit}")]
    DataTooLarge { size: usize, limit: usize },

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Unsupported document format: {path}")]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

impl BundleError {
    /// Damaged or foreign bytes, as opposed to an environment problem.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            BundleError::Decode(_)
                | BundleError::Decompression
                | BundleError::ChecksumMismatch { .. }
                | BundleError::DataTooLarge { .. }
        )
    }
}

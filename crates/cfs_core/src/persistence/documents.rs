//! Human-editable JSON and YAML documents, format picked by file extension.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::BundleError;
use crate::config::EncoderConfig;
use crate::definition::{DefinitionDocument, FeatureVectorDefinition};
use crate::provider::PropertyProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, BundleError> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            _ => Err(BundleError::UnsupportedFormat { path: path.display().to_string() }),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, BundleError> {
        Ok(match self {
            DocumentFormat::Json => serde_json::from_str(text)?,
            DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String, BundleError> {
        Ok(match self {
            DocumentFormat::Json => serde_json::to_string_pretty(value)?,
            DocumentFormat::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, BundleError> {
    let format = DocumentFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, bytes = text.len(), "loading document");
    format.parse(&text)
}

pub fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<(), BundleError> {
    let format = DocumentFormat::from_path(path)?;
    let text = format.render(value)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    debug!(path = %path.display(), ?format, "saved document");
    Ok(())
}

/// Loads a definition; inconsistent settings surface as
/// [`BundleError::Feature`].
pub fn load_definition(path: &Path) -> Result<FeatureVectorDefinition, BundleError> {
    let document: DefinitionDocument = load_document(path)?;
    Ok(FeatureVectorDefinition::from_document(document)?)
}

pub fn load_provider(path: &Path) -> Result<PropertyProvider, BundleError> {
    load_document(path)
}

pub fn load_config(path: &Path) -> Result<EncoderConfig, BundleError> {
    load_document(path)
}

//! Binary definition bundles.
//!
//! ```text
//! payload  = lz4(size-prepended, msgpack(DefinitionDocument))
//! checksum = hex(sha256(payload))
//! file     = msgpack(DefinitionBundle { format_version, checksum, created_at, payload })
//! ```

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::error::BundleError;
use super::{BUNDLE_FORMAT_VERSION, MAX_DOCUMENT_SIZE};
use crate::definition::{DefinitionDocument, FeatureVectorDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionBundle {
    pub format_version: u32,
    /// SHA-256 of `payload`, lowercase hex
    pub checksum: String,
    /// RFC 3339
    pub created_at: String,
    pub payload: Vec<u8>,
}

/// Summary of a packed bundle, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub checksum: String,
    pub created_at: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub property_count: usize,
    pub total_length: usize,
}

impl DefinitionBundle {
    pub fn verify(&self) -> Result<(), BundleError> {
        let found = checksum_hex(&self.payload);
        if found != self.checksum {
            return Err(BundleError::ChecksumMismatch { expected: self.checksum.clone(), found });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, BundleError> {
        Ok(to_vec_named(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BundleError> {
        Ok(from_slice(bytes)?)
    }
}

fn checksum_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn pack_definition(
    definition: &FeatureVectorDefinition,
) -> Result<(DefinitionBundle, BundleMetadata), BundleError> {
    let msgpack = to_vec_named(&definition.to_document())?;
    let payload = compress_prepend_size(&msgpack);
    let checksum = checksum_hex(&payload);
    let created_at = chrono::Utc::now().to_rfc3339();

    let metadata = BundleMetadata {
        checksum: checksum.clone(),
        created_at: created_at.clone(),
        original_size: msgpack.len() as u64,
        compressed_size: payload.len() as u64,
        property_count: definition.len(),
        total_length: definition.total_length(),
    };
    debug!(
        definition = %definition.id(),
        original = metadata.original_size,
        compressed = metadata.compressed_size,
        "packed definition"
    );

    let bundle =
        DefinitionBundle { format_version: BUNDLE_FORMAT_VERSION, checksum, created_at, payload };
    Ok((bundle, metadata))
}

pub fn unpack_definition(bundle: &DefinitionBundle) -> Result<FeatureVectorDefinition, BundleError> {
    if bundle.format_version != BUNDLE_FORMAT_VERSION {
        return Err(BundleError::VersionMismatch {
            found: bundle.format_version,
            expected: BUNDLE_FORMAT_VERSION,
        });
    }
    bundle.verify()?;

    let declared = declared_size(&bundle.payload)?;
    if declared > MAX_DOCUMENT_SIZE {
        return Err(BundleError::DataTooLarge { size: declared, limit: MAX_DOCUMENT_SIZE });
    }
    let msgpack =
        decompress_size_prepended(&bundle.payload).map_err(|_| BundleError::Decompression)?;
    let document: DefinitionDocument = from_slice(&msgpack)?;
    Ok(FeatureVectorDefinition::from_document(document)?)
}

/// Uncompressed size from the little-endian `u32` header of an LZ4 payload.
fn declared_size(payload: &[u8]) -> Result<usize, BundleError> {
    let header: [u8; 4] = payload
        .get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BundleError::Decompression)?;
    Ok(u32::from_le_bytes(header) as usize)
}

pub fn write_bundle(path: &Path, bundle: &DefinitionBundle) -> Result<(), BundleError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bundle.to_bytes()?)?;
    info!(path = %path.display(), checksum = %bundle.checksum, "wrote definition bundle");
    Ok(())
}

pub fn read_bundle(path: &Path) -> Result<DefinitionBundle, BundleError> {
    let bytes = fs::read(path)?;
    DefinitionBundle::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use crate::property::{PropertyKind, PropertyValue, Rgba};
    use crate::settings::PropertySettings;
    use tempfile::TempDir;

    fn definition() -> FeatureVectorDefinition {
        FeatureVectorDefinition::new()
            .with_property("isAgent", PropertySettings::new(PropertyKind::Bool))
            .with_property("color", PropertySettings::color(Rgba::rgb(0.5, 0.25, 0.75), true))
            .with_property(
                "tag",
                PropertySettings::one_hot(vec!["a".into(), "b".into(), "c".into()])
                    .with_default(PropertyValue::one_hot(
                        vec!["a".into(), "b".into(), "c".into()],
                        Some("b"),
                    )),
            )
            .with_property("hist", PropertySettings::new(PropertyKind::FloatList).with_array_length(2))
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let def = definition();
        let (bundle, metadata) = pack_definition(&def).unwrap();
        assert_eq!(metadata.property_count, 4);
        assert_eq!(metadata.total_length, 1 + 4 + 3 + 2);
        assert_eq!(metadata.checksum.len(), 64);

        let restored = unpack_definition(&bundle).unwrap();
        assert_eq!(restored, def);
        assert_eq!(restored.default_vector(), def.default_vector());
    }

    #[test]
    fn test_checksum_validation() {
        let (mut bundle, _) = pack_definition(&definition()).unwrap();
        let last = bundle.payload.len() - 1;
        bundle.payload[last] ^= 0xFF;
        assert!(matches!(unpack_definition(&bundle), Err(BundleError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_version_mismatch() {
        let (mut bundle, _) = pack_definition(&definition()).unwrap();
        bundle.format_version = 99;
        assert!(matches!(
            unpack_definition(&bundle),
            Err(BundleError::VersionMismatch { found: 99, expected: 1 })
        ));
    }

    #[test]
    fn test_bad_payload_is_decompression_error() {
        let payload = vec![16, 0, 0, 0, 0xF0];
        let bundle = DefinitionBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            checksum: checksum_hex(&payload),
            created_at: String::new(),
            payload,
        };
        assert!(matches!(unpack_definition(&bundle), Err(BundleError::Decompression)));
    }

    #[test]
    fn test_oversized_declared_length_is_rejected() {
        let mut payload = 0xFFFF_FFF0u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0x10, 0x00]);
        let bundle = DefinitionBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            checksum: checksum_hex(&payload),
            created_at: String::new(),
            payload,
        };
        let err = unpack_definition(&bundle).unwrap_err();
        assert!(matches!(
            err,
            BundleError::DataTooLarge { size: 0xFFFF_FFF0, limit: MAX_DOCUMENT_SIZE }
        ));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_truncated_header_is_decompression_error() {
        let payload = vec![3, 0];
        let bundle = DefinitionBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            checksum: checksum_hex(&payload),
            created_at: String::new(),
            payload,
        };
        assert!(matches!(unpack_definition(&bundle), Err(BundleError::Decompression)));
    }

    #[test]
    fn test_inconsistent_document_is_rejected() {
        let mut document = definition().to_document();
        let dup = document.properties[0].clone();
        document.properties.push(dup);

        let payload = compress_prepend_size(&to_vec_named(&document).unwrap());
        let bundle = DefinitionBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            checksum: checksum_hex(&payload),
            created_at: String::new(),
            payload,
        };
        assert!(matches!(
            unpack_definition(&bundle),
            Err(BundleError::Feature(FeatureError::DuplicateProperty { .. }))
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundles/def.cfsb");
        let def = definition();
        let (bundle, _) = pack_definition(&def).unwrap();

        write_bundle(&path, &bundle).unwrap();
        let read = read_bundle(&path).unwrap();
        assert_eq!(read, bundle);
        assert_eq!(unpack_definition(&read).unwrap().id(), def.id());
    }

    #[test]
    fn test_garbage_file_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.cfsb");
        fs::write(&path, b"not a bundle").unwrap();
        let err = read_bundle(&path).unwrap_err();
        assert!(err.is_corruption(), "{err}");
    }
}

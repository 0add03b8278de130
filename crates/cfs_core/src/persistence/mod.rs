// Persistence for definitions, providers and encoder configs.
// Text documents (JSON / YAML) plus a MessagePack + LZ4 bundle with checksum.

pub mod bundle;
pub mod documents;
pub mod error;

pub use bundle::{
    pack_definition, read_bundle, unpack_definition, write_bundle, BundleMetadata,
    DefinitionBundle,
};
pub use documents::{
    load_config, load_definition, load_document, load_provider, save_document, DocumentFormat,
};
pub use error::BundleError;

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Largest decompressed definition document a bundle may declare.
pub const MAX_DOCUMENT_SIZE: usize = 8 * 1024 * 1024;

//! # cfs_core - Object Property Feature Vectors
//!
//! Encodes typed per-object properties into fixed-width `f32` feature
//! vectors for reinforcement-learning observations.
//!
//! ## Features
//! - Seven property kinds (bool, float, colour, lists, one-hot / multi-hot)
//! - One shared definition fixes order, length and defaults for every object
//! - Entities without a value for a property encode its default
//! - Optional observation noise and per-instance colour noise, seedable
//! - JSON / YAML documents and a compressed, checksummed binary bundle
//!
//! ```rust
//! use cfs_core::{FeatureVectorDefinition, PropertyKind, PropertyProvider, PropertySettings, PropertyValue};
//!
//! let def = FeatureVectorDefinition::new()
//!     .with_property("isAgent", PropertySettings::new(PropertyKind::Bool))
//!     .with_property("speed", PropertySettings::new(PropertyKind::Float));
//!
//! let mut agent = PropertyProvider::new(&def);
//! agent.set_property(&def, "isAgent", PropertyValue::bool(true)).unwrap();
//! assert_eq!(agent.feature_vector(&def).unwrap(), vec![1.0, 0.0]);
//! ```

pub mod config;
pub mod debug_flags;
pub mod definition;
pub mod error;
pub mod grid;
pub mod noise;
pub mod object_id;
pub mod persistence;
pub mod property;
pub mod provider;
pub mod requester;
pub mod settings;

pub use config::EncoderConfig;
pub use definition::{DefinitionDocument, FeatureVectorDefinition, PropertyEntry, PropertySlot};
pub use error::{FeatureError, Result};
pub use grid::{FeatureGridEncoder, ProviderLookup};
pub use noise::NoiseFunction;
pub use object_id::{ObjectId, BACKGROUND_ID};
pub use persistence::BundleError;
pub use property::{PropertyKind, PropertyValue, Rgba};
pub use provider::PropertyProvider;
pub use requester::PropertyRequester;
pub use settings::PropertySettings;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Feature vector definition - the shared schema all providers encode against.
//!
//! ## Ordering
//!
//! Property order is a bijection between keys and the dense index range
//! `0..len`, stored both ways (`order`: index -> key, `index`: key -> index).
//! New keys take the lowest unused index. Because removals compact the order,
//! that is always the end of the vector.
//!
//! `set_order` never adds or drops keys: unknown keys are ignored, repeated
//! keys keep their first position, and keys left out follow the explicitly
//! ordered ones in their previous relative order.
//!
//! ## Persistence
//!
//! A definition (de)serializes through [`DefinitionDocument`], an ordered list
//! of `(name, settings)` entries plus the definition id.

use once_cell::sync::OnceCell;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{FeatureError, Result};
use crate::property::PropertyKind;
use crate::settings::PropertySettings;

/// Current version of the serialized definition layout.
pub const DEFINITION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DefinitionDocument", into = "DefinitionDocument")]
pub struct FeatureVectorDefinition {
    id: Uuid,
    properties: HashMap<String, PropertySettings>,
    order: Vec<String>,
    index: HashMap<String, usize>,
    total_length: OnceCell<usize>,
}

/// Position of one property inside the flat feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySlot {
    pub index: usize,
    pub name: String,
    pub kind: PropertyKind,
    pub offset: usize,
    pub length: usize,
}

impl Default for FeatureVectorDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FeatureVectorDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.order == other.order && self.properties == other.properties
    }
}

impl FeatureVectorDefinition {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            properties: HashMap::new(),
            order: Vec::new(),
            index: HashMap::new(),
            total_length: OnceCell::new(),
        }
    }

    /// Builder form of [`add_property`](Self::add_property).
    pub fn with_property(mut self, name: impl Into<String>, settings: PropertySettings) -> Self {
        self.add_property(name, settings);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Inserts or replaces a property. A replaced key keeps its index.
    pub fn add_property(&mut self, name: impl Into<String>, mut settings: PropertySettings) {
        let name = name.into();
        settings.sync();
        if self.properties.insert(name.clone(), settings).is_none() {
            self.assign_index(name);
        }
        self.invalidate();
    }

    /// Removes a property; later properties move up one index.
    pub fn remove_property(&mut self, name: &str) -> Option<PropertySettings> {
        let removed = self.properties.remove(name)?;
        self.order.retain(|key| key != name);
        self.rebuild_index();
        self.invalidate();
        Some(removed)
    }

    fn assign_index(&mut self, name: String) {
        if self.index.contains_key(&name) {
            return;
        }
        let claimed: HashSet<usize> = self.index.values().copied().collect();
        let free = (0..self.properties.len())
            .find(|i| !claimed.contains(i))
            .unwrap_or(self.order.len());
        debug_assert_eq!(free, self.order.len(), "order must stay dense");
        self.index.insert(name.clone(), free);
        self.order.push(name);
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .order
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
    }

    fn invalidate(&mut self) {
        self.total_length.take();
    }

    /// Applies a new property order.
    pub fn set_order<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.order.len());
        let mut new_order = Vec::with_capacity(self.order.len());

        for key in keys {
            let key = key.as_ref();
            if self.properties.contains_key(key) && seen.insert(key.to_string()) {
                new_order.push(key.to_string());
            }
        }
        for key in &self.order {
            if !seen.contains(key) {
                new_order.push(key.clone());
            }
        }

        debug_assert_eq!(new_order.len(), self.order.len());
        self.order = new_order;
        self.rebuild_index();
    }

    /// Keys in feature vector order.
    pub fn property_order(&self) -> &[String] {
        &self.order
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn settings(&self, name: &str) -> Option<&PropertySettings> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Properties in feature vector order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertySettings)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.properties.get(key).map(|s| (key.as_str(), s)))
    }

    /// Edits a settings entry in place. The entry is re-synced afterwards.
    pub fn update_settings<F>(&mut self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut PropertySettings),
    {
        let settings = self
            .properties
            .get_mut(name)
            .ok_or_else(|| FeatureError::UnknownProperty { name: name.to_string() })?;
        edit(settings);
        settings.sync();
        self.invalidate();
        Ok(())
    }

    /// Total feature vector length, cached until the next edit.
    pub fn total_length(&self) -> usize {
        *self
            .total_length
            .get_or_init(|| self.iter().map(|(_, s)| s.encoded_length()).sum())
    }

    pub fn layout(&self) -> Vec<PropertySlot> {
        let mut offset = 0;
        self.iter()
            .enumerate()
            .map(|(index, (name, settings))| {
                let length = settings.encoded_length();
                let slot = PropertySlot {
                    index,
                    name: name.to_string(),
                    kind: settings.kind(),
                    offset,
                    length,
                };
                offset += length;
                slot
            })
            .collect()
    }

    /// The vector an entity without any properties encodes to.
    pub fn default_vector(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.total_length());
        for (_, settings) in self.iter() {
            settings.default_value().encode_into(&mut out);
        }
        out
    }

    pub fn to_document(&self) -> DefinitionDocument {
        DefinitionDocument {
            schema_version: DEFINITION_SCHEMA_VERSION,
            id: self.id,
            properties: self
                .iter()
                .map(|(name, settings)| PropertyEntry {
                    name: name.to_string(),
                    settings: settings.clone(),
                })
                .collect(),
        }
    }

    pub fn from_document(document: DefinitionDocument) -> Result<Self> {
        if document.schema_version != DEFINITION_SCHEMA_VERSION {
            return Err(FeatureError::UnsupportedSchemaVersion {
                found: document.schema_version,
                expected: DEFINITION_SCHEMA_VERSION,
            });
        }

        let mut definition = Self::with_id(document.id);
        for entry in document.properties {
            entry.settings.validate(&entry.name)?;
            if definition.contains(&entry.name) {
                return Err(FeatureError::DuplicateProperty { name: entry.name });
            }
            definition.add_property(entry.name, entry.settings);
        }
        Ok(definition)
    }

    /// JSON Schema of the serialized form.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DefinitionDocument)
    }
}

/// Serialized form of a [`FeatureVectorDefinition`], entries in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DefinitionDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PropertyEntry {
    pub name: String,
    pub settings: PropertySettings,
}

fn default_schema_version() -> u32 {
    DEFINITION_SCHEMA_VERSION
}

impl TryFrom<DefinitionDocument> for FeatureVectorDefinition {
    type Error = FeatureError;

    fn try_from(document: DefinitionDocument) -> Result<Self> {
        Self::from_document(document)
    }
}

impl From<FeatureVectorDefinition> for DefinitionDocument {
    fn from(definition: FeatureVectorDefinition) -> Self {
        definition.to_document()
    }
}

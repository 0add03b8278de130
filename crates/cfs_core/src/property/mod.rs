//! Object properties - the typed values that make up a feature vector.
//!
//! Every property is one variant of the closed [`PropertyValue`] enum. The
//! variant tag is [`PropertyKind`], which is also what a settings entry
//! declares.
//!
//! ## Encoded lengths
//! ```text
//! Bool              1
//! Float             1
//! Color             3 (rgb) / 4 (rgba)
//! BoolList          values.len()
//! FloatList         values.len()
//! OneHotString      code_book.len()
//! OneHotStringList  code_book.len()
//! ```

mod color;
mod value;

pub use color::{hsv_to_rgb, rgb_to_hsv, Rgba};
pub use value::PropertyValue;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Variant tag of a [`PropertyValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Bool,
    Float,
    Color,
    BoolList,
    FloatList,
    OneHotString,
    OneHotStringList,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 7] = [
        PropertyKind::Bool,
        PropertyKind::Float,
        PropertyKind::Color,
        PropertyKind::BoolList,
        PropertyKind::FloatList,
        PropertyKind::OneHotString,
        PropertyKind::OneHotStringList,
    ];

    /// Whether the encoded length follows the settings' `array_length`.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            PropertyKind::BoolList
                | PropertyKind::FloatList
                | PropertyKind::OneHotString
                | PropertyKind::OneHotStringList
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Float => "float",
            PropertyKind::Color => "color",
            PropertyKind::BoolList => "bool_list",
            PropertyKind::FloatList => "float_list",
            PropertyKind::OneHotString => "one_hot_string",
            PropertyKind::OneHotStringList => "one_hot_string_list",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

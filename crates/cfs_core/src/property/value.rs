use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::color::{hsv_to_rgb, rgb_to_hsv, Rgba};
use super::PropertyKind;
use crate::settings::PropertySettings;

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyValue {
    Bool {
        #[serde(default)]
        value: bool,
    },
    Float {
        #[serde(default)]
        value: f32,
    },
    Color {
        #[serde(default)]
        value: Rgba,
        /// Encode the alpha channel as a fourth float
        #[serde(default)]
        use_alpha: bool,
        /// Hue perturbation range applied at spawn time (+- |instance_noise|)
        #[serde(default)]
        instance_noise: f32,
    },
    BoolList {
        #[serde(default)]
        values: Vec<bool>,
    },
    FloatList {
        #[serde(default)]
        values: Vec<f32>,
    },
    OneHotString {
        #[serde(default)]
        code_book: Vec<String>,
        #[serde(default)]
        value: Option<String>,
    },
    OneHotStringList {
        #[serde(default)]
        code_book: Vec<String>,
        #[serde(default)]
        values: Vec<String>,
    },
}

impl PropertyValue {
    /// Zero value of a kind: false, 0.0, opaque black, empty lists.
    pub fn zero(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Bool => PropertyValue::Bool { value: false },
            PropertyKind::Float => PropertyValue::Float { value: 0.0 },
            PropertyKind::Color => PropertyValue::Color {
                value: Rgba::BLACK,
                use_alpha: false,
                instance_noise: 0.0,
            },
            PropertyKind::BoolList => PropertyValue::BoolList { values: Vec::new() },
            PropertyKind::FloatList => PropertyValue::FloatList { values: Vec::new() },
            PropertyKind::OneHotString => PropertyValue::OneHotString {
                code_book: Vec::new(),
                value: None,
            },
            PropertyKind::OneHotStringList => PropertyValue::OneHotStringList {
                code_book: Vec::new(),
                values: Vec::new(),
            },
        }
    }

    pub fn bool(value: bool) -> Self {
        PropertyValue::Bool { value }
    }

    pub fn float(value: f32) -> Self {
        PropertyValue::Float { value }
    }

    pub fn color(value: Rgba) -> Self {
        PropertyValue::Color { value, use_alpha: false, instance_noise: 0.0 }
    }

    pub fn color_with_alpha(value: Rgba) -> Self {
        PropertyValue::Color { value, use_alpha: true, instance_noise: 0.0 }
    }

    pub fn bool_list(values: Vec<bool>) -> Self {
        PropertyValue::BoolList { values }
    }

    pub fn float_list(values: Vec<f32>) -> Self {
        PropertyValue::FloatList { values }
    }

    pub fn one_hot<S: Into<String>>(code_book: Vec<String>, value: Option<S>) -> Self {
        PropertyValue::OneHotString { code_book, value: value.map(Into::into) }
    }

    pub fn multi_hot(code_book: Vec<String>, values: Vec<String>) -> Self {
        PropertyValue::OneHotStringList { code_book, values }
    }

    /// Sets the hue noise range of a colour; ignored by other kinds.
    pub fn with_instance_noise(mut self, noise: f32) -> Self {
        if let PropertyValue::Color { instance_noise, .. } = &mut self {
            *instance_noise = noise;
        }
        self
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool { .. } => PropertyKind::Bool,
            PropertyValue::Float { .. } => PropertyKind::Float,
            PropertyValue::Color { .. } => PropertyKind::Color,
            PropertyValue::BoolList { .. } => PropertyKind::BoolList,
            PropertyValue::FloatList { .. } => PropertyKind::FloatList,
            PropertyValue::OneHotString { .. } => PropertyKind::OneHotString,
            PropertyValue::OneHotStringList { .. } => PropertyKind::OneHotStringList,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    pub fn encoded_length(&self) -> usize {
        match self {
            PropertyValue::Bool { .. } | PropertyValue::Float { .. } => 1,
            PropertyValue::Color { use_alpha, .. } => {
                if *use_alpha {
                    4
                } else {
                    3
                }
            }
            PropertyValue::BoolList { values } => values.len(),
            PropertyValue::FloatList { values } => values.len(),
            PropertyValue::OneHotString { code_book, .. } => code_book.len(),
            PropertyValue::OneHotStringList { code_book, .. } => code_book.len(),
        }
    }

    pub fn encode(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut out);
        out
    }

    /// Appends exactly `encoded_length()` floats to `out`.
    pub fn encode_into(&self, out: &mut Vec<f32>) {
        match self {
            PropertyValue::Bool { value } => out.push(flag(*value)),
            PropertyValue::Float { value } => out.push(*value),
            PropertyValue::Color { value, use_alpha, .. } => {
                out.extend_from_slice(&[value.r, value.g, value.b]);
                if *use_alpha {
                    out.push(value.a);
                }
            }
            PropertyValue::BoolList { values } => out.extend(values.iter().map(|v| flag(*v))),
            PropertyValue::FloatList { values } => out.extend_from_slice(values),
            PropertyValue::OneHotString { code_book, value } => {
                // First matching entry only; empty entries are unassigned slots.
                let hot = value.as_deref().and_then(|v| {
                    code_book.iter().position(|entry| !entry.is_empty() && entry == v)
                });
                out.extend((0..code_book.len()).map(|i| flag(hot == Some(i))));
            }
            PropertyValue::OneHotStringList { code_book, values } => {
                out.extend(code_book.iter().map(|entry| {
                    flag(!entry.is_empty() && values.iter().any(|v| v == entry))
                }));
            }
        }
    }

    /// Resizes list and categorical variants, keeping the overlapping prefix.
    ///
    /// New slots are zero, false, or unassigned code-book entries. Scalars
    /// and colours have a fixed length and are left alone.
    pub fn resize(&mut self, len: usize) {
        match self {
            PropertyValue::BoolList { values } => values.resize(len, false),
            PropertyValue::FloatList { values } => values.resize(len, 0.0),
            PropertyValue::OneHotString { code_book, .. }
            | PropertyValue::OneHotStringList { code_book, .. } => {
                code_book.resize(len, String::new())
            }
            PropertyValue::Bool { .. }
            | PropertyValue::Float { .. }
            | PropertyValue::Color { .. } => {}
        }
    }

    /// Adapts this value to a settings entry: array length, code-book and
    /// alpha flag follow the settings and their default.
    ///
    /// Returns `false` (and leaves the value untouched) when the settings
    /// describe another kind.
    pub fn apply_settings(&mut self, settings: &PropertySettings) -> bool {
        if settings.kind() != self.kind() {
            warn!(
                value_kind = %self.kind(),
                settings_kind = %settings.kind(),
                "ignoring settings of another property kind"
            );
            return false;
        }

        self.resize(settings.array_length());

        match (self, settings.default_value()) {
            (
                PropertyValue::OneHotString { code_book, .. },
                PropertyValue::OneHotString { code_book: template, .. },
            )
            | (
                PropertyValue::OneHotStringList { code_book, .. },
                PropertyValue::OneHotStringList { code_book: template, .. },
            ) => {
                code_book.clone_from(template);
            }
            (
                PropertyValue::Color { use_alpha, .. },
                PropertyValue::Color { use_alpha: template_alpha, .. },
            ) => {
                *use_alpha = *template_alpha;
            }
            _ => {}
        }
        true
    }

    /// Copies the value (not the shape) from a property of the same kind.
    ///
    /// Lists copy the overlapping prefix and keep their own length; one-hot
    /// variants keep their own code-book.
    pub fn copy_from(&mut self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Bool { value }, PropertyValue::Bool { value: src }) => *value = *src,
            (PropertyValue::Float { value }, PropertyValue::Float { value: src }) => *value = *src,
            (PropertyValue::Color { value, .. }, PropertyValue::Color { value: src, .. }) => {
                *value = *src
            }
            (PropertyValue::BoolList { values }, PropertyValue::BoolList { values: src }) => {
                copy_prefix(values, src)
            }
            (PropertyValue::FloatList { values }, PropertyValue::FloatList { values: src }) => {
                copy_prefix(values, src)
            }
            (
                PropertyValue::OneHotString { value, .. },
                PropertyValue::OneHotString { value: src, .. },
            ) => value.clone_from(src),
            (
                PropertyValue::OneHotStringList { values, .. },
                PropertyValue::OneHotStringList { values: src, .. },
            ) => values.clone_from(src),
            (this, other) => {
                warn!(
                    target_kind = %this.kind(),
                    source_kind = %other.kind(),
                    "cannot copy between property kinds"
                );
                return false;
            }
        }
        true
    }

    pub fn instance_noise(&self) -> f32 {
        match self {
            PropertyValue::Color { instance_noise, .. } => *instance_noise,
            _ => 0.0,
        }
    }

    /// Perturbs a colour's hue by a uniform draw from
    /// `[-|instance_noise|, |instance_noise|]`. Saturation, value and alpha
    /// are kept.
    ///
    /// Returns `true` if noise was applied. Zero noise and non-colour values
    /// consume no randomness.
    pub fn apply_instance_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let PropertyValue::Color { value, instance_noise, .. } = self else {
            return false;
        };
        let range = instance_noise.abs();
        if range == 0.0 || !range.is_finite() {
            return false;
        }

        let (h, s, v) = rgb_to_hsv(*value);
        let shift = rng.gen_range(-range..=range);
        let alpha = value.a;
        *value = Rgba { a: alpha, ..hsv_to_rgb(h + shift, s, v) };
        true
    }
}

fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

fn copy_prefix<T: Copy>(dst: &mut [T], src: &[T]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn book(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scalar_encoding() {
        assert_eq!(PropertyValue::bool(true).encode(), vec![1.0]);
        assert_eq!(PropertyValue::bool(false).encode(), vec![0.0]);
        assert_eq!(PropertyValue::float(-2.5).encode(), vec![-2.5]);
    }

    #[test]
    fn test_color_encoding_respects_alpha_flag() {
        let c = Rgba::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(PropertyValue::color(c).encode(), vec![0.1, 0.2, 0.3]);
        assert_eq!(PropertyValue::color_with_alpha(c).encode(), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(PropertyValue::color(c).encoded_length(), 3);
        assert_eq!(PropertyValue::color_with_alpha(c).encoded_length(), 4);
    }

    #[test]
    fn test_one_hot_string() {
        let v = PropertyValue::one_hot(book(&["a", "b", "c"]), Some("b"));
        assert_eq!(v.encode(), vec![0.0, 1.0, 0.0]);

        let none = PropertyValue::one_hot(book(&["a", "b", "c"]), Some("z"));
        assert_eq!(none.encode(), vec![0.0, 0.0, 0.0]);

        let unset = PropertyValue::one_hot::<String>(book(&["a", "b"]), None);
        assert_eq!(unset.encode(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_duplicate_entries_mark_first_only() {
        let v = PropertyValue::one_hot(book(&["x", "y", "x"]), Some("x"));
        assert_eq!(v.encode(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_code_book_slots_never_hot() {
        let v = PropertyValue::one_hot(book(&["a", ""]), Some(""));
        assert_eq!(v.encode(), vec![0.0, 0.0]);

        let m = PropertyValue::multi_hot(book(&["", "b"]), book(&["", "b"]));
        assert_eq!(m.encode(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_multi_hot() {
        let v = PropertyValue::multi_hot(book(&["red", "green", "blue"]), book(&["blue", "red"]));
        assert_eq!(v.encode(), vec![1.0, 0.0, 1.0]);

        let empty = PropertyValue::multi_hot(book(&["red", "green"]), vec![]);
        assert_eq!(empty.encode(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_resize_float_list() {
        let mut v = PropertyValue::float_list(vec![1.0, 2.0, 3.0]);
        v.resize(5);
        assert_eq!(v.encode(), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
        v.resize(2);
        assert_eq!(v.encode(), vec![1.0, 2.0]);
        v.resize(0);
        assert_eq!(v.encoded_length(), 0);
    }

    #[test]
    fn test_resize_bool_list_and_scalars() {
        let mut v = PropertyValue::bool_list(vec![true]);
        v.resize(3);
        assert_eq!(v.encode(), vec![1.0, 0.0, 0.0]);

        let mut s = PropertyValue::float(4.0);
        s.resize(10);
        assert_eq!(s.encoded_length(), 1);
    }

    #[test]
    fn test_copy_from_same_kind() {
        let mut dst = PropertyValue::float_list(vec![0.0; 3]);
        assert!(dst.copy_from(&PropertyValue::float_list(vec![7.0, 8.0])));
        assert_eq!(dst.encode(), vec![7.0, 8.0, 0.0]);

        let mut tag = PropertyValue::one_hot(book(&["a", "b"]), Some("a"));
        assert!(tag.copy_from(&PropertyValue::one_hot(book(&["q"]), Some("b"))));
        // Value copied, own code-book kept
        assert_eq!(tag.encode(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_copy_from_other_kind_is_noop() {
        let mut dst = PropertyValue::bool(true);
        assert!(!dst.copy_from(&PropertyValue::float(0.0)));
        assert_eq!(dst, PropertyValue::bool(true));
    }

    #[test]
    fn test_zero_noise_leaves_color_and_rng_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut reference = ChaCha8Rng::seed_from_u64(7);
        let mut v = PropertyValue::color(Rgba::rgb(0.2, 0.6, 0.4));
        assert!(!v.apply_instance_noise(&mut rng));
        assert_eq!(v, PropertyValue::color(Rgba::rgb(0.2, 0.6, 0.4)));
        assert_eq!(rng.gen::<u64>(), reference.gen::<u64>());
    }

    #[test]
    fn test_noise_changes_hue_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let original = Rgba::new(0.8, 0.3, 0.1, 0.5);
        let mut v = PropertyValue::color(original).with_instance_noise(0.2);
        assert!(v.apply_instance_noise(&mut rng));

        let PropertyValue::Color { value, .. } = v else {
            panic!("expected colour");
        };
        let (h0, s0, v0) = rgb_to_hsv(original);
        let (h1, s1, v1) = rgb_to_hsv(value);
        assert!((s0 - s1).abs() < 1e-4);
        assert!((v0 - v1).abs() < 1e-4);
        let dh = (h1 - h0).abs().min(1.0 - (h1 - h0).abs());
        assert!(dh <= 0.2 + 1e-4);
        assert_eq!(value.a, 0.5);
    }

    #[test]
    fn test_serde_tagging() {
        let v = PropertyValue::one_hot(book(&["a", "b"]), Some("a"));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "one_hot_string");
        assert_eq!(json["code_book"][1], "b");

        let parsed: PropertyValue =
            serde_json::from_str(r#"{"kind":"float_list","values":[1.0,2.0]}"#).unwrap();
        assert_eq!(parsed, PropertyValue::float_list(vec![1.0, 2.0]));

        let bare: PropertyValue = serde_json::from_str(r#"{"kind":"bool"}"#).unwrap();
        assert_eq!(bare, PropertyValue::bool(false));
    }
}

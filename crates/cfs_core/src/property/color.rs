//! RGBA colour and the RGB/HSV conversions used for colour instance noise.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Linear RGBA colour, channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Maximum per-channel distance, alpha included.
    pub fn max_channel_diff(&self, other: &Rgba) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
            .max((self.a - other.a).abs())
    }
}

/// Converts RGB to (hue, saturation, value); hue in [0, 1).
///
/// The dominant channel picks the hue sector: blue wins only when strictly
/// larger than both others, green when strictly larger than red, otherwise red.
pub fn rgb_to_hsv(color: Rgba) -> (f32, f32, f32) {
    let Rgba { r, g, b, .. } = color;
    if b > g && b > r {
        hsv_sector(4.0, b, r, g)
    } else if g > r {
        hsv_sector(2.0, g, b, r)
    } else {
        hsv_sector(0.0, r, g, b)
    }
}

fn hsv_sector(offset: f32, dominant: f32, c1: f32, c2: f32) -> (f32, f32, f32) {
    let v = dominant;
    if v == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let smallest = c1.min(c2);
    let diff = v - smallest;
    let (mut h, s) = if diff > 0.0 {
        (offset + (c1 - c2) / diff, diff / v)
    } else {
        (offset + (c1 - c2), 0.0)
    };

    h /= 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    (h, s, v)
}

/// Converts (hue, saturation, value) back to an opaque RGB colour.
///
/// Hue is wrapped into [0, 1) first, so hues pushed past either end by noise
/// land on the other side of the colour wheel.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgba {
    if s == 0.0 {
        return Rgba::rgb(v, v, v);
    }
    if v == 0.0 {
        return Rgba::BLACK;
    }

    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let t = h6 - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * t);
    let u = v * (1.0 - s * (1.0 - t));

    let (r, g, b) = match sector as i32 {
        0 | 6 => (v, u, p),
        1 => (q, v, p),
        2 => (p, v, u),
        3 => (p, q, v),
        4 => (u, p, v),
        _ => (v, p, q),
    };

    Rgba::rgb(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgba, b: Rgba) {
        assert!(a.max_channel_diff(&b) < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_primary_hues() {
        let (h, s, v) = rgb_to_hsv(Rgba::rgb(1.0, 0.0, 0.0));
        assert_eq!((h, s, v), (0.0, 1.0, 1.0));

        let (h, _, _) = rgb_to_hsv(Rgba::rgb(0.0, 1.0, 0.0));
        assert!((h - 1.0 / 3.0).abs() < 1e-6);

        let (h, _, _) = rgb_to_hsv(Rgba::rgb(0.0, 0.0, 1.0));
        assert!((h - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_grey_has_no_saturation() {
        let (h, s, v) = rgb_to_hsv(Rgba::rgb(0.4, 0.4, 0.4));
        assert_eq!(h, 0.0);
        assert_eq!(s, 0.0);
        assert!((v - 0.4).abs() < 1e-6);
        assert_close(hsv_to_rgb(h, s, v), Rgba::rgb(0.4, 0.4, 0.4));
    }

    #[test]
    fn test_round_trip() {
        for color in [
            Rgba::rgb(0.2, 0.5, 0.9),
            Rgba::rgb(0.9, 0.1, 0.3),
            Rgba::rgb(0.3, 0.8, 0.1),
            Rgba::rgb(0.7, 0.7, 0.2),
            Rgba::BLACK,
            Rgba::WHITE,
        ] {
            let (h, s, v) = rgb_to_hsv(color);
            assert_close(hsv_to_rgb(h, s, v), color);
        }
    }

    #[test]
    fn test_hue_wraps() {
        let red = Rgba::rgb(1.0, 0.0, 0.0);
        assert_close(hsv_to_rgb(1.0, 1.0, 1.0), red);
        assert_close(hsv_to_rgb(-1.0, 1.0, 1.0), red);

        // Slightly negative hue lands in the magenta sector.
        let c = hsv_to_rgb(-0.05, 1.0, 1.0);
        assert_eq!(c.r, 1.0);
        assert!(c.b > 0.0);
        assert_eq!(c.g, 0.0);
    }
}

//! Colour model: theme palettes in HSL, converted to RGB on the CPU.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A colour in hue/saturation/lightness form.
///
/// Units follow CSS: hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Convert to sRGB components in `0.0..=1.0`.
    pub fn to_rgb(self) -> Vec3 {
        hsl_to_rgb(self.h / 360.0, self.s / 100.0, self.l / 100.0)
    }
}

/// The default blue / purple / pink theme.
pub fn default_theme() -> Vec<Hsl> {
    vec![
        Hsl::new(220.0, 70.0, 50.0),
        Hsl::new(270.0, 70.0, 50.0),
        Hsl::new(300.0, 70.0, 60.0),
    ]
}

/// HSL to sRGB with all inputs normalized.
///
/// Hue wraps (negative values allowed); saturation and lightness are clamped.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Convert an sRGB colour to linear space for the GPU.
pub fn srgb_to_linear(c: Vec3) -> Vec3 {
    fn channel(x: f32) -> f32 {
        if x <= 0.04045 {
            x / 12.92
        } else {
            ((x + 0.055) / 1.055).powf(2.4)
        }
    }
    Vec3::new(channel(c.x), channel(c.y), channel(c.z))
}

/// Parse a `#rrggbb` hex colour into sRGB components.
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

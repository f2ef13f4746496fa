//! FILENAME: treemap-engine/src/palette.rs
//! PURPOSE: Region colors and per-tile shading.
//! CONTEXT: Known markets have fixed pastel colors. Any other region gets a
//! color derived from a hash of its name, lightened toward white, so the
//! same name always renders the same way.

use serde::{Serialize, Serializer};
use std::fmt;

/// Neutral gray for tiles without a region.
pub const FALLBACK_COLOR: Rgb = Rgb::new(0x9c, 0xa3, 0xaf);

/// Share of white mixed into hashed colors.
const HASHED_LIGHTEN: f64 = 0.4;

const REGION_COLORS: [(&str, Rgb); 8] = [
    ("PL-Central Poland", Rgb::new(0x60, 0xa5, 0xfa)),
    ("PL-Poznan", Rgb::new(0xa7, 0x8b, 0xfa)),
    ("PL-Upper Silesia", Rgb::new(0x34, 0xd3, 0x99)),
    ("PL-Warsaw", Rgb::new(0xfb, 0xbf, 0x24)),
    ("PL-Wroclaw", Rgb::new(0xf8, 0x71, 0x71)),
    ("PL-Lower Silesia", Rgb::new(0x22, 0xd3, 0xee)),
    ("PL-South", Rgb::new(0x84, 0xcc, 0x16)),
    ("PL-North", Rgb::new(0xf4, 0x72, 0xb6)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Low 24 bits of `value` as `0xRRGGBB`.
    pub fn from_u24(value: u32) -> Self {
        Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Mixes `amount` (0..=1) of white into the color.
    pub fn lighten(self, amount: f64) -> Self {
        let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round().min(255.0) as u8;
        Rgb::new(mix(self.r), mix(self.g), mix(self.b))
    }

    /// Multiplies every channel by `factor`, clamped to 255.
    pub fn scale(self, factor: f64) -> Self {
        let mul = |c: u8| (c as f64 * factor).min(255.0).round() as u8;
        Rgb::new(mul(self.r), mul(self.g), mul(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// 32-bit string hash over UTF-16 code units (`h = c + (h << 5) - h`).
pub fn string_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |h, unit| {
        (unit as i32).wrapping_add(h.wrapping_shl(5).wrapping_sub(h))
    })
}

/// Base color for a region label.
pub fn region_color(name: &str) -> Rgb {
    if let Some((_, color)) = REGION_COLORS.iter().find(|(region, _)| *region == name) {
        return *color;
    }
    if name.is_empty() {
        return FALLBACK_COLOR;
    }
    Rgb::from_u24(string_hash(name) as u32 & 0x00ff_ffff).lighten(HASHED_LIGHTEN)
}

/// Shade for the tile at `index` among `total` siblings. The first tile is
/// darkest (70%), later tiles approach the base color.
pub fn tile_shade(base: Rgb, index: usize, total: usize) -> Rgb {
    if total <= 1 {
        return base;
    }
    base.scale(0.7 + (index as f64 / total as f64) * 0.3)
}

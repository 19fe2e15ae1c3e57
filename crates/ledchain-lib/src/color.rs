//! Color model: a canonical HSV value with RGB, hex and temperature conversions.
//!
//! HSV is the stored (and persisted) form: hue in whole degrees `[0, 360)`,
//! saturation and value in whole percent `[0, 100]`. RGB and hex are derived,
//! so HSV → RGB → HSV is lossy by up to one unit per component.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedchainError, Result};

/// Lowest color temperature accepted by [`kelvin_to_rgb`].
pub const KELVIN_MIN: u32 = 1000;

/// Highest color temperature accepted by [`kelvin_to_rgb`].
pub const KELVIN_MAX: u32 = 40_000;

/// Marker returned by the bulk setters of [`Color`].
///
/// A bulk assignment is one observable color change; whoever owns the color
/// must propagate it (the chain re-transmits). Field setters return nothing.
#[must_use = "a bulk color change must be propagated to the owning chain"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorChange(());

/// One LED's color, stored as integer HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u16; 3]", into = "[u16; 3]")]
pub struct Color {
    h: u16,
    s: u8,
    v: u8,
}

impl Color {
    /// All channels off.
    pub const OFF: Color = Color { h: 0, s: 0, v: 0 };

    /// Build from HSV, wrapping hue into `[0, 360)` and clamping S/V to 100.
    pub fn from_hsv(h: u16, s: u8, v: u8) -> Self {
        Color {
            h: h % 360,
            s: s.min(100),
            v: v.min(100),
        }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        Color { h, s, v }
    }

    pub fn hue(&self) -> u16 {
        self.h
    }

    pub fn saturation(&self) -> u8 {
        self.s
    }

    pub fn value(&self) -> u8 {
        self.v
    }

    pub fn hsv(&self) -> (u16, u8, u8) {
        (self.h, self.s, self.v)
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        hsv_to_rgb(self.h, self.s, self.v)
    }

    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb();
        rgb_to_hex(r, g, b)
    }

    // ── Field setters (no change notification) ──

    pub fn set_hue(&mut self, h: u16) {
        self.h = h % 360;
    }

    pub fn set_saturation(&mut self, s: u8) {
        self.s = s.min(100);
    }

    pub fn set_value(&mut self, v: u8) {
        self.v = v.min(100);
    }

    // ── Bulk setters ──

    pub fn set_hsv(&mut self, h: u16, s: u8, v: u8) -> ColorChange {
        *self = Color::from_hsv(h, s, v);
        ColorChange(())
    }

    pub fn set_rgb(&mut self, r: u8, g: u8, b: u8) -> ColorChange {
        *self = Color::from_rgb(r, g, b);
        ColorChange(())
    }

    /// Set from a hex string. On error the color is left unchanged.
    pub fn set_hex(&mut self, hex: &str) -> Result<ColorChange> {
        let (r, g, b) = hex_to_rgb(hex)?;
        Ok(self.set_rgb(r, g, b))
    }

    /// Set hue and saturation from a color temperature, keeping the current value.
    pub fn set_temperature(&mut self, kelvin: u32) -> ColorChange {
        let (r, g, b) = kelvin_to_rgb(kelvin);
        let (h, s, _) = rgb_to_hsv(r, g, b);
        *self = Color { h, s, v: self.v };
        ColorChange(())
    }
}

impl From<[u16; 3]> for Color {
    fn from([h, s, v]: [u16; 3]) -> Self {
        Color::from_hsv(h, s.min(100) as u8, v.min(100) as u8)
    }
}

impl From<Color> for [u16; 3] {
    fn from(c: Color) -> Self {
        [c.h, u16::from(c.s), u16::from(c.v)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Format RGB as `#RRGGBB` (uppercase).
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
pub fn hex_to_rgb(s: &str) -> Result<(u8, u8, u8)> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LedchainError::InvalidFormat(format!(
            "{s} (expected #RRGGBB)"
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| LedchainError::InvalidFormat(format!("{s} (expected #RRGGBB)")))
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

/// Parse a color given as hex or as a name.
///
/// Names: `red`, `green`, `blue`, `white`, `orange`, `yellow`, `purple`,
/// `cyan`, `off`/`black`.
pub fn parse_color(s: &str) -> Result<(u8, u8, u8)> {
    let s = s.trim();
    match s.to_lowercase().as_str() {
        "red" => return Ok((255, 0, 0)),
        "green" => return Ok((0, 255, 0)),
        "blue" => return Ok((0, 0, 255)),
        "white" => return Ok((255, 255, 255)),
        "orange" => return Ok((255, 128, 0)),
        "yellow" => return Ok((255, 255, 0)),
        "purple" => return Ok((128, 0, 255)),
        "cyan" => return Ok((0, 255, 255)),
        "off" | "black" => return Ok((0, 0, 0)),
        _ => {}
    }
    hex_to_rgb(s).map_err(|_| {
        LedchainError::InvalidFormat(format!("{s} (use #RRGGBB or a color name)"))
    })
}

/// RGB to integer HSV. Components are truncated, not rounded.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u16, u8, u8) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let h = if diff == 0.0 {
        0.0
    } else if max == r {
        (60.0 * ((g - b) / diff) + 360.0) % 360.0
    } else if max == g {
        (60.0 * ((b - r) / diff) + 120.0) % 360.0
    } else {
        (60.0 * ((r - g) / diff) + 240.0) % 360.0
    };
    let s = if max == 0.0 { 0.0 } else { diff / max * 100.0 };
    let v = max * 100.0;

    (h as u16 % 360, s as u8, v as u8)
}

/// Integer HSV to RGB. Out-of-range inputs are wrapped/clamped first.
pub fn hsv_to_rgb(h: u16, s: u8, v: u8) -> (u8, u8, u8) {
    let h = f64::from(h % 360);
    let s = f64::from(s.min(100)) / 100.0;
    let v = f64::from(v.min(100)) / 100.0;

    let c = s * v;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u16 {
        0..60 => (c, x, 0.0),
        60..120 => (x, c, 0.0),
        120..180 => (0.0, c, x),
        180..240 => (0.0, x, c),
        240..300 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |ch: f64| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}

/// Approximate the RGB color of a black body at `kelvin`.
///
/// Tanner Helland's curve fit; input is clamped to
/// [`KELVIN_MIN`]..=[`KELVIN_MAX`], each channel clamped to `[0, 255]` and
/// truncated.
pub fn kelvin_to_rgb(kelvin: u32) -> (u8, u8, u8) {
    let t = f64::from(kelvin.clamp(KELVIN_MIN, KELVIN_MAX)) / 100.0;

    let red = if t <= 66.0 {
        255.0
    } else {
        329.698727446 * (t - 60.0).powf(-0.1332047592)
    };

    let green = if t <= 66.0 {
        99.4708025861 * t.ln() - 161.1195681661
    } else {
        288.1221695283 * (t - 60.0).powf(-0.0755148492)
    };

    let blue = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.5177312231 * (t - 10.0).ln() - 305.0447927307
    };

    let channel = |c: f64| c.clamp(0.0, 255.0) as u8;
    (channel(red), channel(green), channel(blue))
}

/// Hex string of a color temperature.
pub fn kelvin_to_hex(kelvin: u32) -> String {
    let (r, g, b) = kelvin_to_rgb(kelvin);
    rgb_to_hex(r, g, b)
}

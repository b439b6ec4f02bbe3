//! Color string parsing.
//!
//! Two entry points with different contracts:
//! - [`hex_to_rgb`] accepts only 3- or 6-digit hex and rejects everything else.
//!   The vector text path goes through it.
//! - [`Rgba::parse`] accepts the CSS subset the editor writes and is used by
//!   the raster paths, which behave like a 2D canvas fill style.

use thiserror::Error;

/// Error returned by [`hex_to_rgb`] for anything that is not 3- or 6-digit hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a 3- or 6-digit hex color: {0:?}")]
pub struct ColorError(pub String);

/// Convert `#rgb` / `#rrggbb` (leading `#` optional) into three channels.
///
/// Three-digit forms are expanded by doubling each digit.
///
/// # Errors
///
/// Returns [`ColorError`] for any other input, including `rgb(...)` strings.
pub fn hex_to_rgb(input: &str) -> Result<[u8; 3], ColorError> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError(input.to_string()));
    }

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(ColorError(input.to_string())),
    };

    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| ColorError(input.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Opaque white, the page fallback.
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    /// Create an opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS color as written by the editor.
    ///
    /// Supports `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)` and `transparent`. Returns `None` for anything else.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let value = input.trim();
        if value.eq_ignore_ascii_case("transparent") {
            return Some(Self {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            });
        }

        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() == 8 && hex.is_ascii() {
                let [r, g, b] = hex_to_rgb(&hex[..6]).ok()?;
                let a = u8::from_str_radix(&hex[6..], 16).ok()?;
                return Some(Self { r, g, b, a });
            }
            let [r, g, b] = hex_to_rgb(hex).ok()?;
            return Some(Self::opaque(r, g, b));
        }

        let lower = value.to_ascii_lowercase();
        let args = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();

        let channel = |s: &str| -> Option<u8> {
            let v: f32 = s.parse().ok()?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let c = v.round().clamp(0.0, 255.0) as u8;
            Some(c)
        };

        match parts.as_slice() {
            &[r, g, b] => Some(Self::opaque(channel(r)?, channel(g)?, channel(b)?)),
            &[r, g, b, a] => {
                let alpha: f32 = a.parse().ok()?;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                Some(Self {
                    r: channel(r)?,
                    g: channel(g)?,
                    b: channel(b)?,
                    a,
                })
            }
            _ => None,
        }
    }

    /// Whether painting with this color has no visible effect.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Convert to a tiny-skia color, scaling alpha by `opacity`.
    #[must_use]
    pub fn to_skia(self, opacity: f32) -> tiny_skia::Color {
        let alpha = f32::from(self.a) / 255.0 * opacity.clamp(0.0, 1.0);
        tiny_skia::Color::from_rgba(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            alpha,
        )
        .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }
}

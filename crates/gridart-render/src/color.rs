#![forbid(unsafe_code)]

//! Packed RGBA colour and `r,g,b` parsing.

use std::fmt;
use std::num::ParseIntError;

/// RGBA8 packed into one `u32` as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque colour.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Fixed-point linear blend towards `other`; `t` is clamped to [0, 1].
    ///
    /// Endpoints are exact: `lerp(a, b, 0.0) == a` and `lerp(a, b, 1.0) == b`
    /// (ignoring alpha, which is always opaque in the result).
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t256 = (t.clamp(0.0, 1.0) * 256.0) as u32;
        let inv = 256 - t256;
        let mix = |a: u8, b: u8| ((u32::from(a) * inv + u32::from(b) * t256) >> 8) as u8;
        Self::rgb(
            mix(self.r(), other.r()),
            mix(self.g(), other.g()),
            mix(self.b(), other.b()),
        )
    }
}

impl fmt::Display for PackedRgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r(), self.g(), self.b())
    }
}

/// Error from [`parse_color`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Not exactly three comma separated components.
    ComponentCount(usize),
    /// A component is not an integer in 0..=255.
    Component {
        index: usize,
        text: String,
        source: ParseIntError,
    },
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComponentCount(n) => {
                write!(f, "expected three comma separated components r,g,b, found {n}")
            }
            Self::Component { index, text, .. } => {
                let channel = ["red", "green", "blue"].get(*index).copied().unwrap_or("?");
                write!(f, "{channel} component {text:?} is not an integer in 0..=255")
            }
        }
    }
}

impl std::error::Error for ColorParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Component { source, .. } => Some(source),
            Self::ComponentCount(_) => None,
        }
    }
}

/// Parse an opaque colour from `"r,g,b"` (whitespace around components allowed).
pub fn parse_color(text: &str) -> Result<PackedRgba, ColorParseError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ColorParseError::ComponentCount(parts.len()));
    }
    let mut channels = [0u8; 3];
    for (index, (slot, part)) in channels.iter_mut().zip(&parts).enumerate() {
        *slot = part.parse::<u8>().map_err(|source| ColorParseError::Component {
            index,
            text: (*part).to_owned(),
            source,
        })?;
    }
    let [r, g, b] = channels;
    Ok(PackedRgba::rgb(r, g, b))
}

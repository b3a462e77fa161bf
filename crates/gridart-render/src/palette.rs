#![forbid(unsafe_code)]

//! Intensity → colour mapping.
//!
//! Every palette is a deterministic function of `t ∈ [0, 1]`; out-of-range
//! inputs are clamped. Multi-stop palettes interpolate linearly between fixed
//! stops with [`PackedRgba::lerp`].

use crate::color::PackedRgba;

/// Colour ramp used by presenters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// Black to white.
    #[default]
    Monochrome,
    /// Two-colour blend from `low` (t = 0) to `high` (t = 1).
    Duotone { low: PackedRgba, high: PackedRgba },
    /// Black, dark red, orange, yellow, white.
    Fire,
    /// Deep blue, cyan, seafoam.
    Ocean,
    /// Purple, hot pink, orange, pale yellow.
    Sunset,
    /// Full hue cycle.
    Neon,
}

impl Palette {
    /// Names accepted by [`Palette::from_name`]. `duotone` is built from explicit colours.
    pub const NAMES: [&'static str; 5] = ["mono", "fire", "ocean", "sunset", "neon"];

    /// Look up a fixed palette by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mono" | "monochrome" => Some(Self::Monochrome),
            "fire" => Some(Self::Fire),
            "ocean" => Some(Self::Ocean),
            "sunset" => Some(Self::Sunset),
            "neon" => Some(Self::Neon),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Monochrome => "mono",
            Self::Duotone { .. } => "duotone",
            Self::Fire => "fire",
            Self::Ocean => "ocean",
            Self::Sunset => "sunset",
            Self::Neon => "neon",
        }
    }

    /// Map an intensity to a colour.
    pub fn color_at(&self, t: f64) -> PackedRgba {
        // NaN never reaches a presenter in practice; map it to the low end anyway.
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            Self::Monochrome => PackedRgba::BLACK.lerp(PackedRgba::WHITE, t),
            Self::Duotone { low, high } => low.lerp(high, t),
            Self::Fire => ramp(
                &[
                    PackedRgba::rgb(0, 0, 0),
                    PackedRgba::rgb(80, 10, 0),
                    PackedRgba::rgb(200, 50, 0),
                    PackedRgba::rgb(255, 150, 20),
                    PackedRgba::rgb(255, 230, 100),
                    PackedRgba::rgb(255, 255, 220),
                ],
                t,
            ),
            Self::Ocean => ramp(
                &[
                    PackedRgba::rgb(10, 30, 100),
                    PackedRgba::rgb(30, 180, 220),
                    PackedRgba::rgb(150, 255, 200),
                ],
                t,
            ),
            Self::Sunset => ramp(
                &[
                    PackedRgba::rgb(80, 20, 120),
                    PackedRgba::rgb(255, 50, 120),
                    PackedRgba::rgb(255, 150, 50),
                    PackedRgba::rgb(255, 255, 150),
                ],
                t,
            ),
            Self::Neon => hsv_to_rgb(t * 360.0, 0.92, 1.0),
        }
    }
}

/// Evenly spaced stops; `stops.len() >= 2`.
fn ramp(stops: &[PackedRgba], t: f64) -> PackedRgba {
    debug_assert!(stops.len() >= 2);
    let segments = (stops.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(stops.len() - 2);
    stops[idx].lerp(stops[idx + 1], pos - idx as f64)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> PackedRgba {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    PackedRgba::rgb(to_u8(r), to_u8(g), to_u8(b))
}

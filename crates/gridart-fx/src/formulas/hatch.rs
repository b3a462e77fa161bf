#![forbid(unsafe_code)]

//! Line hatching whose density grows with distance from the pointer.
//!
//! Each cell gets a coverage `c = d / reach` (saturating) and a line count
//! interpolated from `[count_min, count_max]` by `c`. Lines run along the
//! bearing to the pointer rotated by the angle; the cell's intensity is the
//! stripe profile across that direction:
//!
//! ```text
//! θ = φ + angle
//! s = y cos θ - x sin θ
//! v = c * (0.5 + 0.5 cos(2π (count * s / reach + jitter * u)))
//! ```
//!
//! Uniform noise `u` shifts the stripe phase. The pointer cell has coverage 0,
//! so the value there is exactly 0.0 (no lines).

use super::{FieldBasis, GridFormula, ParamError, polar_about, polar_cell};
use crate::interval::Interval;
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use ndarray::{Array2, Zip};
use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HatchFormula {
    /// Lines across the grid next to the pointer (>= 0).
    pub count_min: f64,
    /// Lines across the grid at full distance (> `count_min`).
    pub count_max: f64,
    /// Stripe phase noise in turns (>= 0).
    pub jitter: f64,
}

impl Default for HatchFormula {
    fn default() -> Self {
        Self {
            count_min: 2.0,
            count_max: 24.0,
            jitter: 0.25,
        }
    }
}

impl HatchFormula {
    fn counts(&self) -> Interval {
        Interval::new(self.count_min, self.count_max).unwrap_or(Interval::UNIT)
    }

    #[inline]
    fn across(theta: f64, x: f64, y: f64) -> f64 {
        y * theta.cos() - x * theta.sin()
    }

    #[inline]
    fn stripe(coverage: f64, count: f64, across: f64, reach: f64, phase: f64) -> f64 {
        coverage * (0.5 + 0.5 * (TAU * (count * across / reach + phase)).cos())
    }
}

impl GridFormula for HatchFormula {
    fn name(&self) -> &'static str {
        "hatch"
    }

    fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("count_min", self.count_min),
            ("count_max", self.count_max),
            ("jitter", self.jitter),
        ]
    }

    fn validate(&self) -> Result<(), ParamError> {
        let name = self.name();
        ParamError::check(
            name,
            "count_min",
            self.count_min,
            self.count_min >= 0.0,
            ">= 0",
        )?;
        Interval::new(self.count_min, self.count_max).map_err(|source| ParamError::Range {
            formula: name,
            source,
        })?;
        ParamError::check(name, "jitter", self.jitter, self.jitter >= 0.0, ">= 0")
    }

    fn noise_kind(&self) -> NoiseKind {
        NoiseKind::Uniform
    }

    fn evaluate(
        &self,
        grid: &Grid,
        input: &InputSnapshot,
        noise: &Array2<f64>,
        basis: &FieldBasis,
    ) -> Array2<f64> {
        let reach = basis.reach();
        let distance = Interval::new(0.0, reach).unwrap_or(Interval::UNIT);
        let polar = polar_about(grid, input.pointer);
        let coverage = distance.normalize_all(&polar.dist);
        let count = self.counts().lerp_all(&coverage);
        let across = Zip::from(&polar.bearing)
            .and(grid.xs())
            .and(grid.ys())
            .map_collect(|&phi, &x, &y| Self::across(phi + input.angle, x, y));

        Zip::from(&coverage)
            .and(&count)
            .and(&across)
            .and(noise)
            .map_collect(|&c, &n, &s, &u| Self::stripe(c, n, s, reach, self.jitter * u))
    }

    fn reference(
        &self,
        x: f64,
        y: f64,
        resolution: Resolution,
        input: &InputSnapshot,
        u: f64,
    ) -> f64 {
        let reach = resolution.diagonal();
        let (d, phi) = polar_cell(x, y, input.pointer);
        let coverage = Interval::new(0.0, reach).unwrap_or(Interval::UNIT).normalize(d);
        let count = self.counts().lerp(coverage);
        let across = Self::across(phi + input.angle, x, y);
        Self::stripe(coverage, count, across, reach, self.jitter * u)
    }
}

#![forbid(unsafe_code)]

//! Inverse-distance spokes.
//!
//! `v = strength / d * (0.5 + 0.5 cos(spokes * (φ - angle))) + jitter * (u - 0.5)`
//!
//! Unbounded near the pointer and non-finite on it: a pointer that sits exactly
//! on a cell centre yields an infinite (or NaN) value for that cell. Values far
//! outside [0, 1] are normal for this formula.

use super::{FieldBasis, GridFormula, ParamError, polar_about, polar_cell};
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ShatterFormula {
    pub strength: f64,
    pub spokes: f64,
    /// Noise amplitude (>= 0).
    pub jitter: f64,
}

impl Default for ShatterFormula {
    fn default() -> Self {
        Self {
            strength: 4.0,
            spokes: 5.0,
            jitter: 0.1,
        }
    }
}

impl GridFormula for ShatterFormula {
    fn name(&self) -> &'static str {
        "shatter"
    }

    fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("strength", self.strength),
            ("spokes", self.spokes),
            ("jitter", self.jitter),
        ]
    }

    fn validate(&self) -> Result<(), ParamError> {
        let name = self.name();
        ParamError::check(name, "strength", self.strength, true, "finite")?;
        ParamError::check(name, "spokes", self.spokes, self.spokes >= 0.0, ">= 0")?;
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
        _basis: &FieldBasis,
    ) -> Array2<f64> {
        let polar = polar_about(grid, input.pointer);
        let petals = polar
            .bearing
            .mapv(|phi| 0.5 + 0.5 * (self.spokes * (phi - input.angle)).cos());
        let burst = polar.dist.mapv(|d| self.strength / d);
        let grain = noise.mapv(|u| self.jitter * (u - 0.5));
        burst * &petals + &grain
    }

    fn reference(
        &self,
        x: f64,
        y: f64,
        _resolution: Resolution,
        input: &InputSnapshot,
        u: f64,
    ) -> f64 {
        let (d, phi) = polar_cell(x, y, input.pointer);
        self.strength / d * (0.5 + 0.5 * (self.spokes * (phi - input.angle)).cos())
            + self.jitter * (u - 0.5)
    }
}

#![forbid(unsafe_code)]

//! Radial falloff around the pointer with angular spokes.
//!
//! ```text
//! t = d / reach
//! v = max(1 - t, 0)^falloff + t * (spoke_depth * cos(spokes * (φ - angle)) + jitter * (u - 0.5))
//! ```
//!
//! `d` and `φ` are the distance and bearing from the pointer, `reach` is the
//! grid diagonal and `u` is uniform noise. At the pointer `t = 0`, so the value
//! is exactly 1.0 (the maximum). Cells farther than `reach` get no falloff term.

use super::{FieldBasis, GridFormula, ParamError, polar_about, polar_cell};
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RadialFormula {
    /// Exponent of the falloff curve (> 0).
    pub falloff: f64,
    /// Number of spokes per turn.
    pub spokes: f64,
    /// Spoke amplitude, scaled by normalized distance.
    pub spoke_depth: f64,
    /// Noise amplitude, scaled by normalized distance (>= 0).
    pub jitter: f64,
}

impl Default for RadialFormula {
    fn default() -> Self {
        Self {
            falloff: 2.0,
            spokes: 6.0,
            spoke_depth: 0.15,
            jitter: 0.05,
        }
    }
}

impl GridFormula for RadialFormula {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn params(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("falloff", self.falloff),
            ("spokes", self.spokes),
            ("spoke_depth", self.spoke_depth),
            ("jitter", self.jitter),
        ]
    }

    fn validate(&self) -> Result<(), ParamError> {
        let name = self.name();
        ParamError::check(name, "falloff", self.falloff, self.falloff > 0.0, "> 0")?;
        ParamError::check(name, "spokes", self.spokes, self.spokes >= 0.0, ">= 0")?;
        ParamError::check(name, "spoke_depth", self.spoke_depth, true, "finite")?;
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
        let polar = polar_about(grid, input.pointer);
        let t = polar.dist / basis.reach();
        let core = t.mapv(|t| (1.0 - t).max(0.0).powf(self.falloff));
        let spokes = polar
            .bearing
            .mapv(|phi| self.spoke_depth * (self.spokes * (phi - input.angle)).cos());
        let grain = noise.mapv(|u| self.jitter * (u - 0.5));
        core + &(&t * &(spokes + &grain))
    }

    fn reference(
        &self,
        x: f64,
        y: f64,
        resolution: Resolution,
        input: &InputSnapshot,
        u: f64,
    ) -> f64 {
        let (d, phi) = polar_cell(x, y, input.pointer);
        let t = d / resolution.diagonal();
        let spoke = self.spoke_depth * (self.spokes * (phi - input.angle)).cos();
        (1.0 - t).max(0.0).powf(self.falloff) + t * (spoke + self.jitter * (u - 0.5))
    }
}

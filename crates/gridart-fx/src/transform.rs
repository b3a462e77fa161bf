#![forbid(unsafe_code)]

//! One frame of the grid transformation.
//!
//! [`GridTransform::apply`] evaluates the selected formula over the whole grid,
//! rejects non-finite cells, then maps the remaining raw values into [0, 1]
//! with the [`OutOfRangePolicy`]. It never substitutes values for broken
//! cells; that is the caller's decision via [`NumericFault::repair`].

use crate::cache::CacheKey;
use crate::formulas::{FieldBasis, FormulaKind};
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use gridart_render::Frame;
use ndarray::Array2;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How raw values outside [0, 1] are brought into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum OutOfRangePolicy {
    #[default]
    Clamp,
    /// Euclidean remainder modulo 1, result in [0, 1).
    Wrap,
}

impl OutOfRangePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "clamp" => Some(Self::Clamp),
            "wrap" => Some(Self::Wrap),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Wrap => "wrap",
        }
    }

    /// Map one finite raw value.
    #[inline]
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Clamp => raw.clamp(0.0, 1.0),
            Self::Wrap => {
                // rem_euclid may round up to exactly 1.0 for tiny negative inputs.
                let r = raw.rem_euclid(1.0);
                if r >= 1.0 { 0.0 } else { r }
            }
        }
    }
}

/// Non-finite cells in a computed field.
///
/// `field` holds range-mapped values for every finite cell and the original
/// non-finite value for each of the `cells` faulty ones.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFault {
    field: Array2<f64>,
    cells: usize,
}

impl NumericFault {
    /// Number of non-finite cells.
    #[inline]
    pub fn cells(&self) -> usize {
        self.cells
    }

    #[inline]
    pub fn field(&self) -> &Array2<f64> {
        &self.field
    }

    /// Replace every non-finite cell with `fallback`.
    pub fn repair(mut self, fallback: f64) -> Frame {
        self.field.mapv_inplace(|v| if v.is_finite() { v } else { fallback });
        Frame::new(self.field).with_repaired(self.cells)
    }
}

impl fmt::Display for NumericFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.field.dim();
        write!(f, "{} of {} cells are not finite", self.cells, rows * cols)
    }
}

impl std::error::Error for NumericFault {}

/// The selected formula plus the range policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridTransform {
    formula: FormulaKind,
    policy: OutOfRangePolicy,
}

impl GridTransform {
    pub fn new(formula: FormulaKind, policy: OutOfRangePolicy) -> Self {
        Self { formula, policy }
    }

    #[inline]
    pub fn formula(&self) -> &FormulaKind {
        &self.formula
    }

    #[inline]
    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }

    pub fn set_formula(&mut self, formula: FormulaKind) {
        self.formula = formula;
    }

    pub fn set_policy(&mut self, policy: OutOfRangePolicy) {
        self.policy = policy;
    }

    #[inline]
    pub fn noise_kind(&self) -> NoiseKind {
        self.formula.formula().noise_kind()
    }

    /// Key of the formula's invariants on a grid of `resolution`.
    pub fn cache_key(&self, resolution: Resolution) -> CacheKey {
        CacheKey::for_formula(resolution, self.formula.formula())
    }

    pub fn precompute(&self, grid: &Grid) -> FieldBasis {
        self.formula.formula().precompute(grid)
    }

    /// Compute one frame.
    ///
    /// # Panics
    ///
    /// Panics if `noise` or `basis` were built for a different grid shape.
    pub fn apply(
        &self,
        grid: &Grid,
        input: &InputSnapshot,
        noise: &Array2<f64>,
        basis: &FieldBasis,
    ) -> Result<Frame, NumericFault> {
        assert_eq!(
            noise.dim(),
            grid.dim(),
            "noise sample shape differs from grid"
        );
        assert_eq!(
            basis.resolution(),
            grid.resolution(),
            "cached basis belongs to another grid"
        );

        let mut field = self.formula.formula().evaluate(grid, input, noise, basis);
        assert_eq!(
            field.dim(),
            grid.dim(),
            "{} returned a misshapen field",
            self.formula.name()
        );

        let policy = self.policy;
        let mut cells = 0usize;
        field.mapv_inplace(|raw| {
            if raw.is_finite() {
                policy.apply(raw)
            } else {
                cells += 1;
                raw
            }
        });

        if cells > 0 {
            Err(NumericFault { field, cells })
        } else {
            Ok(Frame::new(field))
        }
    }
}

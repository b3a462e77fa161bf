#![forbid(unsafe_code)]

//! Pluggable grid formulas.
//!
//! A formula maps base coordinates, one input snapshot and one noise sample to
//! a raw intensity per cell. Raw values may leave [0, 1] or be non-finite;
//! range policy and fault detection belong to [`GridTransform`].
//!
//! Each formula provides two evaluations of the same mathematics:
//! - [`GridFormula::evaluate`], whole-array and used for rendering;
//! - [`GridFormula::reference`], one cell at a time, used to check the former.
//!
//! [`GridTransform`]: crate::transform::GridTransform

mod hatch;
mod plasma;
mod radial;
mod shatter;

pub use hatch::HatchFormula;
pub use plasma::PlasmaFormula;
pub use radial::RadialFormula;
pub use shatter::ShatterFormula;

use crate::interval::IntervalError;
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use ndarray::{Array2, Zip};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Input-invariant arrays for one formula on one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBasis {
    resolution: Resolution,
    reach: f64,
    layers: Vec<Array2<f64>>,
}

impl FieldBasis {
    /// # Panics
    ///
    /// Panics if any layer's shape differs from `resolution`.
    pub fn new(resolution: Resolution, layers: Vec<Array2<f64>>) -> Self {
        for (i, layer) in layers.iter().enumerate() {
            assert_eq!(
                layer.dim(),
                resolution.dim(),
                "basis layer {i} does not match grid {resolution}"
            );
        }
        Self {
            resolution,
            reach: resolution.diagonal(),
            layers,
        }
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Grid diagonal; the distance scale shared by all formulas.
    #[inline]
    pub fn reach(&self) -> f64 {
        self.reach
    }

    #[inline]
    pub fn layers(&self) -> &[Array2<f64>] {
        &self.layers
    }
}

/// A static formula parameter outside its valid range.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    Invalid {
        formula: &'static str,
        param: &'static str,
        value: f64,
        expected: &'static str,
    },
    Range {
        formula: &'static str,
        source: IntervalError,
    },
}

impl ParamError {
    pub(crate) fn check(
        formula: &'static str,
        param: &'static str,
        value: f64,
        ok: bool,
        expected: &'static str,
    ) -> Result<(), Self> {
        if ok && value.is_finite() {
            Ok(())
        } else {
            Err(Self::Invalid {
                formula,
                param,
                value,
                expected,
            })
        }
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid {
                formula,
                param,
                value,
                expected,
            } => write!(
                f,
                "{formula}: {param} = {value} is invalid (expected {expected})"
            ),
            Self::Range { formula, source } => write!(f, "{formula}: {source}"),
        }
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Range { source, .. } => Some(source),
            Self::Invalid { .. } => None,
        }
    }
}

/// Strategy for one family of patterns.
///
/// Implementations are pure: the output depends only on the arguments and on
/// the formula's own static parameters.
pub trait GridFormula: Send + Sync {
    fn name(&self) -> &'static str;

    /// Static parameters in a fixed order. Every value here is part of the cache key.
    fn params(&self) -> Vec<(&'static str, f64)>;

    fn validate(&self) -> Result<(), ParamError>;

    fn noise_kind(&self) -> NoiseKind;

    /// Input-invariant work for `grid`.
    fn precompute(&self, grid: &Grid) -> FieldBasis {
        FieldBasis::new(grid.resolution(), Vec::new())
    }

    /// Raw field for every cell.
    fn evaluate(
        &self,
        grid: &Grid,
        input: &InputSnapshot,
        noise: &Array2<f64>,
        basis: &FieldBasis,
    ) -> Array2<f64>;

    /// Raw value of the cell at base coordinate `(x, y)`.
    fn reference(
        &self,
        x: f64,
        y: f64,
        resolution: Resolution,
        input: &InputSnapshot,
        noise: f64,
    ) -> f64;
}

/// Selected formula with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "kebab-case")
)]
pub enum FormulaKind {
    Radial(RadialFormula),
    Plasma(PlasmaFormula),
    Hatch(HatchFormula),
    Shatter(ShatterFormula),
}

impl FormulaKind {
    pub const NAMES: [&'static str; 4] = ["radial", "plasma", "hatch", "shatter"];

    /// Every formula with default parameters, in [`NAMES`](Self::NAMES) order.
    pub fn defaults() -> [Self; 4] {
        [
            Self::Radial(RadialFormula::default()),
            Self::Plasma(PlasmaFormula::default()),
            Self::Hatch(HatchFormula::default()),
            Self::Shatter(ShatterFormula::default()),
        ]
    }

    /// Formula with default parameters by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::defaults().into_iter().find(|k| k.name() == name)
    }

    pub fn formula(&self) -> &dyn GridFormula {
        match self {
            Self::Radial(f) => f,
            Self::Plasma(f) => f,
            Self::Hatch(f) => f,
            Self::Shatter(f) => f,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.formula().name()
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        self.formula().validate()
    }
}

impl Default for FormulaKind {
    fn default() -> Self {
        Self::Radial(RadialFormula::default())
    }
}

/// Distance and bearing of every cell relative to the pointer.
pub(crate) struct Polar {
    pub dist: Array2<f64>,
    pub bearing: Array2<f64>,
}

pub(crate) fn polar_about(grid: &Grid, (px, py): (f64, f64)) -> Polar {
    let dx = grid.xs().mapv(|x| x - px);
    let dy = grid.ys().mapv(|y| y - py);
    Polar {
        dist: Zip::from(&dx).and(&dy).map_collect(|&dx, &dy| dx.hypot(dy)),
        bearing: Zip::from(&dy).and(&dx).map_collect(|&dy, &dx| dy.atan2(dx)),
    }
}

/// Scalar counterpart of [`polar_about`].
#[inline]
pub(crate) fn polar_cell(x: f64, y: f64, (px, py): (f64, f64)) -> (f64, f64) {
    let (dx, dy) = (x - px, y - py);
    (dx.hypot(dy), dy.atan2(dx))
}

#![forbid(unsafe_code)]

//! Batched grid transformation.
//!
//! Every frame is one whole-array evaluation of a [`GridFormula`] over the
//! grid's base coordinates, parameterized by an [`InputSnapshot`] and a
//! [`RandomField`] sample. Work that depends only on the grid and the formula's
//! static parameters is computed once into a [`FieldBasis`] and kept in a
//! [`FrameCache`] under a [`CacheKey`].
//!
//! Pipeline for one frame:
//!
//! ```text
//! InputSnapshot ─┐
//! noise sample ──┼─► GridTransform::apply ─► raw field ─► fault check ─► range policy ─► Frame
//! FieldBasis ────┘
//! ```
//!
//! [`InputSnapshot`]: gridart_core::InputSnapshot

pub mod cache;
pub mod formulas;
pub mod interval;
pub mod random_field;
pub mod transform;

pub use cache::{CacheKey, CacheStats, FrameCache};
pub use formulas::{
    FieldBasis, FormulaKind, GridFormula, HatchFormula, ParamError, PlasmaFormula, RadialFormula,
    ShatterFormula,
};
pub use interval::{Interval, IntervalError};
pub use random_field::{NoiseKey, NoiseKind, RandomField, SeedPolicy, mix_seed};
pub use transform::{GridTransform, NumericFault, OutOfRangePolicy};

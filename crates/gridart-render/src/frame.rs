#![forbid(unsafe_code)]

//! Finished intensity field for one tick.

use gridart_core::Resolution;
use ndarray::Array2;

/// One rendered frame: an intensity in [0, 1] per grid cell.
///
/// The shape always equals the grid shape it was computed for. Ownership
/// moves to the presenter; the render loop keeps nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: u64,
    values: Array2<f64>,
    repaired: usize,
}

impl Frame {
    /// Wrap a computed field. The frame index starts at 0 and is stamped by the loop.
    pub fn new(values: Array2<f64>) -> Self {
        Self {
            index: 0,
            values,
            repaired: 0,
        }
    }

    /// Frame where every cell holds `value` (used as the panic fallback).
    pub fn filled(resolution: Resolution, value: f64) -> Self {
        Self::new(Array2::from_elem(resolution.dim(), value))
    }

    /// Set the frame index.
    #[must_use]
    pub fn stamp(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    /// Record how many cells were replaced by the fallback value.
    #[must_use]
    pub fn with_repaired(mut self, repaired: usize) -> Self {
        self.repaired = repaired;
        self
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    pub fn repaired(&self) -> usize {
        self.repaired
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        let (rows, cols) = self.dim();
        Resolution::new(rows, cols)
    }

    #[inline]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Intensity at `(row, col)`, or `None` outside the frame.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Smallest and largest intensity. `None` for an empty frame.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Mean intensity (0.0 for an empty frame).
    pub fn mean(&self) -> f64 {
        self.values.mean().unwrap_or(0.0)
    }
}

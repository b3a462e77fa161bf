#![forbid(unsafe_code)]

//! Grid geometry.
//!
//! A [`Grid`] is fixed at startup from a [`Resolution`] and never resized.
//! Cell `(row, col)` has base coordinate `x = col`, `y = row`, which is also
//! the coordinate space pointer events arrive in.

use ndarray::Array2;
use std::fmt;

/// Upper bound on `rows * cols` accepted for a session (2048 x 2048).
pub const MAX_CELLS: usize = 4_194_304;

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub rows: usize,
    pub cols: usize,
}

impl Resolution {
    #[inline]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of cells (saturating).
    #[inline]
    pub const fn cells(self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// `(rows, cols)`, the ndarray shape of every per-cell array.
    #[inline]
    pub const fn dim(self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Non-empty and within [`MAX_CELLS`].
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.rows > 0 && self.cols > 0 && self.cells() <= MAX_CELLS
    }

    /// Geometric center in base coordinates `(x, y)`.
    #[inline]
    pub fn center(self) -> (f64, f64) {
        (
            self.cols.saturating_sub(1) as f64 / 2.0,
            self.rows.saturating_sub(1) as f64 / 2.0,
        )
    }

    /// Length of the grid diagonal, floored at 1.0 so it is always a safe divisor.
    #[inline]
    pub fn diagonal(self) -> f64 {
        let w = self.cols.saturating_sub(1) as f64;
        let h = self.rows.saturating_sub(1) as f64;
        w.hypot(h).max(1.0)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Immutable base-coordinate grid.
///
/// Holds one array of x coordinates and one of y coordinates, both shaped
/// `(rows, cols)`. Formulas read these as whole arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    resolution: Resolution,
    xs: Array2<f64>,
    ys: Array2<f64>,
}

impl Grid {
    /// Build the grid for `resolution`.
    ///
    /// # Panics
    ///
    /// Panics if the resolution is empty or exceeds [`MAX_CELLS`]. Resolutions
    /// are validated with the rest of the configuration before a grid is built.
    pub fn new(resolution: Resolution) -> Self {
        assert!(
            resolution.is_valid(),
            "grid resolution {resolution} must be non-empty and at most {MAX_CELLS} cells"
        );
        let dim = resolution.dim();
        Self {
            resolution,
            xs: Array2::from_shape_fn(dim, |(_, col)| col as f64),
            ys: Array2::from_shape_fn(dim, |(row, _)| row as f64),
        }
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.resolution.dim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resolution.cells()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base x coordinate of every cell.
    #[inline]
    pub fn xs(&self) -> &Array2<f64> {
        &self.xs
    }

    /// Base y coordinate of every cell.
    #[inline]
    pub fn ys(&self) -> &Array2<f64> {
        &self.ys
    }

    /// Base coordinate `(x, y)` of cell `(row, col)`.
    #[inline]
    pub fn base_coordinate(&self, row: usize, col: usize) -> (f64, f64) {
        (self.xs[[row, col]], self.ys[[row, col]])
    }
}

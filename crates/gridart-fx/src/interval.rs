#![forbid(unsafe_code)]

//! Closed numeric intervals and mapping to and from the unit interval.

use ndarray::Array2;
use std::fmt;

/// Why an interval was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalError {
    NonFinite { lo: f64, hi: f64 },
    /// `lo >= hi`.
    Empty { lo: f64, hi: f64 },
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { lo, hi } => write!(f, "interval bounds must be finite: [{lo}, {hi}]"),
            Self::Empty { lo, hi } => write!(
                f,
                "interval lower bound must be below upper bound: [{lo}, {hi}]"
            ),
        }
    }
}

impl std::error::Error for IntervalError {}

/// `[lo, hi]` with `lo < hi`, both finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    pub const UNIT: Self = Self { lo: 0.0, hi: 1.0 };

    pub fn new(lo: f64, hi: f64) -> Result<Self, IntervalError> {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(IntervalError::NonFinite { lo, hi });
        }
        if lo >= hi {
            return Err(IntervalError::Empty { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    #[inline]
    pub fn lo(&self) -> f64 {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Position of `value` inside the interval, saturating to [0, 1].
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.lo) / self.width()).clamp(0.0, 1.0)
    }

    /// Inverse of [`normalize`](Self::normalize) for `t` in [0, 1]. Not clamped.
    #[inline]
    pub fn lerp(&self, t: f64) -> f64 {
        t * self.width() + self.lo
    }

    pub fn normalize_all(&self, values: &Array2<f64>) -> Array2<f64> {
        values.mapv(|v| self.normalize(v))
    }

    pub fn lerp_all(&self, ts: &Array2<f64>) -> Array2<f64> {
        ts.mapv(|t| self.lerp(t))
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::UNIT
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rejects_empty_and_non_finite() {
        assert_eq!(
            Interval::new(1.0, 1.0),
            Err(IntervalError::Empty { lo: 1.0, hi: 1.0 })
        );
        assert!(matches!(Interval::new(2.0, 1.0), Err(IntervalError::Empty { .. })));
        assert!(matches!(
            Interval::new(f64::NAN, 1.0),
            Err(IntervalError::NonFinite { .. })
        ));
        assert!(matches!(
            Interval::new(0.0, f64::INFINITY),
            Err(IntervalError::NonFinite { .. })
        ));
    }

    #[test]
    fn normalize_saturates() {
        let iv = Interval::new(10.0, 20.0).unwrap();
        assert_eq!(iv.normalize(10.0), 0.0);
        assert_eq!(iv.normalize(15.0), 0.5);
        assert_eq!(iv.normalize(20.0), 1.0);
        assert_eq!(iv.normalize(-5.0), 0.0);
        assert_eq!(iv.normalize(99.0), 1.0);
    }

    #[test]
    fn lerp_inverts_normalize() {
        let iv = Interval::new(0.0, 150.0).unwrap();
        for v in [0.0, 1.0, 42.5, 150.0] {
            assert!((iv.lerp(iv.normalize(v)) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn whole_array_helpers() {
        let iv = Interval::new(-1.0, 1.0).unwrap();
        let out = iv.normalize_all(&array![[-1.0, 0.0], [1.0, 3.0]]);
        assert_eq!(out, array![[0.0, 0.5], [1.0, 1.0]]);
        assert_eq!(iv.lerp_all(&out), array![[-1.0, 0.0], [1.0, 1.0]]);
    }
}

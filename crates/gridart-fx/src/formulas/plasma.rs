#![forbid(unsafe_code)]

//! Six-wave plasma interference steered by the pointer and the angle.
//!
//! Coordinates are normalized to `[0, 1)` per axis and scaled into wave space
//! (`scale`, 6 by default). The angle plays the role of time:
//!
//! ```text
//! v1 = sin(1.5x + a)            v4 = sin(2|p - p_ptr| - 1.2a)
//! v2 = sin(1.8y + 0.8a)         v5 = cos(1.8|p - c| + a)
//! v3 = sin(1.2(x + y) + 0.6a)   v6 = sin(sin 2x · cos 2y + 0.5a)
//!
//! v = ((v1 + … + v6) / 6 · breath(a) + 1) / 2 + jitter · n
//! ```
//!
//! Only `v4` depends on the pointer. The other five are expanded with the
//! angle-sum identities so their position-only sine and cosine planes can be
//! computed once and cached.

use super::{FieldBasis, GridFormula, ParamError};
use crate::random_field::NoiseKind;
use gridart_core::{Grid, InputSnapshot, Resolution};
use ndarray::{Array2, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const LAYERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PlasmaFormula {
    /// Wave-space extent of each axis (> 0).
    pub scale: f64,
    /// Amplitude of the normal noise term (>= 0).
    pub jitter: f64,
}

impl Default for PlasmaFormula {
    fn default() -> Self {
        Self {
            scale: 6.0,
            jitter: 0.02,
        }
    }
}

impl PlasmaFormula {
    #[inline]
    fn wave_coords(&self, x: f64, y: f64, resolution: Resolution) -> (f64, f64) {
        (
            x / resolution.cols as f64 * self.scale,
            y / resolution.rows as f64 * self.scale,
        )
    }

    #[inline]
    fn breath(angle: f64) -> f64 {
        0.85 + 0.15 * (angle * 0.3).sin()
    }
}

impl GridFormula for PlasmaFormula {
    fn name(&self) -> &'static str {
        "plasma"
    }

    fn params(&self) -> Vec<(&'static str, f64)> {
        vec![("scale", self.scale), ("jitter", self.jitter)]
    }

    fn validate(&self) -> Result<(), ParamError> {
        ParamError::check(self.name(), "scale", self.scale, self.scale > 0.0, "> 0")?;
        ParamError::check(self.name(), "jitter", self.jitter, self.jitter >= 0.0, ">= 0")
    }

    fn noise_kind(&self) -> NoiseKind {
        NoiseKind::Normal
    }

    fn precompute(&self, grid: &Grid) -> FieldBasis {
        let resolution = grid.resolution();
        let mid = self.scale / 2.0;
        let waves = Zip::from(grid.xs())
            .and(grid.ys())
            .map_collect(|&x, &y| self.wave_coords(x, y, resolution));
        let plane = |f: fn(f64, f64, f64) -> f64| waves.mapv(|(x, y)| f(x, y, mid));

        let layers = vec![
            plane(|x, _, _| (x * 1.5).sin()),
            plane(|x, _, _| (x * 1.5).cos()),
            plane(|_, y, _| (y * 1.8).sin()),
            plane(|_, y, _| (y * 1.8).cos()),
            plane(|x, y, _| ((x + y) * 1.2).sin()),
            plane(|x, y, _| ((x + y) * 1.2).cos()),
            plane(|x, y, m| ((x - m).hypot(y - m) * 1.8).sin()),
            plane(|x, y, m| ((x - m).hypot(y - m) * 1.8).cos()),
            plane(|x, y, _| ((x * 2.0).sin() * (y * 2.0).cos()).sin()),
            plane(|x, y, _| ((x * 2.0).sin() * (y * 2.0).cos()).cos()),
        ];
        debug_assert_eq!(layers.len(), LAYERS);
        FieldBasis::new(resolution, layers)
    }

    fn evaluate(
        &self,
        grid: &Grid,
        input: &InputSnapshot,
        noise: &Array2<f64>,
        basis: &FieldBasis,
    ) -> Array2<f64> {
        let resolution = grid.resolution();
        let a = input.angle;
        let [s1, c1, s2, c2, s3, c3, s5, c5, s6, c6] = basis.layers() else {
            panic!(
                "plasma basis needs {LAYERS} layers, got {}",
                basis.layers().len()
            );
        };

        let (sin1, cos1) = a.sin_cos();
        let (sin2, cos2) = (a * 0.8).sin_cos();
        let (sin3, cos3) = (a * 0.6).sin_cos();
        let (sin6, cos6) = (a * 0.5).sin_cos();

        // sin(u + a) = sin u cos a + cos u sin a; cos(u + a) = cos u cos a - sin u sin a
        let v1 = s1 * cos1 + &(c1 * sin1);
        let v2 = s2 * cos2 + &(c2 * sin2);
        let v3 = s3 * cos3 + &(c3 * sin3);
        let v5 = c5 * cos1 - &(s5 * sin1);
        let v6 = s6 * cos6 + &(c6 * sin6);

        let (pwx, pwy) = self.wave_coords(input.pointer.0, input.pointer.1, resolution);
        let v4 = Zip::from(grid.xs()).and(grid.ys()).map_collect(|&x, &y| {
            let (wx, wy) = self.wave_coords(x, y, resolution);
            ((wx - pwx).hypot(wy - pwy) * 2.0 - a * 1.2).sin()
        });

        let value = (v1 + &v2 + &v3 + &v4 + &v5 + &v6) / 6.0;
        let breath = Self::breath(a);
        Zip::from(&value)
            .and(noise)
            .map_collect(|&v, &n| (v * breath + 1.0) / 2.0 + self.jitter * n)
    }

    fn reference(
        &self,
        x: f64,
        y: f64,
        resolution: Resolution,
        input: &InputSnapshot,
        n: f64,
    ) -> f64 {
        let a = input.angle;
        let (x, y) = self.wave_coords(x, y, resolution);
        let (px, py) = self.wave_coords(input.pointer.0, input.pointer.1, resolution);
        let mid = self.scale / 2.0;

        let v1 = (x * 1.5 + a).sin();
        let v2 = (y * 1.8 + a * 0.8).sin();
        let v3 = ((x + y) * 1.2 + a * 0.6).sin();
        let v4 = ((x - px).hypot(y - py) * 2.0 - a * 1.2).sin();
        let v5 = ((x - mid).hypot(y - mid) * 1.8 + a).cos();
        let v6 = ((x * 2.0).sin() * (y * 2.0).cos() + a * 0.5).sin();

        let value = (v1 + v2 + v3 + v4 + v5 + v6) / 6.0;
        (value * Self::breath(a) + 1.0) / 2.0 + self.jitter * n
    }
}

#![forbid(unsafe_code)]

//! Run configuration.
//!
//! Layers, lowest precedence first: [`ArtConfig::default`], a JSON file
//! ([`ArtConfig::from_json_file`]), `GRIDART_*` environment variables
//! ([`ArtConfig::apply_env`]) and command-line flags. Every layer goes through
//! [`ArtConfig::set`] or serde, and the result is checked once with
//! [`ArtConfig::validate`] before the loop starts.

use gridart_core::{AngleRange, MAX_CELLS, Resolution};
use gridart_fx::{
    FormulaKind, Interval, IntervalError, OutOfRangePolicy, ParamError, SeedPolicy,
};
use gridart_render::ColorParseError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Highest accepted `target_fps`.
pub const MAX_FPS: u32 = 480;

/// Environment variables read by [`ArtConfig::apply_env`] and the
/// [`ArtConfig::set`] key each one feeds.
pub const ENV_KEYS: [(&str, &str); 6] = [
    ("GRIDART_FORMULA", "formula"),
    ("GRIDART_SEED", "seed"),
    ("GRIDART_SEED_POLICY", "seed-policy"),
    ("GRIDART_OUT_OF_RANGE", "out-of-range"),
    ("GRIDART_FPS", "fps"),
    ("GRIDART_NO_CACHE", "no-cache"),
];

#[derive(Debug)]
pub enum ConfigError {
    /// Empty grid or more than [`MAX_CELLS`] cells.
    Resolution { rows: usize, cols: usize },
    AngleRange(IntervalError),
    Param(ParamError),
    /// Fallback value not finite or outside [0, 1].
    Fallback(f64),
    TargetFps(u32),
    /// A name that does not match any formula, policy or palette.
    UnknownName { what: &'static str, value: String },
    /// A value that does not parse as the key's type.
    InvalidValue { key: String, value: String },
    UnknownKey(String),
    Color(ColorParseError),
    Read { path: PathBuf, source: io::Error },
    Parse {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution { rows, cols } => write!(
                f,
                "resolution {rows}x{cols} must be non-empty and at most {MAX_CELLS} cells"
            ),
            Self::AngleRange(e) => write!(f, "angle range: {e}"),
            Self::Param(e) => write!(f, "{e}"),
            Self::Fallback(v) => write!(f, "fallback {v} must be a finite value in [0, 1]"),
            Self::TargetFps(v) => write!(f, "target fps {v} must be in 1..={MAX_FPS}"),
            Self::UnknownName { what, value } => write!(f, "unknown {what} {value:?}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value {value:?} for {key}"),
            Self::UnknownKey(key) => write!(f, "unknown setting {key:?}"),
            Self::Color(e) => write!(f, "{e}"),
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "malformed config {}: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "malformed config: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AngleRange(e) => Some(e),
            Self::Param(e) => Some(e),
            Self::Color(e) => Some(e),
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<IntervalError> for ConfigError {
    fn from(e: IntervalError) -> Self {
        Self::AngleRange(e)
    }
}

impl From<ParamError> for ConfigError {
    fn from(e: ParamError) -> Self {
        Self::Param(e)
    }
}

impl From<ColorParseError> for ConfigError {
    fn from(e: ColorParseError) -> Self {
        Self::Color(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(source: serde_json::Error) -> Self {
        Self::Parse { path: None, source }
    }
}

/// Everything the render loop needs to know before the first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtConfig {
    pub rows: usize,
    pub cols: usize,
    pub formula: FormulaKind,
    pub seed_policy: SeedPolicy,
    pub seed: u64,
    pub out_of_range: OutOfRangePolicy,
    pub cache_enabled: bool,
    pub angle_min: f64,
    pub angle_max: f64,
    /// Substituted for non-finite cells, and for whole frames whose formula panicked.
    pub fallback: f64,
    pub target_fps: u32,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            rows: 48,
            cols: 120,
            formula: FormulaKind::default(),
            seed_policy: SeedPolicy::default(),
            seed: 0x5EED,
            out_of_range: OutOfRangePolicy::default(),
            cache_enabled: true,
            angle_min: -PI,
            angle_max: PI,
            fallback: 0.0,
            target_fps: 60,
        }
    }
}

impl ArtConfig {
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.rows, self.cols)
    }

    pub fn angle_range(&self) -> Result<AngleRange, ConfigError> {
        let checked = Interval::new(self.angle_min, self.angle_max)?;
        let empty = IntervalError::Empty {
            lo: self.angle_min,
            hi: self.angle_max,
        };
        AngleRange::new(checked.lo(), checked.hi()).ok_or(ConfigError::AngleRange(empty))
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolution().is_valid() {
            return Err(ConfigError::Resolution {
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.angle_range()?;
        self.formula.validate()?;
        if !(self.fallback.is_finite() && (0.0..=1.0).contains(&self.fallback)) {
            return Err(ConfigError::Fallback(self.fallback));
        }
        if !(1..=MAX_FPS).contains(&self.target_fps) {
            return Err(ConfigError::TargetFps(self.target_fps));
        }
        Ok(())
    }

    /// Parse a JSON document. Missing fields keep their defaults; unknown
    /// fields are rejected.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Apply one textual setting, as given on the command line or in the
    /// environment.
    ///
    /// Keys: `rows`, `cols`, `formula`, `seed`, `seed-policy`, `out-of-range`,
    /// `fps`, `fallback`, `no-cache`. Formula names select that formula with
    /// default parameters.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let unknown = |what: &'static str| ConfigError::UnknownName {
            what,
            value: value.to_string(),
        };
        match key {
            "rows" => self.rows = value.trim().parse().map_err(|_| invalid())?,
            "cols" => self.cols = value.trim().parse().map_err(|_| invalid())?,
            "fps" => self.target_fps = value.trim().parse().map_err(|_| invalid())?,
            "fallback" => self.fallback = value.trim().parse().map_err(|_| invalid())?,
            "seed" => self.seed = parse_seed(value).ok_or_else(invalid)?,
            "formula" => {
                self.formula = FormulaKind::from_name(value).ok_or_else(|| unknown("formula"))?;
            }
            "seed-policy" => {
                self.seed_policy =
                    SeedPolicy::from_name(value).ok_or_else(|| unknown("seed policy"))?;
            }
            "out-of-range" => {
                self.out_of_range = OutOfRangePolicy::from_name(value)
                    .ok_or_else(|| unknown("out-of-range policy"))?;
            }
            "no-cache" => self.cache_enabled = !parse_flag(value).ok_or_else(invalid)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Apply the `GRIDART_*` variables returned by `lookup` (normally
    /// `std::env::var`). Unset variables are skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in ENV_KEYS {
            if let Some(value) = lookup(var) {
                self.set(key, &value)?;
            }
        }
        Ok(())
    }
}

/// Decimal or `0x` hexadecimal.
fn parse_seed(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => text.replace('_', "").parse().ok(),
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridart_fx::{HatchFormula, PlasmaFormula};
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = ArtConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution(), Resolution::new(48, 120));
        assert_eq!(config.seed, 0x5EED);
        assert!(config.cache_enabled);
        assert_eq!(config.angle_range().unwrap(), AngleRange::default());
    }

    #[test]
    fn rejects_bad_resolution() {
        for (rows, cols) in [(0, 10), (10, 0), (4096, 4096)] {
            let config = ArtConfig {
                rows,
                cols,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Resolution { .. })),
                "{rows}x{cols}"
            );
        }
        let edge = ArtConfig {
            rows: 2048,
            cols: 2048,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn rejects_bad_angle_range() {
        let inverted = ArtConfig {
            angle_min: 1.0,
            angle_max: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::AngleRange(IntervalError::Empty { .. }))
        ));
        let open = ArtConfig {
            angle_max: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            open.validate(),
            Err(ConfigError::AngleRange(IntervalError::NonFinite { .. }))
        ));
    }

    #[test]
    fn rejects_bad_fallback_and_fps() {
        for fallback in [-0.1, 1.5, f64::NAN] {
            let config = ArtConfig {
                fallback,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Fallback(_))));
        }
        for target_fps in [0, MAX_FPS + 1] {
            let config = ArtConfig {
                target_fps,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::TargetFps(_))));
        }
    }

    #[test]
    fn rejects_bad_formula_params() {
        let config = ArtConfig {
            formula: FormulaKind::Hatch(HatchFormula {
                count_min: 30.0,
                count_max: 3.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Param(_)));
        assert!(err.to_string().contains("hatch"));
    }

    #[test]
    fn json_fills_missing_fields() {
        let json = r#"{
            "rows": 10,
            "formula": { "kind": "plasma", "scale": 3.0 },
            "out_of_range": "wrap"
        }"#;
        let config = ArtConfig::from_json_str(json).unwrap();
        assert_eq!(config.rows, 10);
        assert_eq!(config.cols, 120);
        assert_eq!(config.out_of_range, OutOfRangePolicy::Wrap);
        assert_eq!(
            config.formula,
            FormulaKind::Plasma(PlasmaFormula {
                scale: 3.0,
                ..Default::default()
            })
        );
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let err = ArtConfig::from_json_str(r#"{ "colour": "red" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn json_round_trips_defaults() {
        let text = serde_json::to_string(&ArtConfig::default()).unwrap();
        assert_eq!(ArtConfig::from_json_str(&text).unwrap(), ArtConfig::default());
    }

    #[test]
    fn set_parses_each_key() {
        let mut config = ArtConfig::default();
        config.set("rows", "12").unwrap();
        config.set("cols", " 34 ").unwrap();
        config.set("formula", "Shatter").unwrap();
        config.set("seed", "0xff").unwrap();
        config.set("seed-policy", "held").unwrap();
        config.set("out-of-range", "wrap").unwrap();
        config.set("fps", "30").unwrap();
        config.set("fallback", "0.25").unwrap();
        config.set("no-cache", "").unwrap();
        assert_eq!(config.resolution(), Resolution::new(12, 34));
        assert_eq!(config.formula.name(), "shatter");
        assert_eq!(config.seed, 255);
        assert_eq!(config.seed_policy, SeedPolicy::Held);
        assert_eq!(config.out_of_range, OutOfRangePolicy::Wrap);
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.fallback, 0.25);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn set_reports_what_failed() {
        let mut config = ArtConfig::default();
        assert!(matches!(
            config.set("rows", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("formula", "spiral"),
            Err(ConfigError::UnknownName {
                what: "formula",
                ..
            })
        ));
        assert!(matches!(
            config.set("out-of-range", "mirror"),
            Err(ConfigError::UnknownName { .. })
        ));
        assert!(matches!(config.set("depth", "3"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            config.set("no-cache", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config, ArtConfig::default());
    }

    #[test]
    fn env_overrides_only_set_variables() {
        let vars: HashMap<&str, &str> = [
            ("GRIDART_FORMULA", "hatch"),
            ("GRIDART_FPS", "24"),
            ("GRIDART_NO_CACHE", "0"),
        ]
        .into();
        let mut config = ArtConfig::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.formula.name(), "hatch");
        assert_eq!(config.target_fps, 24);
        assert!(config.cache_enabled);
        assert_eq!(config.seed, 0x5EED);
    }

    #[test]
    fn seed_formats() {
        assert_eq!(parse_seed("42"), Some(42));
        assert_eq!(parse_seed("0x5EED"), Some(0x5EED));
        assert_eq!(parse_seed("1_000"), Some(1000));
        assert_eq!(parse_seed("-1"), None);
        assert_eq!(parse_seed("0xzz"), None);
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = ConfigError::Resolution { rows: 0, cols: 3 };
        assert!(err.to_string().contains("0x3"));
        let err = ConfigError::UnknownName {
            what: "palette",
            value: "pastel".into(),
        };
        assert_eq!(err.to_string(), "unknown palette \"pastel\"");
    }
}

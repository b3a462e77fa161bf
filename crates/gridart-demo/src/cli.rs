#![forbid(unsafe_code)]

//! Command-line argument parsing for the gridart demo.
//!
//! Parses args manually (no external dependencies). Settings come from, in
//! increasing precedence: built-in defaults, a JSON config file
//! (`GRIDART_CONFIG` or `--config=`), `GRIDART_*` environment variables and
//! command-line flags.

use gridart_render::{PackedRgba, Palette, parse_color};
use gridart_runtime::{ArtConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
gridart - interactive generative grid art in the terminal

USAGE:
    gridart [OPTIONS]

OPTIONS:
    --config=PATH        JSON config file (fields as in ArtConfig)
    --rows=N             Grid rows (default: twice the terminal height)
    --cols=N             Grid columns (default: terminal width)
    --formula=NAME       radial | plasma | hatch | shatter
    --seed=N             Base seed, decimal or 0x hex
    --seed-policy=NAME   per-frame | held
    --out-of-range=NAME  clamp | wrap
    --no-cache           Recompute formula invariants every frame
    --fps=N              Target frames per second (1-480)
    --palette=NAME       mono | fire | ocean | sunset | neon
    --low=R,G,B          Duotone colour for 0.0
    --high=R,G,B         Duotone colour for 1.0
    --frames=N           Stop after N frames
    --headless           Render without a terminal and print a summary
    --log=PATH           Write logs to PATH
    --help, -h           Show this help message
    --version, -V        Show version

KEYS:
    mouse           Move the pointer
    Left / Right    Angle -/+ 2 degrees
    Up / Down       Angle +/- 15 degrees
    1-4             radial, plasma, hatch, shatter
    c / w           Clamp / wrap out-of-range values
    s               Toggle per-frame / held noise
    r               Reseed
    q / Esc / Ctrl+C  Quit

ENVIRONMENT VARIABLES:
    GRIDART_CONFIG          Config file, overridden by --config
    GRIDART_FORMULA         Override the formula
    GRIDART_SEED            Override the seed
    GRIDART_SEED_POLICY     Override the seed policy
    GRIDART_OUT_OF_RANGE    Override the range policy
    GRIDART_FPS             Override the target fps
    GRIDART_NO_CACHE        Disable the basis cache (1/true)
    GRIDART_LOG             Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    pub config: ArtConfig,
    /// Size the grid from the terminal (no `--rows`, `--cols` or config file).
    pub size_from_terminal: bool,
    pub palette: Palette,
    pub frame_limit: Option<u64>,
    pub headless: bool,
    pub log: Option<PathBuf>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: ArtConfig::default(),
            size_from_terminal: true,
            palette: Palette::default(),
            frame_limit: None,
            headless: false,
            log: None,
        }
    }
}

/// Outcome of parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Box<Opts>),
    Help,
    Version,
}

impl Opts {
    /// Parse the process arguments and environment.
    ///
    /// Prints help or version and exits 0 when asked to; reports a
    /// configuration error and exits 2.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match parse_from(&args, |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => *opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("gridart {VERSION}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("gridart: {e}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }
}

/// Parse `args` (without the program name) with environment lookups through `var`.
pub fn parse_from<F>(args: &[String], var: F) -> Result<Command, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        return Ok(Command::Version);
    }

    let mut opts = Opts::default();

    let config_path = args
        .iter()
        .rev()
        .find_map(|a| a.strip_prefix("--config="))
        .map(PathBuf::from)
        .or_else(|| {
            var("GRIDART_CONFIG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        });
    if let Some(path) = config_path {
        opts.config = ArtConfig::from_json_file(&path)?;
        opts.size_from_terminal = false;
    }
    opts.config.apply_env(&var)?;

    let mut palette_name: Option<String> = None;
    let mut low: Option<PackedRgba> = None;
    let mut high: Option<PackedRgba> = None;

    for arg in args {
        match arg.as_str() {
            "--no-cache" => opts.config.cache_enabled = false,
            "--headless" => opts.headless = true,
            other => {
                let Some((flag, value)) =
                    other.strip_prefix("--").and_then(|f| f.split_once('='))
                else {
                    return Err(ConfigError::UnknownKey(other.to_string()));
                };
                match flag {
                    "config" => {}
                    "rows" | "cols" => {
                        opts.config.set(flag, value)?;
                        opts.size_from_terminal = false;
                    }
                    "formula" | "seed" | "seed-policy" | "out-of-range" | "fps" | "fallback" => {
                        opts.config.set(flag, value)?;
                    }
                    "palette" => palette_name = Some(value.to_string()),
                    "low" => low = Some(parse_color(value)?),
                    "high" => high = Some(parse_color(value)?),
                    "frames" => {
                        let n = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                            key: flag.to_string(),
                            value: value.to_string(),
                        })?;
                        opts.frame_limit = Some(n);
                    }
                    "log" => opts.log = Some(PathBuf::from(value)),
                    _ => return Err(ConfigError::UnknownKey(other.to_string())),
                }
            }
        }
    }

    opts.palette = match (low, high, palette_name) {
        (None, None, None) => Palette::default(),
        (None, None, Some(name)) => Palette::from_name(&name).ok_or(ConfigError::UnknownName {
            what: "palette",
            value: name,
        })?,
        (low, high, _) => Palette::Duotone {
            low: low.unwrap_or(PackedRgba::BLACK),
            high: high.unwrap_or(PackedRgba::WHITE),
        },
    };

    Ok(Command::Run(Box::new(opts)))
}

#![forbid(unsafe_code)]

//! Tracing subscriber setup for the binary.
//!
//! The alternate screen owns stdout and stderr while the terminal front-end
//! runs, so interactive runs log only to a `--log` file.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "GRIDART_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `--log` wins; otherwise headless runs log to stderr and terminal runs not at all.
    pub fn choose(log: Option<PathBuf>, headless: bool) -> Self {
        match (log, headless) {
            (Some(path), _) => Self::File(path),
            (None, true) => Self::Stderr,
            (None, false) => Self::Off,
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Fails if the log file cannot be created or
/// a subscriber is already installed.
pub fn init(target: &LogTarget) -> io::Result<()> {
    let registry = tracing_subscriber::registry().with(filter());
    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .try_init(),
        LogTarget::File(path) => {
            let file = File::create(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };
    installed.map_err(io::Error::other)
}

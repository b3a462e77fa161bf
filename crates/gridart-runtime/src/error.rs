#![forbid(unsafe_code)]

use std::fmt;
use std::io;

/// Failure that ends a run.
///
/// Numeric faults and formula panics are handled inside the loop and never
/// show up here.
#[derive(Debug)]
pub enum RuntimeError {
    /// The presenter could not write frame `frame`.
    Present { frame: u64, source: io::Error },
}

impl RuntimeError {
    /// Index of the frame being presented when the run failed.
    pub fn frame(&self) -> u64 {
        match self {
            Self::Present { frame, .. } => *frame,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { frame, source } => {
                write!(f, "failed to present frame {frame}: {source}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Present { source, .. } => Some(source),
        }
    }
}

#![forbid(unsafe_code)]

//! Runtime for gridart: configuration, live controls and the frame loop.
//!
//! ```text
//! InputState ──snapshot──┐
//! Control (mpsc) ─drain──┤
//!                        ▼
//!   RenderLoop ── FrameCache<CacheKey, FieldBasis> ── RandomField
//!        │            GridTransform::apply
//!        ▼
//!   Presenter::present(frame) ── FrameBudget ── StopSignal::wait_timeout
//! ```

pub mod config;
pub mod error;
pub mod render_loop;
pub mod stop;

pub use config::{ArtConfig, ConfigError, ENV_KEYS, MAX_FPS};
pub use error::RuntimeError;
pub use render_loop::{Control, FrameOutcome, RenderLoop, RunSummary};
pub use stop::{StopSignal, StopTrigger};

#![forbid(unsafe_code)]

//! Render kernel: colours, frames, pacing budget and presentation.
//!
//! A [`Frame`] is the finished intensity field for one tick of the render
//! loop. It is handed by value to a [`Presenter`], which turns intensities into
//! pixels through a [`Palette`]. The loop never keeps a frame after presenting.

pub mod budget;
pub mod color;
pub mod frame;
pub mod palette;
pub mod present;

pub use budget::{BudgetTelemetry, FrameBudget};
pub use color::{ColorParseError, PackedRgba, parse_color};
pub use frame::Frame;
pub use palette::Palette;
pub use present::{HeadlessPresenter, PresentStats, Presenter};

#![forbid(unsafe_code)]

//! Core: grid geometry and live input state.
//!
//! # Role in gridart
//! `gridart-core` owns the two things every other crate agrees on: the shape
//! and base coordinates of the point grid ([`Grid`]), and the pointer/angle
//! record written by the host event system and read by the render loop
//! ([`InputState`]).

pub mod geometry;
pub mod input;

pub use geometry::{Grid, MAX_CELLS, Resolution};
pub use input::{AngleRange, InputEvent, InputSnapshot, InputState};

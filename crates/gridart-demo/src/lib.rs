#![forbid(unsafe_code)]

//! Terminal front-end for gridart.
//!
//! Two grid rows share one terminal cell (upper half block, foreground for
//! the top row, background for the bottom one). The mouse drives the
//! pointer, arrow keys the angle, and number keys switch formulas.

pub mod cli;
pub mod keys;
pub mod logging;
pub mod terminal;

#![forbid(unsafe_code)]

//! The seam between the render loop and whatever paints pixels.

use crate::frame::Frame;
use std::io;

/// Per-frame status shown next to the picture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentStats {
    /// Active formula name.
    pub formula: &'static str,
    pub angle: f64,
    /// Effective frames per second (moving average).
    pub fps: f64,
    /// Cells repaired with the fallback value since the loop started.
    pub repaired_total: u64,
}

impl Default for PresentStats {
    fn default() -> Self {
        Self {
            formula: "",
            angle: 0.0,
            fps: 0.0,
            repaired_total: 0,
        }
    }
}

/// Consumer of finished frames.
///
/// Called once per frame from the render thread. An `Err` is treated as an
/// unrecoverable output failure and ends the loop.
pub trait Presenter {
    fn present(&mut self, frame: Frame, stats: &PresentStats) -> io::Result<()>;
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(&mut self, frame: Frame, stats: &PresentStats) -> io::Result<()> {
        (**self).present(frame, stats)
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn present(&mut self, frame: Frame, stats: &PresentStats) -> io::Result<()> {
        (**self).present(frame, stats)
    }
}

/// Presenter with no output device.
///
/// Keeps counters and the most recent frame; optionally every frame
/// ([`HeadlessPresenter::capturing`]) or a simulated device failure
/// ([`HeadlessPresenter::failing_after`]).
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    presented: u64,
    last: Option<Frame>,
    last_stats: Option<PresentStats>,
    history: Option<Vec<Frame>>,
    fail_after: Option<u64>,
}

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain every presented frame in order.
    pub fn capturing() -> Self {
        Self {
            history: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Accept `n` frames, then fail every call with `BrokenPipe`.
    pub fn failing_after(n: u64) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// Number of frames accepted.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn last_stats(&self) -> Option<&PresentStats> {
        self.last_stats.as_ref()
    }

    /// Captured frames (empty unless built with [`HeadlessPresenter::capturing`]).
    pub fn frames(&self) -> &[Frame] {
        self.history.as_deref().unwrap_or(&[])
    }
}

impl Presenter for HeadlessPresenter {
    fn present(&mut self, frame: Frame, stats: &PresentStats) -> io::Result<()> {
        if self.fail_after.is_some_and(|n| self.presented >= n) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "headless output closed",
            ));
        }
        self.presented += 1;
        self.last_stats = Some(*stats);
        if let Some(history) = self.history.as_mut() {
            history.push(frame.clone());
        }
        self.last = Some(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridart_core::Resolution;

    fn frame(i: u64) -> Frame {
        Frame::filled(Resolution::new(2, 2), 0.5).stamp(i)
    }

    #[test]
    fn keeps_only_last_by_default() {
        let mut p = HeadlessPresenter::new();
        let stats = PresentStats {
            formula: "radial",
            ..PresentStats::default()
        };
        p.present(frame(0), &stats).unwrap();
        p.present(frame(1), &stats).unwrap();
        assert_eq!(p.presented(), 2);
        assert_eq!(p.last().map(Frame::index), Some(1));
        assert_eq!(p.last_stats().map(|s| s.formula), Some("radial"));
        assert!(p.frames().is_empty());
    }

    #[test]
    fn capturing_keeps_order() {
        let mut p = HeadlessPresenter::capturing();
        for i in 0..3 {
            p.present(frame(i), &PresentStats::default()).unwrap();
        }
        let idx: Vec<u64> = p.frames().iter().map(Frame::index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn failing_after_reports_broken_pipe() {
        let mut p = HeadlessPresenter::failing_after(1);
        assert!(p.present(frame(0), &PresentStats::default()).is_ok());
        let err = p.present(frame(1), &PresentStats::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(p.presented(), 1);
    }

    #[test]
    fn works_through_trait_objects() {
        let mut p = HeadlessPresenter::new();
        {
            let mut boxed: Box<dyn Presenter + '_> = Box::new(&mut p);
            boxed.present(frame(4), &PresentStats::default()).unwrap();
        }
        assert_eq!(p.presented(), 1);
    }
}

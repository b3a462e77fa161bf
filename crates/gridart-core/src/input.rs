#![forbid(unsafe_code)]

//! Live input state shared between the event producer and the render loop.
//!
//! The host event system is the single writer: it calls [`InputState::apply`]
//! from its own thread for every pointer or slider event. The render loop is
//! the single reader: it calls [`InputState::snapshot`] once per frame.
//!
//! Pointer and angle live behind one mutex and the snapshot is a `Copy` of the
//! whole record, so a frame never combines the pointer of one event with the
//! angle of a different, later event.
//!
//! Malformed events (non-finite coordinates or angles) are dropped and the
//! previous state is kept. The only other validation is clamping the angle
//! into the configured [`AngleRange`].

use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Valid range for the angle parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    min: f64,
    max: f64,
}

impl AngleRange {
    /// `[-π, π]`.
    pub const FULL_TURN: Self = Self { min: -PI, max: PI };

    /// Returns `None` unless both bounds are finite and `min < max`.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min < max).then_some(Self { min, max })
    }

    #[inline]
    pub const fn min(self) -> f64 {
        self.min
    }

    #[inline]
    pub const fn max(self) -> f64 {
        self.max
    }

    #[inline]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn clamp(self, angle: f64) -> f64 {
        angle.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(self, angle: f64) -> bool {
        (self.min..=self.max).contains(&angle)
    }
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::FULL_TURN
    }
}

/// An event delivered by the host input collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to `(x, y)` in grid coordinates.
    PointerMoved { x: f64, y: f64 },
    /// Continuous control (slider) set to an absolute angle.
    AngleChanged(f64),
    /// Continuous control moved by a relative amount (keyboard stepping).
    AngleNudged(f64),
}

impl InputEvent {
    /// All carried values are finite.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        match *self {
            Self::PointerMoved { x, y } => x.is_finite() && y.is_finite(),
            Self::AngleChanged(a) | Self::AngleNudged(a) => a.is_finite(),
        }
    }
}

/// Consistent copy of the input record taken once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    /// Pointer position `(x, y)` in grid coordinates.
    pub pointer: (f64, f64),
    /// Angle parameter, always inside the configured range.
    pub angle: f64,
    /// When the pointer was last written (`None` = initial value).
    pub pointer_at: Option<Instant>,
    /// When the angle was last written (`None` = initial value).
    pub angle_at: Option<Instant>,
    /// Number of accepted events so far.
    pub seq: u64,
}

impl InputSnapshot {
    /// Snapshot with the given pointer and angle and no event history.
    #[inline]
    pub const fn at(pointer: (f64, f64), angle: f64) -> Self {
        Self {
            pointer,
            angle,
            pointer_at: None,
            angle_at: None,
            seq: 0,
        }
    }
}

/// Shared pointer/angle record.
#[derive(Debug)]
pub struct InputState {
    range: AngleRange,
    current: Mutex<InputSnapshot>,
}

impl InputState {
    /// Create the record with an initial pointer and the angle at the start of
    /// the range clamped to contain zero when possible.
    pub fn new(range: AngleRange, pointer: (f64, f64)) -> Self {
        Self {
            range,
            current: Mutex::new(InputSnapshot::at(pointer, range.clamp(0.0))),
        }
    }

    /// Convenience for `Arc::new(InputState::new(..))`.
    pub fn shared(range: AngleRange, pointer: (f64, f64)) -> Arc<Self> {
        Arc::new(Self::new(range, pointer))
    }

    #[inline]
    pub fn angle_range(&self) -> AngleRange {
        self.range
    }

    /// Apply one event. Returns `false` if the event was malformed and dropped.
    pub fn apply(&self, event: InputEvent) -> bool {
        if !event.is_well_formed() {
            tracing::debug!(?event, "dropping malformed input event");
            return false;
        }
        let now = Instant::now();
        let mut current = self.lock();
        match event {
            InputEvent::PointerMoved { x, y } => {
                current.pointer = (x, y);
                current.pointer_at = Some(now);
            }
            InputEvent::AngleChanged(angle) => {
                current.angle = self.range.clamp(angle);
                current.angle_at = Some(now);
            }
            InputEvent::AngleNudged(delta) => {
                current.angle = self.range.clamp(current.angle + delta);
                current.angle_at = Some(now);
            }
        }
        current.seq = current.seq.wrapping_add(1);
        true
    }

    #[inline]
    pub fn set_pointer(&self, x: f64, y: f64) -> bool {
        self.apply(InputEvent::PointerMoved { x, y })
    }

    #[inline]
    pub fn set_angle(&self, angle: f64) -> bool {
        self.apply(InputEvent::AngleChanged(angle))
    }

    /// Copy of the whole record under one lock acquisition.
    #[inline]
    pub fn snapshot(&self) -> InputSnapshot {
        *self.lock()
    }

    // A writer that panicked mid-update cannot leave a torn record: every
    // write is a single assignment of Copy fields, so the data is still usable.
    fn lock(&self) -> MutexGuard<'_, InputSnapshot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn angle_range_rejects_bad_bounds() {
        assert!(AngleRange::new(0.0, 1.0).is_some());
        assert!(AngleRange::new(1.0, 1.0).is_none());
        assert!(AngleRange::new(2.0, 1.0).is_none());
        assert!(AngleRange::new(f64::NEG_INFINITY, 1.0).is_none());
        assert!(AngleRange::new(0.0, f64::NAN).is_none());
    }

    #[test]
    fn initial_angle_is_zero_when_in_range() {
        let state = InputState::new(AngleRange::FULL_TURN, (1.0, 2.0));
        let snap = state.snapshot();
        assert_eq!(snap.pointer, (1.0, 2.0));
        assert_eq!(snap.angle, 0.0);
        assert_eq!(snap.seq, 0);
        assert!(snap.pointer_at.is_none());

        let shifted = AngleRange::new(1.0, 2.0).unwrap();
        assert_eq!(InputState::new(shifted, (0.0, 0.0)).snapshot().angle, 1.0);
    }

    #[test]
    fn angle_is_clamped_to_range() {
        let state = InputState::new(AngleRange::new(-1.0, 1.0).unwrap(), (0.0, 0.0));
        assert!(state.set_angle(5.0));
        assert_eq!(state.snapshot().angle, 1.0);
        assert!(state.set_angle(-5.0));
        assert_eq!(state.snapshot().angle, -1.0);
        assert!(state.apply(InputEvent::AngleNudged(0.25)));
        assert_eq!(state.snapshot().angle, -0.75);
        assert!(state.apply(InputEvent::AngleNudged(10.0)));
        assert_eq!(state.snapshot().angle, 1.0);
    }

    #[test]
    fn pointer_is_not_bounded() {
        let state = InputState::new(AngleRange::FULL_TURN, (0.0, 0.0));
        assert!(state.set_pointer(-40.0, 1e6));
        assert_eq!(state.snapshot().pointer, (-40.0, 1e6));
    }

    #[test]
    fn malformed_events_keep_previous_state() {
        let state = InputState::new(AngleRange::FULL_TURN, (0.0, 0.0));
        assert!(state.set_pointer(3.0, 4.0));
        assert!(state.set_angle(0.5));
        let before = state.snapshot();

        assert!(!state.set_pointer(f64::NAN, 1.0));
        assert!(!state.set_pointer(1.0, f64::INFINITY));
        assert!(!state.set_angle(f64::NAN));
        assert!(!state.apply(InputEvent::AngleNudged(f64::NEG_INFINITY)));

        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn timestamps_are_independent() {
        let state = InputState::new(AngleRange::FULL_TURN, (0.0, 0.0));
        state.set_pointer(1.0, 1.0);
        let snap = state.snapshot();
        assert!(snap.pointer_at.is_some());
        assert!(snap.angle_at.is_none());

        state.set_angle(0.1);
        let snap2 = state.snapshot();
        assert_eq!(snap2.pointer_at, snap.pointer_at);
        assert!(snap2.angle_at.is_some());
        assert_eq!(snap2.seq, 2);
    }

    #[test]
    fn concurrent_reads_never_tear_pointer() {
        let state = InputState::shared(AngleRange::new(0.0, 1_000_000.0).unwrap(), (0.0, 0.0));
        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 1..=20_000u32 {
                    let v = f64::from(i);
                    state.set_pointer(v, v);
                    state.set_angle(v);
                }
            })
        };

        let mut last_seq = 0;
        for _ in 0..20_000 {
            let snap = state.snapshot();
            assert_eq!(snap.pointer.0, snap.pointer.1, "pointer torn: {snap:?}");
            // Pointer for event i is always written before angle i.
            assert!(
                snap.angle <= snap.pointer.0,
                "angle ahead of pointer: {snap:?}"
            );
            assert!(snap.seq >= last_seq);
            last_seq = snap.seq;
        }
        writer.join().unwrap();
        let final_snap = state.snapshot();
        assert_eq!(final_snap.pointer, (20_000.0, 20_000.0));
        assert_eq!(final_snap.angle, 20_000.0);
        assert_eq!(final_snap.seq, 40_000);
    }
}

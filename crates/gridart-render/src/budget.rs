#![forbid(unsafe_code)]

//! Frame pacing budget.
//!
//! Tracks how long each frame took against the target period derived from
//! the configured frame rate. An overrun only lowers the effective frame rate;
//! it is never a failure. A run of consecutive overruns is logged once when it
//! reaches [`FrameBudget::OVERRUN_WARN_STREAK`].
//!
//! Frame time (work done inside a frame) and frame period (start to start,
//! pacing sleep included) are tracked separately: overruns are judged on the
//! former, the effective frame rate comes from the latter.
//!
//! ```
//! use gridart_render::FrameBudget;
//! use std::time::Duration;
//!
//! let mut budget = FrameBudget::from_fps(50);
//! assert_eq!(budget.target(), Duration::from_millis(20));
//!
//! budget.record(Duration::from_millis(5));
//! assert_eq!(budget.remaining(Duration::from_millis(5)), Duration::from_millis(15));
//! ```

use std::time::Duration;

/// Smoothing factor for the frame time moving average.
const EMA_ALPHA: f64 = 0.1;

/// Point-in-time view of the budget counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetTelemetry {
    pub target: Duration,
    /// Exponential moving average of frame time.
    pub ema: Duration,
    /// Exponential moving average of the start-to-start frame period.
    pub period: Duration,
    /// Most recent frame time.
    pub last: Duration,
    pub frames: u64,
    pub overruns: u64,
    /// Current run of consecutive overruns.
    pub overrun_streak: u32,
}

impl BudgetTelemetry {
    /// Frames per second delivered, from the average frame period
    /// (0.0 until two frames have started).
    pub fn effective_fps(&self) -> f64 {
        let secs = self.period.as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }
}

/// Per-frame time accounting against a fixed target period.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    target: Duration,
    ema_secs: Option<f64>,
    period_secs: Option<f64>,
    last: Duration,
    frames: u64,
    overruns: u64,
    streak: u32,
}

impl FrameBudget {
    /// Consecutive overruns that trigger a warning.
    pub const OVERRUN_WARN_STREAK: u32 = 30;

    pub fn new(target: Duration) -> Self {
        Self {
            target,
            ema_secs: None,
            period_secs: None,
            last: Duration::ZERO,
            frames: 0,
            overruns: 0,
            streak: 0,
        }
    }

    /// Budget for `fps` frames per second (`fps` of 0 is treated as 1).
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    #[inline]
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Account for one finished frame. Returns `true` if it overran the target.
    pub fn record(&mut self, elapsed: Duration) -> bool {
        self.frames += 1;
        self.last = elapsed;
        let secs = elapsed.as_secs_f64();
        self.ema_secs = Some(smooth(self.ema_secs, secs));

        let overran = elapsed > self.target;
        if overran {
            self.overruns += 1;
            self.streak = self.streak.saturating_add(1);
            if self.streak == Self::OVERRUN_WARN_STREAK {
                tracing::warn!(
                    streak = self.streak,
                    target_ms = self.target.as_secs_f64() * 1e3,
                    last_ms = secs * 1e3,
                    "frames consistently over budget; effective frame rate is reduced"
                );
            }
        } else {
            self.streak = 0;
        }
        overran
    }

    /// Account for the wall-clock time between two consecutive frame starts.
    pub fn record_period(&mut self, period: Duration) {
        self.period_secs = Some(smooth(self.period_secs, period.as_secs_f64()));
    }

    /// Time left in the current period after `elapsed` has been spent.
    #[inline]
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.target.saturating_sub(elapsed)
    }

    pub fn telemetry(&self) -> BudgetTelemetry {
        BudgetTelemetry {
            target: self.target,
            ema: Duration::from_secs_f64(self.ema_secs.unwrap_or(0.0)),
            period: Duration::from_secs_f64(self.period_secs.unwrap_or(0.0)),
            last: self.last,
            frames: self.frames,
            overruns: self.overruns,
            overrun_streak: self.streak,
        }
    }
}

fn smooth(prev: Option<f64>, sample: f64) -> f64 {
    match prev {
        None => sample,
        Some(prev) => prev + EMA_ALPHA * (sample - prev),
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::from_fps(60)
    }
}

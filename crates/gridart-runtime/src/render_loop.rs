#![forbid(unsafe_code)]

//! The frame loop.
//!
//! One iteration:
//! 1. drain pending [`Control`] messages;
//! 2. snapshot the shared [`InputState`];
//! 3. fetch the formula's [`FieldBasis`] from the basis cache;
//! 4. fetch the frame's noise from the [`RandomField`];
//! 5. run [`GridTransform::apply`];
//! 6. hand the frame to the [`Presenter`];
//! 7. record the frame time and sleep out the rest of the period on the
//!    [`StopSignal`].
//!
//! The start-to-start period of consecutive frames feeds the effective frame
//! rate reported to the presenter and in the [`RunSummary`].
//!
//! Non-finite cells are replaced with the configured fallback, and a formula
//! panic replaces the whole frame with it; either way the loop keeps going.
//! Only a presenter error ends [`RenderLoop::run`] early.

use crate::config::{ArtConfig, ConfigError};
use crate::error::RuntimeError;
use crate::stop::StopSignal;
use gridart_core::{Grid, InputSnapshot, InputState, Resolution};
use gridart_fx::{
    CacheKey, CacheStats, FieldBasis, FormulaKind, FrameCache, GridTransform, NumericFault,
    OutOfRangePolicy, RandomField, SeedPolicy,
};
use gridart_render::{BudgetTelemetry, Frame, FrameBudget, PresentStats, Presenter};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;
use tracing::{debug, debug_span, info, warn};

/// A change requested while the loop runs, applied before the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    SelectFormula(FormulaKind),
    SetOutOfRange(OutOfRangePolicy),
    SetSeedPolicy(SeedPolicy),
    /// New base seed; held noise is redrawn.
    Reseed(u64),
}

/// How a frame's values were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Clean,
    /// `cells` non-finite cells now hold the fallback value.
    Repaired { cells: usize },
    /// The formula panicked; every cell holds the fallback value.
    Replaced,
}

/// Counters at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub repaired_frames: u64,
    pub repaired_cells: u64,
    pub replaced_frames: u64,
    pub budget: BudgetTelemetry,
    pub basis_cache: CacheStats,
}

#[derive(Debug, Default)]
struct Totals {
    repaired_frames: u64,
    repaired_cells: u64,
    replaced_frames: u64,
    fault_streak: u64,
}

pub struct RenderLoop {
    grid: Grid,
    transform: GridTransform,
    field: RandomField,
    bases: FrameCache<CacheKey, FieldBasis>,
    input: Arc<InputState>,
    budget: FrameBudget,
    fallback: f64,
    frame_limit: Option<u64>,
    controls: Receiver<Control>,
    sender: Sender<Control>,
    next_index: u64,
    totals: Totals,
}

impl RenderLoop {
    /// Validate `config` and set up a loop whose pointer starts at the grid centre.
    pub fn new(config: &ArtConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolution = config.resolution();
        let input = InputState::shared(config.angle_range()?, resolution.center());
        let (sender, controls) = mpsc::channel();

        info!(
            %resolution,
            formula = config.formula.name(),
            seed_policy = config.seed_policy.name(),
            seed = config.seed,
            out_of_range = config.out_of_range.name(),
            cache = config.cache_enabled,
            target_fps = config.target_fps,
            "render loop configured"
        );

        Ok(Self {
            grid: Grid::new(resolution),
            transform: GridTransform::new(config.formula, config.out_of_range),
            field: RandomField::new(config.seed, config.seed_policy)
                .with_cache(config.cache_enabled),
            bases: FrameCache::with_enabled(config.cache_enabled),
            input,
            budget: FrameBudget::from_fps(config.target_fps),
            fallback: config.fallback,
            frame_limit: None,
            controls,
            sender,
            next_index: 0,
            totals: Totals::default(),
        })
    }

    /// Stop [`run`](Self::run) after `limit` frames in total.
    #[must_use]
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Shared input state; hand a clone to the input thread.
    pub fn input(&self) -> Arc<InputState> {
        Arc::clone(&self.input)
    }

    /// A sender for [`Control`] messages.
    pub fn controls(&self) -> Sender<Control> {
        self.sender.clone()
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    #[inline]
    pub fn field(&self) -> &RandomField {
        &self.field
    }

    pub fn basis_cache(&self) -> CacheStats {
        self.bases.stats()
    }

    /// Frames rendered so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.next_index
    }

    pub fn apply_control(&mut self, control: Control) {
        match control {
            Control::SelectFormula(kind) => {
                if let Err(e) = kind.validate() {
                    warn!(error = %e, "ignoring formula switch");
                    return;
                }
                info!(formula = kind.name(), "formula selected");
                self.transform.set_formula(kind);
            }
            Control::SetOutOfRange(policy) => {
                info!(out_of_range = policy.name(), "range policy selected");
                self.transform.set_policy(policy);
            }
            Control::SetSeedPolicy(policy) => {
                info!(seed_policy = policy.name(), "seed policy selected");
                self.field.set_policy(policy);
            }
            Control::Reseed(seed) => {
                info!(seed, "reseeded");
                self.field.reseed(seed);
            }
        }
    }

    fn drain_controls(&mut self) {
        while let Ok(control) = self.controls.try_recv() {
            self.apply_control(control);
        }
    }

    fn limit_reached(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.next_index >= limit)
    }

    /// Render and present one frame without pacing.
    pub fn render_frame<P>(&mut self, presenter: &mut P) -> Result<FrameOutcome, RuntimeError>
    where
        P: Presenter + ?Sized,
    {
        self.drain_controls();
        let index = self.next_index;
        let _span = debug_span!("gridart.frame", index).entered();

        let snapshot = self.input.snapshot();
        let (frame, outcome) = self.produce(index, &snapshot);
        self.account(index, outcome);

        let stats = PresentStats {
            formula: self.transform.formula().name(),
            angle: snapshot.angle,
            fps: self.budget.telemetry().effective_fps(),
            repaired_total: self.totals.repaired_cells,
        };
        presenter
            .present(frame.stamp(index), &stats)
            .map_err(|source| RuntimeError::Present {
                frame: index,
                source,
            })?;

        self.next_index += 1;
        Ok(outcome)
    }

    /// Render until `stop` is triggered, the frame limit is reached or the
    /// presenter fails.
    pub fn run<P: Presenter>(
        &mut self,
        mut presenter: P,
        stop: &StopSignal,
    ) -> Result<RunSummary, RuntimeError> {
        info!(frame_limit = ?self.frame_limit, "render loop started");
        let mut previous_start: Option<Instant> = None;
        while !stop.is_stopped() && !self.limit_reached() {
            let started = Instant::now();
            if let Some(previous) = previous_start.replace(started) {
                self.budget.record_period(started - previous);
            }
            if let Err(e) = self.render_frame(&mut presenter) {
                warn!(error = %e, "render loop aborted");
                return Err(e);
            }
            let elapsed = started.elapsed();
            self.budget.record(elapsed);
            if self.limit_reached() || stop.wait_timeout(self.budget.remaining(elapsed)) {
                break;
            }
        }

        let summary = self.summary();
        info!(
            frames = summary.frames,
            repaired_frames = summary.repaired_frames,
            replaced_frames = summary.replaced_frames,
            fps = summary.budget.effective_fps(),
            "render loop stopped"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.next_index,
            repaired_frames: self.totals.repaired_frames,
            repaired_cells: self.totals.repaired_cells,
            replaced_frames: self.totals.replaced_frames,
            budget: self.budget.telemetry(),
            basis_cache: self.bases.stats(),
        }
    }

    fn produce(&self, index: u64, snapshot: &InputSnapshot) -> (Frame, FrameOutcome) {
        let (grid, transform) = (&self.grid, &self.transform);
        let computed = panic::catch_unwind(AssertUnwindSafe(|| {
            let key = transform.cache_key(grid.resolution());
            let basis = self.bases.get_or_compute(key, || transform.precompute(grid));
            let noise = self.field.frame_sample(grid.dim(), index, transform.noise_kind());
            transform.apply(grid, snapshot, &noise, &basis)
        }));
        settle(computed, grid.resolution(), self.fallback)
    }

    fn account(&mut self, index: u64, outcome: FrameOutcome) {
        let totals = &mut self.totals;
        match outcome {
            FrameOutcome::Clean => {
                if totals.fault_streak > 0 {
                    debug!(frames = totals.fault_streak, "numeric faults cleared");
                    totals.fault_streak = 0;
                }
            }
            FrameOutcome::Repaired { cells } => {
                if totals.fault_streak == 0 {
                    warn!(
                        frame = index,
                        cells,
                        fallback = self.fallback,
                        "non-finite cells replaced"
                    );
                } else {
                    debug!(frame = index, cells, "non-finite cells replaced");
                }
                totals.fault_streak += 1;
                totals.repaired_frames += 1;
                totals.repaired_cells += cells as u64;
            }
            FrameOutcome::Replaced => {
                totals.replaced_frames += 1;
            }
        }
    }
}

/// Turn the guarded result of one transform into a presentable frame.
fn settle(
    computed: std::thread::Result<Result<Frame, NumericFault>>,
    resolution: Resolution,
    fallback: f64,
) -> (Frame, FrameOutcome) {
    match computed {
        Ok(Ok(frame)) => (frame, FrameOutcome::Clean),
        Ok(Err(fault)) => {
            let cells = fault.cells();
            (fault.repair(fallback), FrameOutcome::Repaired { cells })
        }
        Err(payload) => {
            warn!(
                panic = panic_message(payload.as_ref()),
                "formula panicked, frame replaced"
            );
            (Frame::filled(resolution, fallback), FrameOutcome::Replaced)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridart_fx::{PlasmaFormula, RadialFormula};
    use gridart_render::HeadlessPresenter;

    fn small(formula: FormulaKind) -> ArtConfig {
        ArtConfig {
            rows: 6,
            cols: 8,
            formula,
            target_fps: 480,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ArtConfig {
            rows: 0,
            ..Default::default()
        };
        assert!(matches!(RenderLoop::new(&config), Err(ConfigError::Resolution { .. })));
    }

    #[test]
    fn pointer_starts_at_centre() {
        let render = RenderLoop::new(&small(FormulaKind::default())).unwrap();
        assert_eq!(
            render.input().snapshot().pointer,
            Resolution::new(6, 8).center()
        );
        assert_eq!(render.frames(), 0);
    }

    #[test]
    fn frames_are_stamped_in_order() {
        let mut render = RenderLoop::new(&small(FormulaKind::default())).unwrap();
        let mut presenter = HeadlessPresenter::capturing();
        for _ in 0..3 {
            assert_eq!(
                render.render_frame(&mut presenter).unwrap(),
                FrameOutcome::Clean
            );
        }
        let indices: Vec<u64> = presenter.frames().iter().map(Frame::index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(presenter.last_stats().unwrap().formula, "radial");
    }

    #[test]
    fn controls_apply_before_next_frame() {
        let mut render = RenderLoop::new(&small(FormulaKind::default())).unwrap();
        let controls = render.controls();
        controls
            .send(Control::SelectFormula(FormulaKind::Plasma(PlasmaFormula::default())))
            .unwrap();
        controls
            .send(Control::SetOutOfRange(OutOfRangePolicy::Wrap))
            .unwrap();
        controls
            .send(Control::SetSeedPolicy(SeedPolicy::Held))
            .unwrap();
        controls.send(Control::Reseed(99)).unwrap();

        let mut presenter = HeadlessPresenter::new();
        render.render_frame(&mut presenter).unwrap();
        assert_eq!(render.transform().formula().name(), "plasma");
        assert_eq!(render.transform().policy(), OutOfRangePolicy::Wrap);
        assert_eq!(render.field().policy(), SeedPolicy::Held);
        assert_eq!(render.field().base_seed(), 99);
        assert_eq!(presenter.last_stats().unwrap().formula, "plasma");
    }

    #[test]
    fn invalid_formula_switch_is_ignored() {
        let mut render = RenderLoop::new(&small(FormulaKind::default())).unwrap();
        let bad = FormulaKind::Radial(RadialFormula {
            falloff: -1.0,
            ..Default::default()
        });
        render.apply_control(Control::SelectFormula(bad));
        assert_eq!(*render.transform().formula(), FormulaKind::default());
    }

    #[test]
    fn panic_becomes_fallback_frame() {
        let computed =
            panic::catch_unwind(|| -> Result<Frame, NumericFault> { panic!("formula blew up") });
        let (frame, outcome) = settle(computed, Resolution::new(3, 4), 0.25);
        assert_eq!(outcome, FrameOutcome::Replaced);
        assert_eq!(frame.dim(), (3, 4));
        assert!(frame.values().iter().all(|&v| v == 0.25));
    }

    #[test]
    fn clean_result_passes_through() {
        let frame = Frame::filled(Resolution::new(2, 2), 0.75);
        let (out, outcome) = settle(Ok(Ok(frame.clone())), Resolution::new(2, 2), 0.0);
        assert_eq!(outcome, FrameOutcome::Clean);
        assert_eq!(out, frame);
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let fixed: Box<dyn Any + Send> = Box::new("fixed");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(fixed.as_ref()), "fixed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn repaired_frames_are_counted() {
        let mut render = RenderLoop::new(&small(FormulaKind::default())).unwrap();
        render.account(0, FrameOutcome::Repaired { cells: 2 });
        render.account(1, FrameOutcome::Repaired { cells: 1 });
        render.account(2, FrameOutcome::Clean);
        render.account(3, FrameOutcome::Replaced);
        let summary = render.summary();
        assert_eq!(summary.repaired_frames, 2);
        assert_eq!(summary.repaired_cells, 3);
        assert_eq!(summary.replaced_frames, 1);
        assert_eq!(render.totals.fault_streak, 0);
    }
}

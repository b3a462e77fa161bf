#![forbid(unsafe_code)]

//! gridart binary entry point.
//!
//! Exit status: 0 on a clean stop, 1 on a terminal or output failure, 2 on a
//! configuration error (reported before the loop starts), 101 on a panic.

use gridart_demo::cli::Opts;
use gridart_demo::keys::Keymap;
use gridart_demo::logging::{self, LogTarget};
use gridart_demo::terminal::{self, SignalGuard, TerminalPresenter, TerminalSession};
use gridart_render::HeadlessPresenter;
use gridart_runtime::{ArtConfig, RenderLoop, RunSummary, StopSignal};
use std::io::{self, BufWriter};
use std::panic::{self, AssertUnwindSafe};
use std::process;

const EXIT_RUNTIME: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_PANIC: i32 = 101;

fn main() {
    let opts = Opts::parse();

    let target = LogTarget::choose(opts.log.clone(), opts.headless);
    if let Err(e) = logging::init(&target) {
        eprintln!("gridart: cannot start logging: {e}");
        process::exit(EXIT_CONFIG);
    }
    if let Err(e) = opts.config.validate() {
        eprintln!("gridart: {e}");
        process::exit(EXIT_CONFIG);
    }

    let code = if opts.headless {
        run_headless(&opts)
    } else {
        match panic::catch_unwind(AssertUnwindSafe(|| run_terminal(&opts))) {
            Ok(code) => code,
            Err(_) => {
                let message = terminal::take_last_panic().unwrap_or_else(|| "unknown panic".into());
                eprintln!("gridart: {message}");
                EXIT_PANIC
            }
        }
    };
    process::exit(code);
}

fn run_headless(opts: &Opts) -> i32 {
    let mut render = match RenderLoop::new(&opts.config) {
        Ok(render) => render.with_frame_limit(opts.frame_limit),
        Err(e) => {
            eprintln!("gridart: {e}");
            return EXIT_CONFIG;
        }
    };
    let (stop, trigger) = StopSignal::new();
    let _signals = match SignalGuard::install(trigger) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("gridart: cannot install signal handlers: {e}");
            return EXIT_RUNTIME;
        }
    };

    let mut presenter = HeadlessPresenter::new();
    match render.run(&mut presenter, &stop) {
        Ok(summary) => {
            print_summary(&opts.config, &summary);
            if let Some(frame) = presenter.last()
                && let Some((lo, hi)) = frame.min_max()
            {
                println!(
                    "last frame   #{}  min {lo:.4}  max {hi:.4}  mean {:.4}",
                    frame.index(),
                    frame.mean()
                );
            }
            0
        }
        Err(e) => {
            eprintln!("gridart: {e}");
            EXIT_RUNTIME
        }
    }
}

fn run_terminal(opts: &Opts) -> i32 {
    let session = match TerminalSession::new() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("gridart: cannot open terminal: {e}");
            return EXIT_RUNTIME;
        }
    };

    let viewport = match session.size() {
        Ok(size) => size,
        Err(e) => {
            drop(session);
            eprintln!("gridart: cannot read terminal size: {e}");
            return EXIT_RUNTIME;
        }
    };
    let mut config = opts.config.clone();
    if opts.size_from_terminal {
        (config.rows, config.cols) = terminal::grid_size_for(viewport.0, viewport.1);
    }

    let render = match RenderLoop::new(&config) {
        Ok(render) => render.with_frame_limit(opts.frame_limit),
        Err(e) => {
            drop(session);
            eprintln!("gridart: {e}");
            return EXIT_CONFIG;
        }
    };

    let outcome = drive(render, opts, &config, viewport);
    drop(session);
    match outcome {
        Ok(summary) => {
            print_summary(&config, &summary);
            0
        }
        Err(e) => {
            eprintln!("gridart: {e}");
            EXIT_RUNTIME
        }
    }
}

fn drive(
    mut render: RenderLoop,
    opts: &Opts,
    config: &ArtConfig,
    (cols, rows): (u16, u16),
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let (stop, trigger) = StopSignal::new();
    let _signals = SignalGuard::install(trigger.clone())?;
    let pump = terminal::spawn_input_pump(
        render.input(),
        render.controls(),
        Keymap::new(config.seed_policy, config.seed),
        stop.clone(),
        trigger.clone(),
    )?;

    let presenter = TerminalPresenter::new(BufWriter::new(io::stdout()), opts.palette)
        .with_viewport(cols, rows);
    let result = render.run(presenter, &stop);

    trigger.stop();
    if pump.join().is_err() {
        tracing::warn!("input pump panicked");
    }
    Ok(result?)
}

fn print_summary(config: &ArtConfig, summary: &RunSummary) {
    println!(
        "gridart      {}x{}  {}  seed {:#x}",
        config.rows,
        config.cols,
        config.formula.name(),
        config.seed
    );
    println!(
        "frames       {}  ({:.1} fps effective, {} over budget)",
        summary.frames,
        summary.budget.effective_fps(),
        summary.budget.overruns
    );
    println!(
        "repaired     {} frames, {} cells  replaced {} frames",
        summary.repaired_frames, summary.repaired_cells, summary.replaced_frames
    );
    println!(
        "basis cache  {} hits  {} misses",
        summary.basis_cache.hits, summary.basis_cache.misses
    );
}

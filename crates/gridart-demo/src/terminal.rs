#![forbid(unsafe_code)]

//! Terminal session, half-block presenter and the input pump.
//!
//! [`TerminalSession`] enters raw mode, the alternate screen and mouse
//! capture, and undoes all of it on drop, including drops during unwinding
//! (the release profile must not use `panic = "abort"`).

use crate::keys::{Action, Keymap};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use gridart_core::InputState;
use gridart_render::{Frame, PackedRgba, Palette, PresentStats, Presenter};
use gridart_runtime::{Control, StopSignal, StopTrigger};
use std::io::{self, Write};
use std::panic;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper half block: foreground paints the top grid row, background the bottom one.
const HALF_BLOCK: char = '\u{2580}';

/// How often the input pump rechecks the stop flag while idle.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Raw mode, alternate screen, mouse capture and a hidden cursor for as
/// long as the value lives.
#[derive(Debug)]
pub struct TerminalSession {
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
}

impl TerminalSession {
    /// # Errors
    ///
    /// Returns an error if raw mode or any of the screen modes cannot be enabled;
    /// whatever was enabled is restored before returning.
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        info!("terminal raw mode enabled");
        install_panic_hook();

        let mut session = Self {
            alternate_screen_enabled: false,
            mouse_enabled: false,
        };
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        session.alternate_screen_enabled = true;
        execute!(stdout, EnableMouseCapture)?;
        session.mouse_enabled = true;
        execute!(stdout, Hide, Clear(ClearType::All))?;
        Ok(session)
    }

    /// Terminal size as (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();
        if self.mouse_enabled {
            let _ = execute!(stdout, DisableMouseCapture);
            self.mouse_enabled = false;
        }
        let _ = execute!(stdout, ResetColor, Show);
        if self.alternate_screen_enabled {
            let _ = execute!(stdout, LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
        }
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
        info!("terminal restored");
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
        // Back to the default hook; the hook cannot be swapped mid-panic.
        if !thread::panicking() {
            drop(panic::take_hook());
        }
    }
}

/// Message of the most recent panic seen while a session was active.
static LAST_PANIC: Mutex<Option<String>> = Mutex::new(None);

/// Replace the default hook, which would print into the alternate screen.
///
/// Formula panics are caught by the render loop and must not disturb the
/// screen, so the hook only records the message; an uncaught panic unwinds
/// through [`TerminalSession::drop`] and the caller reports it afterwards.
fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let message = info.to_string();
        error!(panic = %message, "panic");
        *LAST_PANIC.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }));
}

/// Take the message recorded by the session's panic hook.
pub fn take_last_panic() -> Option<String> {
    LAST_PANIC.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Grid size that fills a terminal of `cols` x `rows`, keeping one row for status.
pub fn grid_size_for(cols: u16, rows: u16) -> (usize, usize) {
    let cell_rows = usize::from(rows.saturating_sub(1)).max(1);
    (cell_rows * 2, usize::from(cols).max(1))
}

fn rgb(color: PackedRgba) -> Color {
    Color::Rgb {
        r: color.r(),
        g: color.g(),
        b: color.b(),
    }
}

const KEY_HINTS: &str = "[1-4] formula  [arrows] angle  [c/w] range  [s] seed  [q] quit";

/// Status text shown under the picture.
pub fn status_line(stats: &PresentStats) -> String {
    format!(
        " {:<8} angle {:+7.3}  {:>5.1} fps  repaired {}   {KEY_HINTS}",
        stats.formula, stats.angle, stats.fps, stats.repaired_total
    )
}

/// Draws frames with two grid rows per terminal cell.
///
/// Frames larger than the viewport are clipped to its top-left corner; the
/// status line goes under the last drawn row.
pub struct TerminalPresenter<W: Write> {
    out: W,
    palette: Palette,
    cols: u16,
    picture_rows: u16,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self {
            out,
            palette,
            cols: u16::MAX,
            picture_rows: u16::MAX - 1,
        }
    }

    /// Clip drawing to a terminal of `cols` x `rows`, one row kept for status.
    pub fn with_viewport(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols.max(1);
        self.picture_rows = rows.saturating_sub(1).max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &Frame, stats: &PresentStats) -> io::Result<()> {
        let (rows, cols) = frame.dim();
        let values = frame.values();
        let mut last: Option<(PackedRgba, PackedRgba)> = None;
        let cell_rows = u16::try_from(rows.div_ceil(2))
            .map_or(self.picture_rows, |n| n.min(self.picture_rows));
        let cols = cols.min(usize::from(self.cols));

        for cell_row in 0..cell_rows {
            let top = usize::from(cell_row) * 2;
            queue!(self.out, MoveTo(0, cell_row))?;
            for col in 0..cols {
                let upper = self.palette.color_at(values[[top, col]]);
                let lower = if top + 1 < rows {
                    self.palette.color_at(values[[top + 1, col]])
                } else {
                    PackedRgba::BLACK
                };
                if last != Some((upper, lower)) {
                    queue!(
                    self.out,
                    SetForegroundColor(rgb(upper)),
                    SetBackgroundColor(rgb(lower))
                )?;
                    last = Some((upper, lower));
                }
                queue!(self.out, Print(HALF_BLOCK))?;
            }
        }

        queue!(
            self.out,
            ResetColor,
            MoveTo(0, cell_rows),
            Clear(ClearType::CurrentLine),
            Print(status_line(stats))
        )?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, frame: Frame, stats: &PresentStats) -> io::Result<()> {
        self.draw(&frame, stats)
    }
}

/// Read terminal events on a background thread until `stop` is set.
///
/// Pointer and angle events go straight into `input`; loop controls go
/// through `controls`; quit keys and read errors fire `trigger`.
pub fn spawn_input_pump(
    input: Arc<InputState>,
    controls: Sender<Control>,
    mut keymap: Keymap,
    stop: StopSignal,
    trigger: StopTrigger,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("gridart-input".into())
        .spawn(move || {
            while !stop.is_stopped() {
                match event::poll(INPUT_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        warn!(error = %e, "terminal input failed");
                        trigger.stop();
                        break;
                    }
                }
                let ev = match event::read() {
                    Ok(ev) => ev,
                    Err(e) => {
                        warn!(error = %e, "terminal input failed");
                        trigger.stop();
                        break;
                    }
                };
                match keymap.map(&ev) {
                    Some(Action::Input(event)) => {
                        input.apply(event);
                    }
                    Some(Action::Control(control)) => {
                        if controls.send(control).is_err() {
                            break;
                        }
                    }
                    Some(Action::Quit) => {
                        info!("quit requested");
                        trigger.stop();
                        break;
                    }
                    None => {}
                }
            }
            debug!("input pump stopped");
        })
}

/// Turns SIGINT and SIGTERM into a stop request for as long as it lives.
#[cfg(unix)]
#[derive(Debug)]
pub struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    pub fn install(trigger: StopTrigger) -> io::Result<Self> {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("gridart-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    info!(signal, "termination signal received");
                    trigger.stop();
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// No signal handling off unix; Ctrl+C arrives as a key in raw mode.
#[cfg(not(unix))]
#[derive(Debug)]
pub struct SignalGuard;

#[cfg(not(unix))]
impl SignalGuard {
    pub fn install(_trigger: StopTrigger) -> io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridart_core::Resolution;
    use ndarray::array;

    fn stats() -> PresentStats {
        PresentStats {
            formula: "radial",
            angle: 0.5,
            fps: 59.94,
            repaired_total: 3,
        }
    }

    #[test]
    fn grid_fills_terminal_minus_status_row() {
        assert_eq!(grid_size_for(120, 25), (48, 120));
        assert_eq!(grid_size_for(0, 0), (2, 1));
        assert_eq!(grid_size_for(10, 1), (2, 10));
    }

    #[test]
    fn status_line_reports_stats() {
        let line = status_line(&stats());
        assert!(line.contains("radial"));
        assert!(line.contains("+0.500"));
        assert!(line.contains("59.9 fps"));
        assert!(line.contains("repaired 3"));
    }

    #[test]
    fn two_rows_per_cell() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Palette::Monochrome);
        let frame = Frame::new(array![[0.0, 1.0, 0.5], [1.0, 0.0, 0.5], [0.25, 0.25, 0.25]]);
        presenter.present(frame, &stats()).unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(text.matches(HALF_BLOCK).count(), 6);
        assert!(text.contains("radial"));
    }

    #[test]
    fn repeated_colours_are_not_resent() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Palette::Monochrome);
        presenter
            .present(Frame::filled(Resolution::new(2, 8), 0.5), &stats())
            .unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        // One foreground and one background change for the whole row.
        assert_eq!(text.matches("38;2;").count(), 1);
        assert_eq!(text.matches("48;2;").count(), 1);
    }

    #[test]
    fn tall_frames_are_clipped_to_the_viewport() {
        let mut presenter =
            TerminalPresenter::new(Vec::new(), Palette::Monochrome).with_viewport(3, 4);
        presenter
            .present(Frame::filled(Resolution::new(200_000, 10), 0.5), &stats())
            .unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        // Three picture rows of three columns, status on the fourth row.
        assert_eq!(text.matches(HALF_BLOCK).count(), 9);
        assert!(text.contains("\x1b[3;1H"));
        assert!(text.contains("\x1b[4;1H"));
        assert!(!text.contains("\x1b[5;1H"));
    }

    #[test]
    fn unclipped_presenter_never_wraps_row_positions() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Palette::Monochrome);
        presenter
            .present(Frame::filled(Resolution::new(140_000, 1), 0.5), &stats())
            .unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        let picture_rows = usize::from(u16::MAX - 1);
        assert_eq!(text.matches(HALF_BLOCK).count(), picture_rows);
        // The status line lands after the last picture row instead of wrapping to the top.
        assert!(text.ends_with(&status_line(&stats())));
        assert_eq!(text.matches("\x1b[1;1H").count(), 1);
    }
}

//! Progress reporting for long-running operations
//!
//! A [`ProgressReporter`] owns a `(current, total)` counter behind a mutex and
//! renders it as a fixed-width textual bar. Reporters created with
//! [`ProgressReporter::with_display`] also draw each update to the terminal
//! through indicatif, which hides itself when stderr is not a tty.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default width of the rendered bar, in characters
pub const DEFAULT_BAR_WIDTH: usize = 50;

const FILLED: char = '=';
const EMPTY: char = ' ';

/// Snapshot of a reporter's counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub current: u64,
    /// Zero means the total is unknown
    pub total: u64,
}

/// Render a state as `[=====     ]  50%`.
///
/// A zero total is indeterminate and renders as an empty bar at 0%.
pub fn render_bar(state: ProgressState, width: usize) -> String {
    let (filled, percent) = if state.total == 0 {
        (0, 0)
    } else {
        let total = u128::from(state.total);
        let current = u128::from(state.current.min(state.total));
        let width = width as u128;
        // round(current / total * width) without floats
        let filled = (current * width * 2 + total) / (total * 2);
        let percent = current * 100 / total;
        (filled as usize, percent as u64)
    };

    let mut bar = String::with_capacity(width + 8);
    bar.push('[');
    bar.extend(std::iter::repeat_n(FILLED, filled));
    bar.extend(std::iter::repeat_n(EMPTY, width - filled));
    bar.push(']');
    format!("{} {:>3}%", bar, percent)
}

/// Thread-safe progress counter with a textual bar.
pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    bar_width: usize,
    label: String,
    display: ProgressBar,
}

impl ProgressReporter {
    /// Create a reporter that only tracks state (nothing is drawn).
    pub fn new(total: u64, bar_width: usize) -> Self {
        Self {
            state: Mutex::new(ProgressState { current: 0, total }),
            bar_width,
            label: String::new(),
            display: ProgressBar::hidden(),
        }
    }

    /// Create a reporter that draws `label [bar] pct%` to stderr on every update.
    pub fn with_display(label: &str, total: u64, bar_width: usize) -> Self {
        let display = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("     {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        display.set_style(style);

        let reporter = Self {
            state: Mutex::new(ProgressState { current: 0, total }),
            bar_width,
            label: label.to_string(),
            display,
        };
        reporter.redraw();
        reporter
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // The state is two integers; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the current position.
    pub fn update(&self, current: u64) {
        self.lock().current = current;
        self.redraw();
    }

    /// Move the current position forward by `delta`.
    pub fn advance(&self, delta: u64) {
        {
            let mut state = self.lock();
            state.current = state.current.saturating_add(delta);
        }
        self.redraw();
    }

    /// Replace the total, e.g. once a content length becomes known.
    pub fn set_total(&self, total: u64) {
        self.lock().total = total;
        self.redraw();
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.lock()
    }

    pub fn render(&self) -> String {
        render_bar(self.snapshot(), self.bar_width)
    }

    /// Draw the final bar and leave it on screen with a trailing message.
    pub fn finish(&self, message: &str) {
        let line = self.line();
        self.display.finish_with_message(format!("{} {}", line, message));
    }

    fn line(&self) -> String {
        if self.label.is_empty() {
            self.render()
        } else {
            format!("{} {}", self.label, self.render())
        }
    }

    fn redraw(&self) {
        if !self.display.is_hidden() {
            self.display.set_message(self.line());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.display.is_finished() {
            self.display.abandon();
        }
    }
}

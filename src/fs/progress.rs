//! Throttled single-line scan progress on stderr.
//!
//! Updates are best-effort and never on the critical path: the throttle is
//! checked lock-free-ish (a short mutex over an `Instant`), and nothing is
//! written unless stderr is a terminal.

use std::{
    io::{self, IsTerminal, Write},
    path::Path,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::util::format::shorten_path;

const UPDATE_INTERVAL: Duration = Duration::from_millis(100);
const PATH_DISPLAY_LEN: usize = 45;

/// Clears the current terminal line.
const CLEAR_LINE: &str = "\r\x1b[2K";

pub struct ProgressReporter {
    enabled: bool,
    last_update: Mutex<Instant>,
    current_path: Mutex<String>,
}

impl ProgressReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            enabled: show_progress && io::stderr().is_terminal(),
            last_update: Mutex::new(
                Instant::now()
                    .checked_sub(UPDATE_INTERVAL)
                    .unwrap_or_else(Instant::now),
            ),
            current_path: Mutex::new(String::new()),
        }
    }

    /// Record the path the scanner is currently visiting.
    pub fn set_current_path(&self, path: &Path) {
        if !self.enabled {
            return;
        }
        *self.current_path.lock() = path.to_string_lossy().into_owned();
    }

    /// Emit the status line if the throttle interval has elapsed.
    pub fn tick(&self, traversed: u64, skipped: u64) {
        if !self.enabled || !self.should_update() {
            return;
        }

        let path = self.current_path.lock().clone();
        let shortened = shorten_path(&path, PATH_DISPLAY_LEN);

        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{CLEAR_LINE}Enumerating {traversed} items");
        if skipped > 0 {
            let _ = write!(stderr, " (skipped {skipped})");
        }
        let _ = write!(stderr, " - {shortened}");
        let _ = stderr.flush();
    }

    /// Remove the status line once the scan completes.
    pub fn clear(&self) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{CLEAR_LINE}");
        let _ = stderr.flush();
    }

    fn should_update(&self) -> bool {
        let mut last = self.last_update.lock();
        if last.elapsed() >= UPDATE_INTERVAL {
            *last = Instant::now();
            true
        } else {
            false
        }
    }
}

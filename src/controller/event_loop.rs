//! Interactive input loop.
//!
//! Single-threaded and cooperative: the loop draws when a dirty flag is
//! set, polls input with a short timeout so idle costs nothing, coalesces
//! bursts of movement keys into one cursor delta, and dispatches actions
//! against the state machine. Scans launched from here (refresh) run on a
//! transient worker pool and are joined before input is read again.

use std::{
    io::Stdout,
    process::{Command, Stdio},
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use crate::{
    controller::actions::{map_key, movement_delta, Action},
    error::{AppError, AppResult},
    fs::{entry::EntryRef, walker::Walker},
    glob,
    model::{
        app_state::{AppState, FocusedPane, Redraw, UiMode},
        mark_set::MarkTab,
    },
    view::ui,
};

pub type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Poll timeout while idle; keeps the loop from spinning.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Movement keys arriving within this window are summed and applied once.
const COALESCE_WINDOW: Duration = Duration::from_millis(5);

enum RefreshKind {
    Selected(EntryRef),
    All,
}

pub struct EventLoop {
    app: AppState,
    /// A non-movement key read during coalescing, replayed next iteration.
    pending_key: Option<KeyEvent>,
    /// A refresh scheduled to run after the indicator frame is drawn.
    pending_refresh: Option<RefreshKind>,
}

impl EventLoop {
    pub fn new(app: AppState) -> Self {
        Self {
            app,
            pending_key: None,
            pending_refresh: None,
        }
    }

    /// Run until quit; returns the paths still marked at exit, which the
    /// caller prints to stdout as the selection protocol.
    pub fn run(&mut self, terminal: &mut AppTerminal) -> AppResult<Vec<std::path::PathBuf>> {
        info!("entering interactive loop");
        self.app.rebuild_marks();

        loop {
            if self.app.redraw > Redraw::None {
                terminal
                    .draw(|frame| ui::render(frame, &mut self.app))
                    .map_err(|e| AppError::Render(e.to_string()))?;
                self.app.redraw = Redraw::None;
            }

            // Run a scheduled refresh only after its indicator frame was
            // drawn; no input is accepted while it runs.
            if let Some(kind) = self.pending_refresh.take() {
                self.run_refresh(kind);
                continue;
            }

            let key = match self.pending_key.take() {
                Some(key) => Some(key),
                None => self.poll_key()?,
            };

            if let Some(key) = key {
                self.handle_key(key)?;
            }

            if self.app.should_quit {
                break;
            }
        }

        let marked = self
            .app
            .marks
            .entries()
            .iter()
            .map(|e| e.path().to_path_buf())
            .collect();
        Ok(marked)
    }

    fn poll_key(&mut self) -> AppResult<Option<KeyEvent>> {
        if !event::poll(IDLE_POLL)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
            Event::Resize(_, _) => {
                // ratatui recreates its buffers on the next draw; our job
                // is to invalidate cached strings and force a full frame.
                self.app.view.invalidate_format_cache();
                self.app.request_redraw(Redraw::Full);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppResult<()> {
        self.app.status_note = None;

        // A preview search being typed captures every key first, so that
        // movement letters land in the pattern.
        if self.app.mode == UiMode::Normal
            && self.app.focus == FocusedPane::Mark
            && self.app.marks.preview_search().typing()
        {
            self.handle_preview_search_key(key);
            return Ok(());
        }

        // Movement is special: it coalesces and produces a Cursor-level
        // repaint rather than a full one.
        if self.app.mode == UiMode::Normal {
            let viewport = self.focused_viewport();
            if let Some(delta) = movement_delta(&key, viewport) {
                let delta = self.coalesce_movement(delta, viewport)?;
                self.dispatch(Action::Move(delta));
                return Ok(());
            }
        }

        let action = map_key(&self.app, &key);
        self.dispatch(action);
        Ok(())
    }

    fn focused_viewport(&self) -> usize {
        match self.app.focus {
            FocusedPane::Main => self.app.main_viewport,
            FocusedPane::Mark => self.app.mark_viewport,
        }
    }

    /// Sum further movement keys arriving within the batch window so fast
    /// key repeat moves the cursor once instead of redrawing per event.
    fn coalesce_movement(&mut self, mut delta: i64, viewport: usize) -> AppResult<i64> {
        let deadline = Instant::now() + COALESCE_WINDOW;
        while Instant::now() < deadline {
            if !event::poll(Duration::ZERO)? {
                break;
            }
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    match movement_delta(&key, viewport) {
                        Some(d) => delta += d,
                        None => {
                            self.pending_key = Some(key);
                            break;
                        }
                    }
                }
                Event::Resize(_, _) => {
                    self.app.view.invalidate_format_cache();
                    self.app.request_redraw(Redraw::Full);
                }
                _ => {}
            }
        }
        Ok(delta)
    }

    fn apply_movement(&mut self, delta: i64) {
        match self.app.focus {
            FocusedPane::Main => {
                let viewport = self.app.main_viewport;
                let top_before = self.app.view.top();
                self.app.view.move_cursor(delta, viewport);
                // Scrolling repaints the window; a cursor move inside it
                // repaints two rows via the terminal diff.
                if self.app.view.top() == top_before {
                    self.app.request_redraw(Redraw::Cursor);
                } else {
                    self.app.request_redraw(Redraw::Full);
                }
            }
            FocusedPane::Mark => {
                let viewport = self.app.mark_viewport;
                if self.app.marks.tab() == MarkTab::QuickView {
                    self.app.marks.scroll_preview(delta, viewport);
                } else {
                    self.app.marks.move_cursor(delta, viewport);
                }
                self.app.request_redraw(Redraw::Full);
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        debug!(?action, "dispatch");
        match action {
            Action::NoOp => {}
            Action::Quit => self.app.should_quit = true,
            Action::Move(delta) => self.apply_movement(delta),

            Action::Home => match self.app.focus {
                FocusedPane::Main => {
                    let vp = self.app.main_viewport;
                    self.app.view.move_home(vp);
                    self.app.request_redraw(Redraw::Full);
                }
                FocusedPane::Mark => {
                    self.app.marks.move_home();
                    self.app.request_redraw(Redraw::Full);
                }
            },
            Action::End => match self.app.focus {
                FocusedPane::Main => {
                    let vp = self.app.main_viewport;
                    self.app.view.move_end(vp);
                    self.app.request_redraw(Redraw::Full);
                }
                FocusedPane::Mark => {
                    let vp = self.app.mark_viewport;
                    self.app.marks.move_end(vp);
                    self.app.request_redraw(Redraw::Full);
                }
            },

            Action::EnterDir => {
                let target = self.app.view.selected().cloned();
                if let Some(target) = target {
                    if target.is_dir() && target.child_count() > 0 {
                        self.app.enter_dir(target);
                    }
                }
            }
            Action::LeaveDir => self.app.leave_dir(),

            Action::ToggleMark => {
                if let Some(entry) = self.app.view.selected() {
                    entry.toggle_marked();
                    self.app.rebuild_marks();
                    self.app.request_redraw(Redraw::Full);
                }
            }
            Action::ToggleAllMarks => {
                let entries = self.app.view.entries().to_vec();
                let any_marked = entries.iter().any(|e| e.is_marked());
                for entry in &entries {
                    entry.set_marked(!any_marked);
                }
                self.app.rebuild_marks();
                self.app.request_redraw(Redraw::Full);
            }
            Action::DeleteKey => {
                if self.app.marks.is_empty() {
                    // Mark current and advance.
                    if let Some(entry) = self.app.view.selected() {
                        entry.set_marked(true);
                        self.app.rebuild_marks();
                        let vp = self.app.main_viewport;
                        self.app.view.move_cursor(1, vp);
                        self.app.request_redraw(Redraw::Full);
                    }
                } else {
                    self.app.confirm_input.clear();
                    self.app.mode = UiMode::ConfirmDelete;
                    self.app.request_redraw(Redraw::Full);
                }
            }
            Action::UnmarkSelected => {
                self.app.marks.remove_selected();
                if self.app.marks.is_empty() {
                    self.app.focus = FocusedPane::Main;
                }
                self.app.request_redraw(Redraw::Full);
            }
            Action::UnmarkAll => {
                self.app.marks.remove_all();
                self.app.focus = FocusedPane::Main;
                self.app.request_redraw(Redraw::Full);
            }

            Action::OpenSelected => self.open_selected(),

            Action::StartGlob => {
                self.app.glob_input.clear();
                self.app.mode = UiMode::GlobInput;
                self.app.request_redraw(Redraw::Full);
            }
            Action::InputChar(c) => {
                match self.app.mode {
                    UiMode::GlobInput => self.app.glob_input.push(c),
                    UiMode::ConfirmDelete => self.app.confirm_input.push(c),
                    _ => {}
                }
                self.app.request_redraw(Redraw::Full);
            }
            Action::InputBackspace => {
                match self.app.mode {
                    UiMode::GlobInput => {
                        self.app.glob_input.pop();
                    }
                    UiMode::ConfirmDelete => {
                        self.app.confirm_input.pop();
                    }
                    _ => {}
                }
                self.app.request_redraw(Redraw::Full);
            }
            Action::InputCancel => {
                self.app.mode = UiMode::Normal;
                self.app.request_redraw(Redraw::Full);
            }
            Action::InputSubmit => match self.app.mode {
                UiMode::GlobInput => self.commit_glob(),
                UiMode::ConfirmDelete => self.commit_delete(),
                _ => {}
            },

            Action::ToggleHelp => {
                self.app.mode = match self.app.mode {
                    UiMode::Help => UiMode::Normal,
                    _ => UiMode::Help,
                };
                self.app.request_redraw(Redraw::Full);
            }

            Action::SortBySize => self.resort(|m| m.toggle_size()),
            Action::SortByName => self.resort(|m| m.toggle_name()),
            Action::SortByMtime => self.resort(|m| m.toggle_mtime()),
            Action::SortByCount => self.resort(|m| m.toggle_count()),

            Action::ToggleMtimeColumn => {
                self.app.show_mtime = !self.app.show_mtime;
                self.app.view.invalidate_format_cache();
                self.app.request_redraw(Redraw::Full);
            }
            Action::ToggleCountColumn => {
                self.app.show_count = !self.app.show_count;
                self.app.view.invalidate_format_cache();
                self.app.request_redraw(Redraw::Full);
            }

            Action::RefreshSelected => {
                let target = self.app.view.selected().cloned();
                match target {
                    Some(target) if target.is_dir() => {
                        self.app.mode = UiMode::Refreshing;
                        self.pending_refresh = Some(RefreshKind::Selected(target));
                        self.app.request_redraw(Redraw::Full);
                    }
                    _ => {
                        self.app.status_note = Some("refresh: select a directory".into());
                        self.app.request_redraw(Redraw::Full);
                    }
                }
            }
            Action::RefreshAll => {
                self.app.mode = UiMode::Refreshing;
                self.pending_refresh = Some(RefreshKind::All);
                self.app.request_redraw(Redraw::Full);
            }

            Action::SwitchFocus => {
                self.app.focus = match self.app.focus {
                    FocusedPane::Main if self.app.mark_pane_visible() => FocusedPane::Mark,
                    _ => FocusedPane::Main,
                };
                self.app.request_redraw(Redraw::Full);
            }
            Action::SwitchTab(digit) => {
                self.app.marks.switch_tab(digit);
                self.app.request_redraw(Redraw::Full);
            }

            Action::PreviewSearchStart => {
                self.app.marks.preview_search_begin();
                self.app.request_redraw(Redraw::Full);
            }
            Action::PreviewSearchNext => {
                let vp = self.app.mark_viewport;
                self.app.marks.preview_search_step(true, vp);
                self.app.request_redraw(Redraw::Full);
            }
            Action::PreviewSearchPrev => {
                let vp = self.app.mark_viewport;
                self.app.marks.preview_search_step(false, vp);
                self.app.request_redraw(Redraw::Full);
            }
            Action::PreviewTop => {
                self.app.marks.preview_goto_top();
                self.app.request_redraw(Redraw::Full);
            }
            Action::PreviewBottom => {
                let vp = self.app.mark_viewport;
                self.app.marks.preview_goto_bottom(vp);
                self.app.request_redraw(Redraw::Full);
            }
        }
    }

    fn handle_preview_search_key(&mut self, key: KeyEvent) {
        use crossterm::event::KeyCode;
        match key.code {
            KeyCode::Esc => self.app.marks.preview_search_cancel(),
            KeyCode::Enter => {
                let vp = self.app.mark_viewport;
                self.app.marks.preview_search_commit(vp);
            }
            KeyCode::Backspace => self.app.marks.preview_search_pop(),
            KeyCode::Char(c) => self.app.marks.preview_search_push(c),
            _ => {}
        }
        self.app.request_redraw(Redraw::Full);
    }

    fn resort(&mut self, next: impl FnOnce(crate::model::view_model::SortMode) -> crate::model::view_model::SortMode) {
        let mode = next(self.app.view.sort());
        self.app.view.resort(mode);
        self.app.request_redraw(Redraw::Full);
    }

    fn commit_glob(&mut self) {
        self.app.mode = UiMode::Normal;
        let pattern = self.app.glob_input.clone();
        if pattern.is_empty() {
            self.app.request_redraw(Redraw::Full);
            return;
        }
        let current = Arc::clone(self.app.current_dir());
        match glob::search(&current, &pattern) {
            Ok(matches) if !matches.is_empty() => {
                let results = glob::results_dir(matches);
                self.app.enter_dir(results);
            }
            Ok(_) => {
                self.app.status_note = Some(format!("no matches for '{pattern}'"));
            }
            Err(err) => {
                self.app.status_note = Some(err.to_string());
            }
        }
        self.app.request_redraw(Redraw::Full);
    }

    fn commit_delete(&mut self) {
        let confirmed = self.app.confirm_input == "YES";
        self.app.confirm_input.clear();
        self.app.mode = UiMode::Normal;
        self.app.request_redraw(Redraw::Full);
        if !confirmed {
            return;
        }

        let outcome = self.app.marks.delete_all();
        self.app.status_note = Some(if outcome.failed > 0 {
            format!(
                "deleted {} items, {} failed",
                outcome.deleted, outcome.failed
            )
        } else {
            format!("deleted {} items", outcome.deleted)
        });

        // Node identities change wholesale; rescan everything.
        self.app.mode = UiMode::Refreshing;
        self.pending_refresh = Some(RefreshKind::All);
    }

    fn run_refresh(&mut self, kind: RefreshKind) {
        let walker = Walker::new(self.app.config.clone());
        match kind {
            RefreshKind::Selected(target) => {
                match walker.scan(&[target.path().to_path_buf()]) {
                    Ok(mut fresh_roots) if !fresh_roots.is_empty() => {
                        let fresh = fresh_roots.remove(0);
                        target.replace_children(fresh.children());
                        target.set_size(fresh.size());
                        target.set_apparent_size(fresh.apparent_size());
                        target.set_entry_count(fresh.entry_count());
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "refresh failed");
                        self.app.status_note = Some(format!("refresh failed: {err}"));
                    }
                }
                self.app.rebuild_marks();
                self.app.rebuild_view();
            }
            RefreshKind::All => {
                let paths = self.app.root_paths.clone();
                match walker.scan(&paths) {
                    Ok(fresh_roots) => self.app.reset_roots(fresh_roots),
                    Err(err) => {
                        warn!(error = %err, "full refresh failed");
                        self.app.status_note = Some(format!("refresh failed: {err}"));
                    }
                }
            }
        }
        self.app.mode = UiMode::Normal;
        self.app.request_redraw(Redraw::Full);
    }

    /// Fire-and-forget delegation to the platform opener; failures are
    /// silent by contract.
    fn open_selected(&self) {
        let Some(entry) = self.app.view.selected() else {
            return;
        };
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        let _ = Command::new(opener)
            .arg(entry.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}

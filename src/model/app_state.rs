//! Central mutable state for the interactive session.
//!
//! All mutation happens on the UI thread; the scanner only touches the tree
//! during the initial scan and refresh, during which the controller accepts
//! no other actions.

use std::{path::PathBuf, sync::Arc};

use crate::{
    fs::{
        entry::{Entry, EntryRef},
        walker::WalkConfig,
    },
    model::{mark_set::MarkSet, view_model::DirView},
    util::format::ByteFormat,
};

/// Top-level controller modes; transitions are driven by `map_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Normal,
    GlobInput,
    Help,
    ConfirmDelete,
    Refreshing,
}

/// Exactly one pane has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPane {
    #[default]
    Main,
    Mark,
}

/// Dirty level for the differential renderer. `Cursor` means only the
/// highlight moved inside the visible window; `Full` repaints the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Redraw {
    #[default]
    None,
    Cursor,
    Full,
}

pub struct AppState {
    pub config: WalkConfig,
    pub format: ByteFormat,
    /// The scanned roots; identity changes on refresh_all.
    pub roots: Vec<EntryRef>,
    /// The originally configured root paths, for refresh_all.
    pub root_paths: Vec<PathBuf>,
    /// Navigation stack; the last element is the current directory.
    pub nav: Vec<EntryRef>,
    pub view: DirView,
    pub marks: MarkSet,
    pub mode: UiMode,
    pub focus: FocusedPane,
    pub show_mtime: bool,
    pub show_count: bool,
    pub glob_input: String,
    pub confirm_input: String,
    /// One-line note shown in the status bar until the next action.
    pub status_note: Option<String>,
    pub redraw: Redraw,
    pub should_quit: bool,
    /// Rows available to the main table, updated at render time.
    pub main_viewport: usize,
    /// Rows available to the mark pane list / preview.
    pub mark_viewport: usize,
}

impl AppState {
    pub fn new(
        roots: Vec<EntryRef>,
        root_paths: Vec<PathBuf>,
        config: WalkConfig,
        format: ByteFormat,
    ) -> Self {
        let top = top_level(&roots);
        let mut view = DirView::default();
        view.rebuild_from(&top);

        Self {
            config,
            format,
            roots,
            root_paths,
            nav: vec![top],
            view,
            marks: MarkSet::default(),
            mode: UiMode::Normal,
            focus: FocusedPane::Main,
            show_mtime: false,
            show_count: false,
            glob_input: String::new(),
            confirm_input: String::new(),
            status_note: None,
            redraw: Redraw::Full,
            should_quit: false,
            main_viewport: 20,
            mark_viewport: 20,
        }
    }

    pub fn current_dir(&self) -> &EntryRef {
        self.nav.last().expect("navigation stack is never empty")
    }

    /// Replace the forest after refresh_all: new roots, reset navigation.
    pub fn reset_roots(&mut self, roots: Vec<EntryRef>) {
        let top = top_level(&roots);
        self.roots = roots;
        self.view.rebuild_from(&top);
        self.nav = vec![top];
        self.rebuild_marks();
        self.request_redraw(Redraw::Full);
    }

    /// Descend into `dir`, pushing it on the navigation stack.
    pub fn enter_dir(&mut self, dir: EntryRef) {
        self.view.rebuild_from(&dir);
        self.nav.push(dir);
        self.request_redraw(Redraw::Full);
    }

    /// Pop back to the parent directory; no-op at a root.
    pub fn leave_dir(&mut self) {
        if self.nav.len() > 1 {
            self.nav.pop();
            let current = Arc::clone(self.current_dir());
            self.view.rebuild_from(&current);
            self.request_redraw(Redraw::Full);
        }
    }

    /// Re-project the current directory (after marks, deletion, refresh).
    pub fn rebuild_view(&mut self) {
        let current = Arc::clone(self.current_dir());
        self.view.rebuild_from(&current);
        self.request_redraw(Redraw::Full);
    }

    pub fn rebuild_marks(&mut self) {
        self.marks.rebuild(&self.roots);
        if self.marks.is_empty() && self.focus == FocusedPane::Mark {
            self.focus = FocusedPane::Main;
        }
    }

    /// The mark pane is shown whenever there is something to show in it.
    pub fn mark_pane_visible(&self) -> bool {
        !self.marks.is_empty() || self.marks.quickview_active()
    }

    /// Merge a dirty level in; a stronger level wins.
    pub fn request_redraw(&mut self, level: Redraw) {
        self.redraw = self.redraw.max(level);
    }
}

/// The directory the UI starts in: the single root, or a synthesized parent
/// over all of them.
fn top_level(roots: &[EntryRef]) -> EntryRef {
    if roots.len() == 1 {
        return Arc::clone(&roots[0]);
    }
    let virtual_root = Entry::virtual_dir("");
    for root in roots {
        virtual_root.add_size(root.size());
        virtual_root.add_entry_count(root.entry_count());
        virtual_root.push_child(Arc::clone(root));
    }
    virtual_root.sort_children_by_size();
    Arc::new(virtual_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        entry.set_size(size);
        Arc::new(entry)
    }

    fn state_with_tree() -> AppState {
        let root = Arc::new(Entry::virtual_dir("root"));
        let sub = Arc::new(Entry::virtual_dir("root/sub"));
        sub.set_size(30);
        sub.push_child(leaf("root/sub/x", 30));
        root.push_child(sub);
        root.push_child(leaf("root/a", 12));
        root.set_size(42);
        AppState::new(
            vec![root],
            vec![PathBuf::from("root")],
            WalkConfig::default(),
            ByteFormat::Metric,
        )
    }

    #[test]
    fn single_root_is_the_top_level() {
        let state = state_with_tree();
        assert_eq!(state.current_dir().path().to_string_lossy(), "root");
        assert_eq!(state.view.len(), 2);
    }

    #[test]
    fn multiple_roots_get_a_virtual_parent() {
        let a = leaf("a", 10);
        let b = leaf("b", 5);
        let state = AppState::new(
            vec![a, b],
            vec![PathBuf::from("a"), PathBuf::from("b")],
            WalkConfig::default(),
            ByteFormat::Metric,
        );
        assert_eq!(state.current_dir().size(), 15);
        assert_eq!(state.view.len(), 2);
    }

    #[test]
    fn enter_and_leave_walk_the_stack() {
        let mut state = state_with_tree();
        let sub = Arc::clone(&state.view.entries()[0]);
        assert!(sub.is_dir());

        state.enter_dir(sub);
        assert_eq!(state.nav.len(), 2);
        assert_eq!(state.view.len(), 1);

        state.leave_dir();
        assert_eq!(state.nav.len(), 1);
        assert_eq!(state.view.len(), 2);

        // Leaving a root is a no-op.
        state.leave_dir();
        assert_eq!(state.nav.len(), 1);
    }

    #[test]
    fn redraw_levels_merge_upward() {
        let mut state = state_with_tree();
        state.redraw = Redraw::None;
        state.request_redraw(Redraw::Cursor);
        assert_eq!(state.redraw, Redraw::Cursor);
        state.request_redraw(Redraw::Full);
        assert_eq!(state.redraw, Redraw::Full);
        state.request_redraw(Redraw::Cursor);
        assert_eq!(state.redraw, Redraw::Full);
    }
}

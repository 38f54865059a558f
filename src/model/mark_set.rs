//! Cross-tree set of marked entries, its pane state, and the deletion loop.
//!
//! The set is always rebuilt from scratch by sweeping the roots: membership
//! is exactly the reachable entries whose mark flag is set, so it can never
//! hold stale nodes after a refresh or deletion.

use std::{fs, sync::Arc};

use tracing::{debug, warn};

use crate::{
    fs::entry::{EntryKind, EntryRef},
    quickview::{self, Preview, PreviewScroll},
};

/// Mark pane tabs, switched by digit keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkTab {
    QuickView,
    #[default]
    MarkedFiles,
}

/// Outcome of one deletion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub deleted: usize,
    pub failed: usize,
}

/// In-preview search: pattern entry, committed matches, current match.
#[derive(Debug, Default)]
pub struct PreviewSearch {
    input: Option<String>,
    pattern: String,
    matches: Vec<usize>,
    current: usize,
}

impl PreviewSearch {
    pub fn typing(&self) -> bool {
        self.input.is_some()
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn status(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return None;
        }
        if self.matches.is_empty() {
            Some(format!("'{}': no matches", self.pattern))
        } else {
            Some(format!(
                "'{}': match {}/{}",
                self.pattern,
                self.current + 1,
                self.matches.len()
            ))
        }
    }

    fn reset(&mut self) {
        *self = PreviewSearch::default();
    }
}

#[derive(Default)]
pub struct MarkSet {
    /// Marked entries ordered by path.
    entries: Vec<EntryRef>,
    total_size: u64,
    cursor: usize,
    top: usize,
    tab: MarkTab,
    preview: Option<Preview>,
    preview_scroll: PreviewScroll,
    preview_search: PreviewSearch,
}

impl MarkSet {
    /// Depth-first sweep over all roots, replacing the projection.
    pub fn rebuild(&mut self, roots: &[EntryRef]) {
        self.entries.clear();
        for root in roots {
            collect_marked(root, &mut self.entries);
        }
        self.entries
            .sort_unstable_by(|a, b| a.path().cmp(b.path()));
        self.total_size = self.entries.iter().map(|e| e.size()).sum();
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
        if self.entries.is_empty() {
            self.top = 0;
            self.deactivate_quickview();
        }
        self.refresh_preview();
    }

    pub fn entries(&self) -> &[EntryRef] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn tab(&self) -> MarkTab {
        self.tab
    }

    pub fn selected(&self) -> Option<&EntryRef> {
        self.entries.get(self.cursor)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn preview_scroll(&self) -> PreviewScroll {
        self.preview_scroll
    }

    pub fn move_cursor(&mut self, delta: i64, height: usize) {
        if self.entries.is_empty() {
            return;
        }
        let last = self.entries.len() - 1;
        self.cursor = if delta.is_negative() {
            self.cursor.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (self.cursor + delta as usize).min(last)
        };
        let height = height.max(1);
        if self.cursor < self.top {
            self.top = self.cursor;
        } else if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
        self.refresh_preview();
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
        self.top = 0;
        self.refresh_preview();
    }

    pub fn move_end(&mut self, height: usize) {
        self.cursor = self.entries.len().saturating_sub(1);
        self.top = self.entries.len().saturating_sub(height.max(1));
        self.refresh_preview();
    }

    pub fn scroll_preview(&mut self, delta: i64, height: usize) {
        if let Some(preview) = &self.preview {
            self.preview_scroll
                .scroll(delta, preview.lines.len(), height);
        }
    }

    pub fn preview_search(&self) -> &PreviewSearch {
        &self.preview_search
    }

    pub fn preview_search_begin(&mut self) {
        if self.preview.is_some() {
            self.preview_search.input = Some(String::new());
        }
    }

    pub fn preview_search_push(&mut self, c: char) {
        if let Some(input) = &mut self.preview_search.input {
            input.push(c);
        }
    }

    pub fn preview_search_pop(&mut self) {
        if let Some(input) = &mut self.preview_search.input {
            input.pop();
        }
    }

    pub fn preview_search_cancel(&mut self) {
        self.preview_search.input = None;
    }

    /// Commit the typed pattern: collect matches and jump to the first.
    pub fn preview_search_commit(&mut self, height: usize) {
        let Some(pattern) = self.preview_search.input.take() else {
            return;
        };
        let Some(preview) = &self.preview else {
            return;
        };
        self.preview_search.matches = preview.find_matches(&pattern);
        self.preview_search.pattern = pattern;
        self.preview_search.current = 0;
        if let Some(&line) = self.preview_search.matches.first() {
            self.preview_scroll
                .jump_to(line, preview.lines.len(), height);
        }
    }

    /// Advance to the next/previous match, wrapping around.
    pub fn preview_search_step(&mut self, forward: bool, height: usize) {
        let Some(preview) = &self.preview else {
            return;
        };
        let matches = &self.preview_search.matches;
        if matches.is_empty() {
            return;
        }
        let len = matches.len();
        self.preview_search.current = if forward {
            (self.preview_search.current + 1) % len
        } else {
            (self.preview_search.current + len - 1) % len
        };
        let line = matches[self.preview_search.current];
        self.preview_scroll
            .jump_to(line, preview.lines.len(), height);
    }

    pub fn preview_goto_top(&mut self) {
        self.preview_scroll.home();
    }

    pub fn preview_goto_bottom(&mut self, height: usize) {
        if let Some(preview) = &self.preview {
            self.preview_scroll.end(preview.lines.len(), height);
        }
    }

    /// Switch tabs by 1-based digit; entering QuickView generates a preview
    /// of the selected entry.
    pub fn switch_tab(&mut self, digit: u32) {
        match digit {
            1 => {
                self.tab = MarkTab::QuickView;
                self.refresh_preview();
            }
            2 => self.tab = MarkTab::MarkedFiles,
            _ => {}
        }
    }

    pub fn quickview_active(&self) -> bool {
        self.tab == MarkTab::QuickView && self.preview.is_some()
    }

    pub fn deactivate_quickview(&mut self) {
        self.tab = MarkTab::MarkedFiles;
        self.preview = None;
        self.preview_scroll = PreviewScroll::default();
        self.preview_search.reset();
    }

    /// Unmark the selected entry and drop it from the projection.
    pub fn remove_selected(&mut self) {
        if self.cursor >= self.entries.len() {
            return;
        }
        let entry = self.entries.remove(self.cursor);
        entry.set_marked(false);
        self.total_size = self.total_size.saturating_sub(entry.size());
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
        if self.entries.is_empty() {
            self.deactivate_quickview();
        }
        self.refresh_preview();
    }

    /// Unmark every entry in the set.
    pub fn remove_all(&mut self) {
        for entry in self.entries.drain(..) {
            entry.set_marked(false);
        }
        self.total_size = 0;
        self.cursor = 0;
        self.top = 0;
        self.deactivate_quickview();
    }

    /// Delete every marked entry from the filesystem. Failures are
    /// swallowed per entry; a successful removal clears the mark. The
    /// caller is expected to run a full refresh afterwards.
    pub fn delete_all(&mut self) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();

        for entry in &self.entries {
            let result = match entry.kind() {
                EntryKind::Directory => fs::remove_dir_all(entry.path()),
                // Symlinks are removed as symlinks; remove_file does not
                // follow them.
                EntryKind::File | EntryKind::Symlink => fs::remove_file(entry.path()),
            };
            match result {
                Ok(()) => {
                    entry.set_marked(false);
                    outcome.deleted += 1;
                    debug!(path = %entry.path().display(), "deleted");
                }
                Err(err) => {
                    outcome.failed += 1;
                    warn!(path = %entry.path().display(), error = %err, "deletion failed");
                }
            }
        }

        outcome
    }

    /// Selected-path regeneration for the QuickView tab.
    fn refresh_preview(&mut self) {
        if self.tab != MarkTab::QuickView {
            return;
        }
        let selected_path = self.selected().map(|e| e.path().to_path_buf());
        match selected_path {
            Some(path) => {
                let stale = self
                    .preview
                    .as_ref()
                    .map(|p| p.path != path)
                    .unwrap_or(true);
                if stale {
                    self.preview = Some(quickview::generate(&path));
                    self.preview_scroll = PreviewScroll::default();
                    self.preview_search.reset();
                }
            }
            None => {
                self.preview = None;
            }
        }
    }
}

fn collect_marked(entry: &EntryRef, out: &mut Vec<EntryRef>) {
    if entry.is_marked() {
        out.push(Arc::clone(entry));
    }
    // A marked directory's descendants can carry marks of their own.
    if entry.is_dir() {
        for child in entry.children() {
            collect_marked(&child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;

    fn leaf(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        entry.set_size(size);
        Arc::new(entry)
    }

    fn sample_roots() -> Vec<EntryRef> {
        let root = Arc::new(Entry::virtual_dir("root"));
        root.push_child(leaf("root/a", 10));
        root.push_child(leaf("root/b", 20));
        let sub = Arc::new(Entry::virtual_dir("root/sub"));
        sub.push_child(leaf("root/sub/c", 30));
        root.push_child(sub);
        vec![root]
    }

    #[test]
    fn membership_equals_marked_flags() {
        let roots = sample_roots();
        let children = roots[0].children();
        children[0].set_marked(true); // a
        children[2].children()[0].set_marked(true); // sub/c

        let mut marks = MarkSet::default();
        marks.rebuild(&roots);

        assert_eq!(marks.len(), 2);
        assert_eq!(marks.total_size(), 40);
        assert!(marks.entries().iter().all(|e| e.is_marked()));
    }

    #[test]
    fn projection_is_path_ordered() {
        let roots = sample_roots();
        for child in roots[0].children() {
            child.set_marked(true);
        }
        let mut marks = MarkSet::default();
        marks.rebuild(&roots);

        let paths: Vec<_> = marks
            .entries()
            .iter()
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn marked_directory_and_marked_descendant_both_appear() {
        let roots = sample_roots();
        let sub = &roots[0].children()[2];
        sub.set_size(30);
        sub.set_marked(true);
        sub.children()[0].set_marked(true);

        let mut marks = MarkSet::default();
        marks.rebuild(&roots);

        // Membership is exactly the set of marked entries, so both the
        // directory and the file inside it are listed.
        assert_eq!(marks.len(), 2);
        assert_eq!(marks.total_size(), 60);
    }

    #[test]
    fn remove_selected_clears_flag() {
        let roots = sample_roots();
        roots[0].children()[0].set_marked(true);
        let mut marks = MarkSet::default();
        marks.rebuild(&roots);

        marks.remove_selected();
        assert!(marks.is_empty());
        assert_eq!(marks.total_size(), 0);
        assert!(!roots[0].children()[0].is_marked());
    }

    #[test]
    fn remove_all_clears_everything() {
        let roots = sample_roots();
        for child in roots[0].children() {
            child.set_marked(true);
        }
        let mut marks = MarkSet::default();
        marks.rebuild(&roots);
        assert!(!marks.is_empty());

        marks.remove_all();
        assert!(marks.is_empty());
        assert!(roots[0].children().iter().all(|c| !c.is_marked()));
    }
}

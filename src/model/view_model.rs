//! Per-directory view projection: a sorted snapshot of one directory's
//! children plus cursor, scroll offset and a memoized row-format cache.

use std::cmp::Ordering as CmpOrdering;
use std::time::SystemTime;

use compact_str::CompactString;

use crate::{
    fs::entry::EntryRef,
    util::format::{format_mtime, ByteFormat},
};

/// Active sort mode for the main pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SortMode {
    #[default]
    SizeDesc = 0,
    SizeAsc = 1,
    NameAsc = 2,
    NameDesc = 3,
    MtimeDesc = 4,
    MtimeAsc = 5,
    CountDesc = 6,
    CountAsc = 7,
}

impl SortMode {
    /// Toggle between the two directions of a key, entering at the
    /// conventional direction when coming from another key.
    pub fn toggle_size(self) -> Self {
        match self {
            SortMode::SizeDesc => SortMode::SizeAsc,
            _ => SortMode::SizeDesc,
        }
    }

    pub fn toggle_name(self) -> Self {
        match self {
            SortMode::NameAsc => SortMode::NameDesc,
            _ => SortMode::NameAsc,
        }
    }

    pub fn toggle_mtime(self) -> Self {
        match self {
            SortMode::MtimeDesc => SortMode::MtimeAsc,
            _ => SortMode::MtimeDesc,
        }
    }

    pub fn toggle_count(self) -> Self {
        match self {
            SortMode::CountDesc => SortMode::CountAsc,
            _ => SortMode::CountDesc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::SizeDesc => "size descending",
            SortMode::SizeAsc => "size ascending",
            SortMode::NameAsc => "name ascending",
            SortMode::NameDesc => "name descending",
            SortMode::MtimeDesc => "modified descending",
            SortMode::MtimeAsc => "modified ascending",
            SortMode::CountDesc => "count descending",
            SortMode::CountAsc => "count ascending",
        }
    }
}

/// Memoized display strings for one visible row.
#[derive(Debug, Clone)]
pub struct RowCache {
    pub size: CompactString,
    pub percent: f64,
    pub mtime: CompactString,
    pub name: CompactString,
}

/// Ephemeral projection of the current directory.
#[derive(Default)]
pub struct DirView {
    entries: Vec<EntryRef>,
    cursor: usize,
    top: usize,
    sort: SortMode,
    rows: Vec<Option<RowCache>>,
    parent_size: u64,
}

impl DirView {
    /// Snapshot and sort the children of `dir`.
    pub fn rebuild_from(&mut self, dir: &EntryRef) {
        self.entries = dir.children();
        self.parent_size = dir.size();
        self.apply_sort();
        self.cursor = 0;
        self.top = 0;
        self.invalidate_format_cache();
    }

    pub fn entries(&self) -> &[EntryRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn parent_size(&self) -> u64 {
        self.parent_size
    }

    pub fn selected(&self) -> Option<&EntryRef> {
        self.entries.get(self.cursor)
    }

    /// Change the sort mode and re-project; cursor returns to the top.
    pub fn resort(&mut self, mode: SortMode) {
        self.sort = mode;
        self.apply_sort();
        self.cursor = 0;
        self.top = 0;
        self.invalidate_format_cache();
    }

    /// Move the cursor by a signed delta, clamped, adjusting the scroll
    /// offset so the cursor stays inside a viewport of `height` rows.
    pub fn move_cursor(&mut self, delta: i64, height: usize) {
        if self.entries.is_empty() {
            return;
        }
        let last = self.entries.len() - 1;
        let target = if delta.is_negative() {
            self.cursor.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (self.cursor + delta as usize).min(last)
        };
        self.cursor = target;
        self.scroll_to_cursor(height);
    }

    pub fn move_home(&mut self, height: usize) {
        self.cursor = 0;
        self.scroll_to_cursor(height);
    }

    pub fn move_end(&mut self, height: usize) {
        self.cursor = self.entries.len().saturating_sub(1);
        self.scroll_to_cursor(height);
    }

    fn scroll_to_cursor(&mut self, height: usize) {
        let height = height.max(1);
        if self.cursor < self.top {
            self.top = self.cursor;
        } else if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
    }

    /// Drop every memoized row string; the next render refills lazily.
    pub fn invalidate_format_cache(&mut self) {
        self.rows = vec![None; self.entries.len()];
    }

    /// Formatted strings for row `index`, computed on first use.
    pub fn row(&mut self, index: usize, format: ByteFormat) -> Option<&RowCache> {
        if index >= self.entries.len() {
            return None;
        }
        if self.rows.len() != self.entries.len() {
            self.invalidate_format_cache();
        }
        if self.rows[index].is_none() {
            let entry = &self.entries[index];
            let percent = if self.parent_size > 0 {
                entry.size() as f64 / self.parent_size as f64 * 100.0
            } else {
                0.0
            };
            let mtime = entry
                .mtime()
                .map(format_mtime)
                .unwrap_or_else(|| "-".to_string());
            let name = match entry.symlink_target() {
                Some(target) => format!("{} -> {}", entry.name(), target.display()),
                None => entry.name().into_owned(),
            };
            self.rows[index] = Some(RowCache {
                size: format.format(entry.size()).into(),
                percent,
                mtime: mtime.into(),
                name: name.into(),
            });
        }
        self.rows[index].as_ref()
    }

    fn apply_sort(&mut self) {
        let sort = self.sort;
        self.entries.sort_unstable_by(|a, b| {
            let ordering = match sort {
                SortMode::SizeDesc => b.size().cmp(&a.size()),
                SortMode::SizeAsc => a.size().cmp(&b.size()),
                SortMode::NameAsc => a.name().cmp(&b.name()),
                SortMode::NameDesc => b.name().cmp(&a.name()),
                SortMode::MtimeDesc => cmp_mtime(b, a),
                SortMode::MtimeAsc => cmp_mtime(a, b),
                SortMode::CountDesc => b.entry_count().cmp(&a.entry_count()),
                SortMode::CountAsc => a.entry_count().cmp(&b.entry_count()),
            };
            ordering.then_with(|| a.path().cmp(b.path()))
        });
    }
}

fn cmp_mtime(a: &EntryRef, b: &EntryRef) -> CmpOrdering {
    let a = a.mtime().unwrap_or(SystemTime::UNIX_EPOCH);
    let b = b.mtime().unwrap_or(SystemTime::UNIX_EPOCH);
    a.cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;
    use std::sync::Arc;

    fn dir_with(sizes: &[(&str, u64)]) -> EntryRef {
        let dir = Arc::new(Entry::virtual_dir("root"));
        let mut total = 0;
        for (name, size) in sizes {
            let child = Entry::virtual_dir(format!("root/{name}"));
            child.set_size(*size);
            dir.push_child(Arc::new(child));
            total += size;
        }
        dir.set_size(total);
        dir
    }

    #[test]
    fn default_sort_is_size_descending() {
        let dir = dir_with(&[("small", 1), ("big", 100), ("mid", 10)]);
        let mut view = DirView::default();
        view.rebuild_from(&dir);

        let names: Vec<String> = view.entries().iter().map(|e| e.name().into_owned()).collect();
        assert_eq!(names, ["big", "mid", "small"]);
    }

    #[test]
    fn sorting_twice_is_a_noop() {
        let dir = dir_with(&[("a", 5), ("b", 5), ("c", 9)]);
        let mut view = DirView::default();
        view.rebuild_from(&dir);

        let first: Vec<_> = view.entries().iter().map(|e| e.path().to_owned()).collect();
        view.resort(SortMode::SizeDesc);
        let second: Vec<_> = view.entries().iter().map(|e| e.path().to_owned()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ties_break_by_path() {
        let dir = dir_with(&[("zz", 7), ("aa", 7)]);
        let mut view = DirView::default();
        view.rebuild_from(&dir);

        let names: Vec<String> = view.entries().iter().map(|e| e.name().into_owned()).collect();
        assert_eq!(names, ["aa", "zz"]);
    }

    #[test]
    fn cursor_clamps_and_scrolls() {
        let dir = dir_with(&[("a", 9), ("b", 8), ("c", 7), ("d", 6), ("e", 5)]);
        let mut view = DirView::default();
        view.rebuild_from(&dir);

        view.move_cursor(100, 3);
        assert_eq!(view.cursor(), 4);
        assert_eq!(view.top(), 2);

        view.move_cursor(-100, 3);
        assert_eq!(view.cursor(), 0);
        assert_eq!(view.top(), 0);
    }

    #[test]
    fn row_cache_formats_percent_of_parent() {
        let dir = dir_with(&[("half", 50), ("other", 50)]);
        let mut view = DirView::default();
        view.rebuild_from(&dir);

        let row = view.row(0, ByteFormat::Bytes).unwrap();
        assert_eq!(row.size, "50 B");
        assert!((row.percent - 50.0).abs() < f64::EPSILON);
    }
}

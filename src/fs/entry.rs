//! Shared mutable entry tree built by the scanner and browsed by the TUI.
//!
//! Nodes are reference counted with no parent pointers; removal is always
//! performed by the holder of the parent, and the controller keeps a
//! navigation stack instead of back references. Numeric fields are atomic
//! so the scanner can attribute sizes without taking the child-list lock.

use std::{
    borrow::Cow,
    fs::Metadata,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::SystemTime,
};

use parking_lot::{Mutex, MutexGuard};

pub type EntryRef = Arc<Entry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryKind {
    File = 0,
    Directory = 1,
    Symlink = 2,
}

/// A node in the scanned forest.
#[derive(Debug)]
pub struct Entry {
    path: PathBuf,
    kind: EntryKind,
    /// Effective bytes attributed to this subtree.
    size: AtomicU64,
    /// Raw byte length (files) or sum thereof (directories).
    apparent_size: AtomicU64,
    /// Counted descendants; 0 or 1 for files, recursive for directories.
    entry_count: AtomicU64,
    marked: AtomicBool,
    mtime: Option<SystemTime>,
    device_id: u64,
    inode: u64,
    link_count: u64,
    symlink_target: Option<PathBuf>,
    children: Mutex<Vec<EntryRef>>,
}

impl Entry {
    /// Build an entry from metadata obtained via `symlink_metadata`, so
    /// symlinks are described rather than followed.
    pub fn from_metadata(path: PathBuf, meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let symlink_target = if kind == EntryKind::Symlink {
            std::fs::read_link(&path).ok()
        } else {
            None
        };

        // mtime is undefined for symlinks.
        let mtime = if kind == EntryKind::Symlink {
            None
        } else {
            meta.modified().ok()
        };

        let (device_id, inode, link_count) = platform_identity(meta);

        let apparent = if kind == EntryKind::File { meta.len() } else { 0 };

        Entry {
            path,
            kind,
            size: AtomicU64::new(0),
            apparent_size: AtomicU64::new(apparent),
            entry_count: AtomicU64::new(0),
            marked: AtomicBool::new(false),
            mtime,
            device_id,
            inode,
            link_count,
            symlink_target,
            children: Mutex::new(Vec::new()),
        }
    }

    /// A synthesized directory that does not exist on disk, used for the
    /// multi-root view and for search results.
    pub fn virtual_dir<P: Into<PathBuf>>(path: P) -> Self {
        Entry {
            path: path.into(),
            kind: EntryKind::Directory,
            size: AtomicU64::new(0),
            apparent_size: AtomicU64::new(0),
            entry_count: AtomicU64::new(0),
            marked: AtomicBool::new(false),
            mtime: None,
            device_id: 0,
            inode: 0,
            link_count: 0,
            symlink_target: None,
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Basename for display; falls back to the full path for roots like `/`
    /// or `.`.
    pub fn name(&self) -> Cow<'_, str> {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.path.to_string_lossy(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    pub fn set_size(&self, size: u64) {
        self.size.store(size, Ordering::Relaxed);
    }

    pub fn add_size(&self, delta: u64) {
        self.size.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn apparent_size(&self) -> u64 {
        self.apparent_size.load(Ordering::Relaxed)
    }

    pub fn set_apparent_size(&self, size: u64) {
        self.apparent_size.store(size, Ordering::Relaxed);
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    pub fn set_entry_count(&self, count: u64) {
        self.entry_count.store(count, Ordering::Relaxed);
    }

    pub fn add_entry_count(&self, delta: u64) {
        self.entry_count.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    pub fn link_count(&self) -> u64 {
        self.link_count
    }

    /// `(device, inode)` pair identifying a file independently of its path.
    pub fn inode_key(&self) -> (u64, u64) {
        (self.device_id, self.inode)
    }

    pub fn symlink_target(&self) -> Option<&Path> {
        self.symlink_target.as_deref()
    }

    pub fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Relaxed)
    }

    pub fn set_marked(&self, marked: bool) {
        self.marked.store(marked, Ordering::Relaxed);
    }

    pub fn toggle_marked(&self) -> bool {
        !self.marked.fetch_xor(true, Ordering::Relaxed)
    }

    /// Append a child under the child-list lock; safe during the concurrent
    /// scan phase.
    pub fn push_child(&self, child: EntryRef) {
        self.children.lock().push(child);
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<EntryRef> {
        self.children.lock().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    pub fn children_guard(&self) -> MutexGuard<'_, Vec<EntryRef>> {
        self.children.lock()
    }

    /// Replace the entire child list (refresh splices results back in here).
    pub fn replace_children(&self, children: Vec<EntryRef>) {
        *self.children.lock() = children;
    }

    /// Remove one child by node identity. Returns true when removed.
    pub fn remove_child(&self, child: &EntryRef) -> bool {
        let mut children = self.children.lock();
        let before = children.len();
        children.retain(|c| !Arc::ptr_eq(c, child));
        children.len() != before
    }

    /// Sort children by size, descending, with path as the tie-break.
    pub fn sort_children_by_size(&self) {
        self.children
            .lock()
            .sort_unstable_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.path.cmp(&b.path)));
    }
}

#[cfg(unix)]
fn platform_identity(meta: &Metadata) -> (u64, u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (meta.dev(), meta.ino(), meta.nlink())
}

#[cfg(not(unix))]
fn platform_identity(_meta: &Metadata) -> (u64, u64, u64) {
    (0, 0, 1)
}

/// On-disk (block-rounded) size of a file. Uses the filesystem's allocated
/// block count where available, otherwise rounds up to 4 KiB blocks.
#[cfg(unix)]
pub fn size_on_disk(meta: &Metadata, _apparent: u64) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks() * 512
}

#[cfg(not(unix))]
pub fn size_on_disk(_meta: &Metadata, apparent: u64) -> u64 {
    const BLOCK: u64 = 4096;
    apparent.div_ceil(BLOCK) * BLOCK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_entry(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        // Repurpose a virtual node as a file-shaped leaf for sort tests.
        entry.set_size(size);
        Arc::new(entry)
    }

    #[test]
    fn sort_children_is_descending_with_path_tiebreak() {
        let dir = Entry::virtual_dir("root");
        dir.push_child(file_entry("root/b", 10));
        dir.push_child(file_entry("root/a", 10));
        dir.push_child(file_entry("root/c", 30));
        dir.sort_children_by_size();

        let names: Vec<String> = dir
            .children()
            .iter()
            .map(|c| c.path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["root/c", "root/a", "root/b"]);
    }

    #[test]
    fn remove_child_matches_by_identity() {
        let dir = Entry::virtual_dir("root");
        let a = file_entry("root/a", 1);
        let twin = file_entry("root/a", 1);
        dir.push_child(a.clone());
        dir.push_child(twin.clone());

        assert!(dir.remove_child(&a));
        let rest = dir.children();
        assert_eq!(rest.len(), 1);
        assert!(Arc::ptr_eq(&rest[0], &twin));
    }

    #[test]
    fn toggle_marked_flips_state() {
        let entry = Entry::virtual_dir("x");
        assert!(!entry.is_marked());
        assert!(entry.toggle_marked());
        assert!(entry.is_marked());
        assert!(!entry.toggle_marked());
        assert!(!entry.is_marked());
    }
}

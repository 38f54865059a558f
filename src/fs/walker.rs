//! Parallel filesystem walker.
//!
//! Walks a forest of roots on the worker pool, building the shared entry
//! tree under concurrent mutation. Attribution rules: symlinks are inert,
//! hard links are deduplicated by inode key unless disabled, children on a
//! foreign device are kept visible but never attributed or entered, and
//! ignored or already-visited canonical paths are not re-entered.
//!
//! Failure semantics: partial results are always delivered. Per-directory
//! enumeration failures and per-file stat failures are tallied and reported
//! on completion; they never abort the scan.

use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::{
    error::{AppError, AppResult},
    fs::{
        entry::{size_on_disk, Entry, EntryKind, EntryRef},
        progress::ProgressReporter,
    },
    pool::{PoolHandle, WorkerPool},
    util::format::ByteFormat,
};

/// Bound on a single directory enumeration; a stalled mount must not block
/// scan completion.
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Scanner configuration, passed by reference to every scanning task.
#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// Use file length as `size` instead of block-rounded disk usage.
    pub apparent_size: bool,
    /// Count every hard-link reference instead of deduplicating by inode.
    pub count_hard_links: bool,
    /// Skip attribution of children on a different device than their root.
    pub stay_on_filesystem: bool,
    /// Canonicalized absolute paths whose subtrees are skipped.
    pub ignore_dirs: HashSet<PathBuf>,
    /// Worker count for the task pool; 0 selects hardware parallelism.
    pub thread_count: usize,
    /// Throttled stderr progress line.
    pub show_progress: bool,
}

/// Scan counters, all atomics so workers update them without coordination.
#[derive(Debug, Default)]
pub struct WalkStats {
    pub files: AtomicU64,
    pub dirs: AtomicU64,
    pub symlinks: AtomicU64,
    pub io_errors: AtomicU64,
    pub skipped_dirs: AtomicU64,
    pub traversed: AtomicU64,
    pub total_size: AtomicU64,
}

impl WalkStats {
    pub fn io_errors(&self) -> u64 {
        self.io_errors.load(Ordering::Relaxed)
    }

    pub fn skipped_dirs(&self) -> u64 {
        self.skipped_dirs.load(Ordering::Relaxed)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::Relaxed)
    }
}

enum EnumError {
    Timeout,
    Io(io::Error),
}

struct RawChild {
    path: PathBuf,
    meta: io::Result<fs::Metadata>,
}

pub struct Walker {
    config: WalkConfig,
    /// Inode keys already attributed once; the single global bottleneck of
    /// the concurrent phase, acceptable because the critical section is a
    /// map lookup + insert.
    inode_table: DashMap<(u64, u64), ()>,
    /// Canonical directory paths already entered.
    visited_dirs: DashMap<PathBuf, ()>,
    stats: WalkStats,
    progress: ProgressReporter,
    started: Instant,
}

impl Walker {
    pub fn new(config: WalkConfig) -> Arc<Self> {
        let progress = ProgressReporter::new(config.show_progress);
        Arc::new(Self {
            config,
            inode_table: DashMap::new(),
            visited_dirs: DashMap::new(),
            stats: WalkStats::default(),
            progress,
            started: Instant::now(),
        })
    }

    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Scan all roots to completion and return them rolled up: sizes and
    /// entry counts reconciled, children sorted descending by size.
    pub fn scan(self: &Arc<Self>, roots: &[PathBuf]) -> AppResult<Vec<EntryRef>> {
        let pool = WorkerPool::new(self.config.thread_count);
        let handle = pool.handle();
        let mut out = Vec::with_capacity(roots.len());

        for path in roots {
            let meta = fs::symlink_metadata(path)
                .map_err(|_| AppError::MissingRoot(path.clone()))?;
            let root: EntryRef = Arc::new(Entry::from_metadata(path.clone(), &meta));
            self.progress.set_current_path(root.path());
            self.stats.traversed.fetch_add(1, Ordering::Relaxed);

            match root.kind() {
                EntryKind::Directory => {
                    self.stats.dirs.fetch_add(1, Ordering::Relaxed);
                    let walker = Arc::clone(self);
                    let child = Arc::clone(&root);
                    let inner = handle.clone();
                    let device = root.device_id();
                    handle.submit(move || walker.scan_dir(&inner, child, device));
                }
                EntryKind::File => {
                    self.attribute_root_file(&root, &meta);
                }
                EntryKind::Symlink => {
                    self.stats.symlinks.fetch_add(1, Ordering::Relaxed);
                }
            }

            out.push(root);
        }

        pool.join();
        self.progress.clear();

        for root in &out {
            let (size, _count) = roll_up(root);
            self.stats.total_size.fetch_add(size, Ordering::Relaxed);
        }

        debug!(
            roots = out.len(),
            files = self.stats.files.load(Ordering::Relaxed),
            dirs = self.stats.dirs.load(Ordering::Relaxed),
            errors = self.stats.io_errors(),
            "scan complete"
        );
        Ok(out)
    }

    /// Final statistics line on stderr.
    pub fn print_stats(&self, format: ByteFormat) {
        let mut err = io::stderr().lock();
        let elapsed = self.started.elapsed().as_millis();
        let _ = writeln!(
            err,
            "Scanned {} files, {} directories, and {} symlinks in {}ms",
            self.stats.files.load(Ordering::Relaxed),
            self.stats.dirs.load(Ordering::Relaxed),
            self.stats.symlinks.load(Ordering::Relaxed),
            elapsed,
        );
        if self.stats.io_errors() > 0 {
            let _ = writeln!(err, "Encountered {} I/O errors", self.stats.io_errors());
        }
        if self.stats.skipped_dirs() > 0 {
            let _ = writeln!(
                err,
                "Skipped {} unresponsive directories",
                self.stats.skipped_dirs()
            );
        }
        let _ = writeln!(err, "Total size: {}", format.format(self.stats.total_size()));
    }

    fn attribute_root_file(&self, root: &EntryRef, meta: &fs::Metadata) {
        let apparent = meta.len();
        root.set_apparent_size(apparent);
        let effective = if self.config.apparent_size {
            apparent
        } else {
            size_on_disk(meta, apparent)
        };
        root.set_size(effective);
        root.set_entry_count(1);
        self.stats.files.fetch_add(1, Ordering::Relaxed);
    }

    /// Scan-directory task; the fan-out point of the whole walk.
    fn scan_dir(self: &Arc<Self>, pool: &PoolHandle, dir: EntryRef, root_device: u64) {
        if dir.is_symlink() {
            return;
        }
        let canonical =
            fs::canonicalize(dir.path()).unwrap_or_else(|_| dir.path().to_path_buf());
        // Re-entering an already-seen canonical path would make the walk
        // cyclic through bind mounts or duplicated roots.
        if self.visited_dirs.insert(canonical.clone(), ()).is_some() {
            trace!(path = %dir.path().display(), "already visited, skipping");
            return;
        }
        if self.config.ignore_dirs.contains(&canonical) {
            trace!(path = %dir.path().display(), "ignored");
            return;
        }

        self.progress.set_current_path(dir.path());

        let children = match self.enumerate_with_timeout(dir.path()) {
            Ok(children) => children,
            Err(EnumError::Timeout) => {
                self.stats.skipped_dirs.fetch_add(1, Ordering::Relaxed);
                warn!(path = %dir.path().display(), "directory enumeration timed out");
                return;
            }
            Err(EnumError::Io(err)) => {
                self.stats.io_errors.fetch_add(1, Ordering::Relaxed);
                debug!(path = %dir.path().display(), error = %err, "enumeration failed");
                return;
            }
        };

        for raw in children {
            let meta = match raw.meta {
                Ok(meta) => meta,
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => continue,
                Err(err) => {
                    self.stats.io_errors.fetch_add(1, Ordering::Relaxed);
                    debug!(path = %raw.path.display(), error = %err, "stat failed");
                    continue;
                }
            };

            let child: EntryRef = Arc::new(Entry::from_metadata(raw.path, &meta));
            self.progress.set_current_path(child.path());
            self.stats.traversed.fetch_add(1, Ordering::Relaxed);
            self.progress.tick(
                self.stats.traversed.load(Ordering::Relaxed),
                self.stats.skipped_dirs(),
            );

            // Filesystem-boundary enforcement applies to children, not to
            // symlink targets; a foreign-device child stays visible as an
            // inert leaf.
            let foreign = self.config.stay_on_filesystem
                && !child.is_symlink()
                && child.device_id() != root_device;

            match child.kind() {
                EntryKind::Symlink => {
                    self.stats.symlinks.fetch_add(1, Ordering::Relaxed);
                    dir.push_child(child);
                }
                EntryKind::Directory => {
                    self.stats.dirs.fetch_add(1, Ordering::Relaxed);
                    dir.push_child(Arc::clone(&child));
                    if !foreign {
                        let walker = Arc::clone(self);
                        let inner = pool.clone();
                        pool.submit(move || walker.scan_dir(&inner, child, root_device));
                    }
                }
                EntryKind::File => {
                    if !foreign && self.should_count(&child) {
                        let apparent = child.apparent_size();
                        let effective = if self.config.apparent_size {
                            apparent
                        } else {
                            size_on_disk(&meta, apparent)
                        };
                        child.set_size(effective);
                        child.set_entry_count(1);
                        self.stats.files.fetch_add(1, Ordering::Relaxed);
                        dir.add_size(effective);
                        dir.add_entry_count(1);
                    }
                    dir.push_child(child);
                }
            }
        }
    }

    /// Hard-link dedup: the first reference to a multi-link inode wins; any
    /// later reference contributes zero.
    fn should_count(&self, entry: &Entry) -> bool {
        if self.config.count_hard_links || entry.link_count() <= 1 {
            return true;
        }
        self.inode_table.insert(entry.inode_key(), ()).is_none()
    }

    /// Enumerate a directory on a helper thread so a stalled filesystem can
    /// be abandoned after `SCAN_TIMEOUT`.
    fn enumerate_with_timeout(&self, dir: &Path) -> Result<Vec<RawChild>, EnumError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let path = dir.to_path_buf();
        std::thread::spawn(move || {
            let _ = tx.send(read_children(&path));
        });

        match rx.recv_timeout(SCAN_TIMEOUT) {
            Ok(Ok(children)) => Ok(children),
            Ok(Err(err)) => Err(EnumError::Io(err)),
            Err(_) => Err(EnumError::Timeout),
        }
    }
}

fn read_children(dir: &Path) -> io::Result<Vec<RawChild>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        out.push(RawChild {
            meta: entry.path().symlink_metadata(),
            path: entry.path(),
        });
    }
    Ok(out)
}

/// Depth-first roll-up after `join()`: reconcile directory sizes and entry
/// counts with their children and sort every child list descending by size.
pub fn roll_up(entry: &EntryRef) -> (u64, u64) {
    if !entry.is_dir() {
        return (entry.size(), entry.entry_count());
    }

    let mut total = 0u64;
    let mut apparent = 0u64;
    let mut count = 0u64;
    {
        let children = entry.children_guard();
        for child in children.iter() {
            let (child_size, child_count) = roll_up(child);
            total += child_size;
            apparent += child.apparent_size();
            count += child_count;
        }
    }
    entry.set_size(total);
    entry.set_apparent_size(apparent);
    entry.set_entry_count(count);
    entry.sort_children_by_size();
    (total, count)
}

//! End-to-end behaviour of the UI-side models against real scanned trees:
//! marking and deletion, glob search, symlink display, aggregate output.

use std::{fs, path::Path, sync::Arc};

use tempfile::TempDir;

use duscan::{
    fs::{
        entry::EntryRef,
        walker::{WalkConfig, Walker},
    },
    glob,
    model::{app_state::AppState, mark_set::MarkSet, view_model::DirView},
    report::aggregate,
    util::format::ByteFormat,
};

fn apparent_config() -> WalkConfig {
    WalkConfig {
        apparent_size: true,
        show_progress: false,
        ..WalkConfig::default()
    }
}

fn scan_one(root: &Path) -> EntryRef {
    let walker = Walker::new(apparent_config());
    let mut roots = walker.scan(&[root.to_path_buf()]).expect("scan failed");
    roots.remove(0)
}

fn find_child(root: &EntryRef, name: &str) -> EntryRef {
    root.children()
        .iter()
        .find(|c| c.name() == name)
        .cloned()
        .unwrap_or_else(|| panic!("no child named {name}"))
}

#[test]
fn mark_and_delete_removes_only_marked_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("p"), vec![b'x'; 100]).unwrap();
    fs::write(dir.path().join("q"), vec![b'x'; 100]).unwrap();

    let root = scan_one(dir.path());
    assert_eq!(root.size(), 200);

    let p = find_child(&root, "p");
    p.set_marked(true);

    let roots = vec![Arc::clone(&root)];
    let mut marks = MarkSet::default();
    marks.rebuild(&roots);
    assert_eq!(marks.len(), 1);
    assert_eq!(marks.total_size(), 100);

    let outcome = marks.delete_all();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 0);

    assert!(!dir.path().join("p").exists());
    assert!(dir.path().join("q").exists());

    // The contract after deletion is a full rescan; the new tree shrinks
    // and the rebuilt mark set is empty.
    let fresh = scan_one(dir.path());
    assert_eq!(fresh.size(), 100);
    let mut marks_after = MarkSet::default();
    marks_after.rebuild(&[Arc::clone(&fresh)]);
    assert!(marks_after.is_empty());
}

#[test]
fn deletion_failures_are_swallowed_per_entry() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("real"), b"data").unwrap();

    let root = scan_one(dir.path());
    let real = find_child(&root, "real");
    real.set_marked(true);

    let mut marks = MarkSet::default();
    marks.rebuild(&[Arc::clone(&root)]);

    // Delete the file out from under the mark set, then delete again.
    fs::remove_file(dir.path().join("real")).unwrap();
    let outcome = marks.delete_all();
    assert_eq!(outcome.deleted, 0);
    assert_eq!(outcome.failed, 1);
}

#[test]
fn glob_search_builds_a_virtual_directory() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let doc = dir.path().join("doc");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&doc).unwrap();
    fs::write(src.join("a.rs"), b"fn main() {}").unwrap();
    fs::write(src.join("b.rs"), b"pub mod x;").unwrap();
    fs::write(doc.join("readme.md"), b"# hi").unwrap();

    let root = scan_one(dir.path());
    let matches = glob::search(&root, "*.rs").unwrap();

    let mut names: Vec<String> = matches.iter().map(|m| m.name().into_owned()).collect();
    names.sort();
    assert_eq!(names, ["a.rs", "b.rs"]);

    let results = glob::results_dir(matches);
    assert_eq!(results.name(), "[Search Results]");
    assert_eq!(results.child_count(), 2);
    assert_eq!(
        results.size(),
        results.children().iter().map(|c| c.size()).sum::<u64>()
    );

    // Entering and leaving the virtual directory behaves like navigation
    // into any child.
    let mut state = AppState::new(
        vec![Arc::clone(&root)],
        vec![dir.path().to_path_buf()],
        apparent_config(),
        ByteFormat::Metric,
    );
    state.enter_dir(results);
    assert_eq!(state.current_dir().name(), "[Search Results]");
    state.leave_dir();
    assert!(Arc::ptr_eq(state.current_dir(), &root));
}

#[cfg(unix)]
#[test]
fn symlink_rows_show_the_arrow_and_do_not_descend() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    symlink("/tmp/target", dir.path().join("link")).unwrap();

    let root = scan_one(dir.path());
    let mut view = DirView::default();
    view.rebuild_from(&root);

    let row = view.row(0, ByteFormat::Metric).unwrap();
    assert!(row.name.contains("link -> /tmp/target"));

    // A symlink is not a directory; the controller refuses to descend.
    let link = find_child(&root, "link");
    assert!(!link.is_dir());
    assert_eq!(link.child_count(), 0);
}

#[test]
fn aggregate_output_lists_roots_ascending_with_total() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, vec![b'x'; 1000]).unwrap();
    fs::write(&b, vec![b'x'; 2000]).unwrap();

    let walker = Walker::new(apparent_config());
    let roots = walker.scan(&[b.clone(), a.clone()]).unwrap();

    let mut out = Vec::new();
    aggregate::print(&mut out, &roots, ByteFormat::Bytes, false).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("      1000 B"));
    assert!(lines[0].ends_with("/a"));
    assert!(lines[1].starts_with("      2000 B"));
    assert!(lines[1].ends_with("/b"));
    assert_eq!(lines[2], "      3000 B total");
}

#[test]
fn marking_everything_twice_round_trips() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), b"1").unwrap();
    fs::write(dir.path().join("b"), b"2").unwrap();

    let root = scan_one(dir.path());
    let children = root.children();

    // Toggle-all semantics: mark everything, then a second toggle clears
    // exactly what the first one marked.
    let any_marked = children.iter().any(|c| c.is_marked());
    assert!(!any_marked);
    for child in &children {
        child.set_marked(true);
    }
    let any_marked = children.iter().any(|c| c.is_marked());
    assert!(any_marked);
    for child in &children {
        child.set_marked(false);
    }
    assert!(children.iter().all(|c| !c.is_marked()));
}

//! Glob search over the entry tree.
//!
//! A user pattern is translated into a case-insensitive regex (`*` → `.*`,
//! `?` → `.`, everything else escaped) and matched against basenames. The
//! matches are collected in traversal order into a virtual directory that
//! the controller pushes onto the navigation stack like any other.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::{
    error::{AppError, AppResult},
    fs::entry::{Entry, EntryRef},
};

pub const SEARCH_RESULTS_NAME: &str = "[Search Results]";

/// Translate a glob pattern into an anchored-nowhere, case-insensitive
/// regex. Matching is by `Regex::is_match`, i.e. substring semantics, the
/// same as the search this replaces.
pub fn compile(pattern: &str) -> AppResult<Regex> {
    let mut translated = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            '.' | '(' | ')' | '[' | ']' | '{' | '}' | '+' | '^' | '$' | '|' | '\\' => {
                translated.push('\\');
                translated.push(c);
            }
            _ => translated.push(c),
        }
    }

    RegexBuilder::new(&translated)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::pattern(pattern, e.to_string()))
}

/// Collect every entry reachable from `root` (inclusive) whose basename
/// matches, in depth-first traversal order.
pub fn search(root: &EntryRef, pattern: &str) -> AppResult<Vec<EntryRef>> {
    let regex = compile(pattern)?;
    let mut matches = Vec::new();
    collect(root, &regex, &mut matches);
    Ok(matches)
}

fn collect(entry: &EntryRef, regex: &Regex, matches: &mut Vec<EntryRef>) {
    if regex.is_match(&entry.name()) {
        matches.push(Arc::clone(entry));
    }
    if entry.is_dir() {
        for child in entry.children() {
            collect(&child, regex, matches);
        }
    }
}

/// Synthesize the virtual `[Search Results]` directory with aggregated size
/// and entry count.
pub fn results_dir(matches: Vec<EntryRef>) -> EntryRef {
    let dir = Entry::virtual_dir(SEARCH_RESULTS_NAME);
    for m in &matches {
        dir.add_size(m.size());
        dir.add_entry_count(m.entry_count());
    }
    for m in matches {
        dir.push_child(m);
    }
    Arc::new(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        entry.set_size(size);
        Arc::new(entry)
    }

    #[test]
    fn star_and_question_translate() {
        let re = compile("*.rs").unwrap();
        assert!(re.is_match("main.rs"));
        assert!(re.is_match("MAIN.RS"));
        assert!(!re.is_match("main.rb"));

        let re = compile("a?c").unwrap();
        assert!(re.is_match("abc"));
        assert!(re.is_match("axc"));
    }

    #[test]
    fn metacharacters_are_escaped() {
        let re = compile("a+b").unwrap();
        assert!(re.is_match("a+b"));
        assert!(!re.is_match("aab"));

        let re = compile("x(1)").unwrap();
        assert!(re.is_match("x(1)"));
    }

    #[test]
    fn search_matches_basenames_recursively() {
        let root = Arc::new(Entry::virtual_dir("root"));
        let src = Arc::new(Entry::virtual_dir("root/src"));
        src.push_child(leaf("root/src/a.rs", 10));
        src.push_child(leaf("root/src/b.rs", 20));
        let doc = Arc::new(Entry::virtual_dir("root/doc"));
        doc.push_child(leaf("root/doc/readme.md", 5));
        root.push_child(src);
        root.push_child(doc);

        let matches = search(&root, "*.rs").unwrap();
        let names: Vec<String> = matches.iter().map(|m| m.name().into_owned()).collect();
        assert_eq!(names, ["a.rs", "b.rs"]);
    }

    #[test]
    fn match_all_pattern_reaches_every_node() {
        let root = Arc::new(Entry::virtual_dir("root"));
        let sub = Arc::new(Entry::virtual_dir("root/sub"));
        sub.push_child(leaf("root/sub/x", 1));
        root.push_child(sub);
        root.push_child(leaf("root/y", 2));

        let matches = search(&root, "*").unwrap();
        // root itself, sub, x, y
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn results_dir_aggregates_size() {
        let matches = vec![leaf("a", 10), leaf("b", 32)];
        let dir = results_dir(matches);
        assert_eq!(dir.size(), 42);
        assert_eq!(dir.child_count(), 2);
        assert_eq!(dir.name(), SEARCH_RESULTS_NAME);
    }
}

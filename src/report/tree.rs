//! Tree printer for non-interactive mode: size-sorted, depth-limited, with
//! an elision line when `--top` suppresses children.

use std::io::{self, Write};

use console::style;

use crate::{fs::entry::EntryRef, util::format::ByteFormat};

#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    /// Maximum display depth; None is unlimited. Display-only, the scan is
    /// never truncated.
    pub max_depth: Option<usize>,
    /// Maximum children shown per node.
    pub top: Option<usize>,
    pub format: ByteFormat,
    pub colors: bool,
}

pub fn print(out: &mut impl Write, roots: &[EntryRef], opts: &TreeOptions) -> io::Result<()> {
    for root in roots {
        print_entry(out, root, opts, "", true, 0)?;
    }
    Ok(())
}

fn print_entry(
    out: &mut impl Write,
    entry: &EntryRef,
    opts: &TreeOptions,
    prefix: &str,
    is_last: bool,
    depth: usize,
) -> io::Result<()> {
    if let Some(max) = opts.max_depth {
        if depth > max {
            return Ok(());
        }
    }

    write!(out, "{prefix}")?;
    if depth > 0 {
        write!(out, "{}", if is_last { "└── " } else { "├── " })?;
    }

    let mut name = entry.name().into_owned();
    if name.is_empty() {
        name = entry.path().display().to_string();
    }
    if let Some(target) = entry.symlink_target() {
        name.push_str(&format!(" -> {}", target.display()));
    }

    if opts.colors && entry.is_symlink() {
        write!(out, "{}", style(name).magenta())?;
    } else if opts.colors && entry.is_dir() {
        write!(out, "{}", style(name).blue().bold())?;
    } else {
        write!(out, "{name}")?;
    }

    let size = format!("[{}]", opts.format.format(entry.size()));
    if opts.colors {
        writeln!(out, " {}", style(size).yellow())?;
    } else {
        writeln!(out, " {size}")?;
    }

    if !entry.is_dir() {
        return Ok(());
    }

    // Children are already size-sorted descending after roll-up.
    let children = entry.children();
    let limit = match opts.top {
        Some(top) if children.len() > top => top,
        _ => children.len(),
    };

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    for (i, child) in children.iter().take(limit).enumerate() {
        let child_is_last = i == limit - 1 && children.len() <= limit;
        print_entry(out, child, opts, &child_prefix, child_is_last, depth + 1)?;
    }

    if children.len() > limit {
        let omitted = children.len() - limit;
        let text = format!("... {omitted} more entries");
        if opts.colors {
            writeln!(out, "{child_prefix}└── {}", style(text).dim())?;
        } else {
            writeln!(out, "{child_prefix}└── {text}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;
    use std::sync::Arc;

    fn leaf(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        entry.set_size(size);
        Arc::new(entry)
    }

    fn opts() -> TreeOptions {
        TreeOptions {
            max_depth: None,
            top: None,
            format: ByteFormat::Bytes,
            colors: false,
        }
    }

    fn sample() -> EntryRef {
        let root = Arc::new(Entry::virtual_dir("root"));
        root.push_child(leaf("root/big", 100));
        root.push_child(leaf("root/small", 1));
        root.set_size(101);
        root
    }

    #[test]
    fn children_are_indented_under_the_root() {
        let mut out = Vec::new();
        print(&mut out, &[sample()], &opts()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("root [101 B]"));
        assert!(text.contains("├── big [100 B]"));
        assert!(text.contains("└── small [1 B]"));
    }

    #[test]
    fn depth_zero_prints_only_roots() {
        let mut out = Vec::new();
        let o = TreeOptions {
            max_depth: Some(0),
            ..opts()
        };
        print(&mut out, &[sample()], &o).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn top_elides_with_a_summary_line() {
        let mut out = Vec::new();
        let o = TreeOptions {
            top: Some(1),
            ..opts()
        };
        print(&mut out, &[sample()], &o).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("big"));
        assert!(!text.contains("small [1 B]"));
        assert!(text.contains("... 1 more entries"));
    }
}

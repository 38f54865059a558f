//! Non-interactive aggregate printer: one line per root, ascending by
//! size, with a trailing total when more than one root was scanned.

use std::io::{self, Write};

use console::style;

use crate::{fs::entry::EntryRef, util::format::ByteFormat};

pub fn print(
    out: &mut impl Write,
    roots: &[EntryRef],
    format: ByteFormat,
    colors: bool,
) -> io::Result<()> {
    let mut sorted: Vec<&EntryRef> = roots.iter().collect();
    sorted.sort_by(|a, b| {
        a.size()
            .cmp(&b.size())
            .then_with(|| a.path().cmp(b.path()))
    });

    for root in &sorted {
        let size = format.format(root.size());
        let path = root.path().display().to_string();
        if colors && root.is_dir() {
            writeln!(out, "{:>12} {}", size, style(path).cyan())?;
        } else {
            writeln!(out, "{:>12} {}", size, path)?;
        }
    }

    if sorted.len() > 1 {
        let total: u64 = sorted.iter().map(|r| r.size()).sum();
        writeln!(out, "{:>12} total", format.format(total))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;
    use std::sync::Arc;

    fn root(path: &str, size: u64) -> EntryRef {
        let entry = Entry::virtual_dir(path);
        entry.set_size(size);
        Arc::new(entry)
    }

    #[test]
    fn roots_print_ascending_with_total() {
        let roots = vec![root("b", 2000), root("a", 1000)];
        let mut out = Vec::new();
        print(&mut out, &roots, ByteFormat::Bytes, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "      1000 B a");
        assert_eq!(lines[1], "      2000 B b");
        assert_eq!(lines[2], "      3000 B total");
    }

    #[test]
    fn single_root_has_no_total_line() {
        let roots = vec![root("only", 42)];
        let mut out = Vec::new();
        print(&mut out, &roots, ByteFormat::Bytes, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains("total"));
    }
}

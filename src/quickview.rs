//! Quick-view previews for the mark pane.
//!
//! Generates a line-oriented preview of the selected path: text files are
//! read with caps on line count and length, binary files get a hex dump,
//! directories a child listing. The pane owns a scroll cursor over the
//! generated lines; the controller only forwards keys while quick-view is
//! active.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::util::format::ByteFormat;

const MAX_PREVIEW_LINES: usize = 10_000;
const MAX_LINE_LENGTH: usize = 4096;
const MAX_PREVIEW_BYTES: u64 = 10 * 1024 * 1024;
const HEX_DUMP_BYTES: usize = 4096;
const SNIFF_BYTES: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Text,
    Binary,
    Directory,
    Empty,
    Error,
}

/// A generated preview, ready for line-by-line rendering.
#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub kind: PreviewKind,
    pub lines: Vec<String>,
    pub file_size: u64,
    pub truncated: bool,
}

impl Preview {
    fn error(path: &Path, message: String) -> Self {
        Preview {
            path: path.to_path_buf(),
            kind: PreviewKind::Error,
            lines: vec![message],
            file_size: 0,
            truncated: false,
        }
    }
}

/// Generate a preview for `path`, dispatching on what it is.
pub fn generate(path: &Path) -> Preview {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) => return Preview::error(path, format!("cannot stat: {err}")),
    };

    if meta.is_dir() {
        return preview_directory(path);
    }
    if meta.file_type().is_symlink() {
        let target = fs::read_link(path)
            .map(|t| t.display().to_string())
            .unwrap_or_else(|_| "?".into());
        return Preview {
            path: path.to_path_buf(),
            kind: PreviewKind::Text,
            lines: vec![format!("symlink -> {target}")],
            file_size: 0,
            truncated: false,
        };
    }
    if meta.len() == 0 {
        return Preview {
            path: path.to_path_buf(),
            kind: PreviewKind::Empty,
            lines: vec!["(empty file)".into()],
            file_size: 0,
            truncated: false,
        };
    }

    match sniff_binary(path) {
        Ok(true) => preview_binary(path, meta.len()),
        Ok(false) => preview_text(path, meta.len()),
        Err(err) => Preview::error(path, format!("cannot read: {err}")),
    }
}

/// NUL bytes in the first chunk mean binary.
fn sniff_binary(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; SNIFF_BYTES];
    let n = file.read(&mut buf)?;
    Ok(buf[..n].contains(&0))
}

fn preview_text(path: &Path, file_size: u64) -> Preview {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => return Preview::error(path, format!("cannot open: {err}")),
    };

    let mut lines = Vec::new();
    let mut truncated = file_size > MAX_PREVIEW_BYTES;
    let reader = BufReader::new(file.take(MAX_PREVIEW_BYTES));
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            // Bail on undecodable content mid-file rather than erroring the
            // whole preview.
            Err(_) => {
                truncated = true;
                break;
            }
        };
        if lines.len() >= MAX_PREVIEW_LINES {
            truncated = true;
            break;
        }
        if line.chars().count() > MAX_LINE_LENGTH {
            lines.push(line.chars().take(MAX_LINE_LENGTH).collect());
        } else {
            lines.push(line);
        }
    }

    debug!(path = %path.display(), lines = lines.len(), truncated, "text preview");
    Preview {
        path: path.to_path_buf(),
        kind: PreviewKind::Text,
        lines,
        file_size,
        truncated,
    }
}

fn preview_binary(path: &Path, file_size: u64) -> Preview {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => return Preview::error(path, format!("cannot open: {err}")),
    };

    let mut buf = vec![0u8; HEX_DUMP_BYTES];
    let n = match file.read(&mut buf) {
        Ok(n) => n,
        Err(err) => return Preview::error(path, format!("cannot read: {err}")),
    };
    buf.truncate(n);

    let mut lines = Vec::with_capacity(buf.len() / 16 + 2);
    lines.push(format!(
        "binary file, {} ({} bytes shown)",
        ByteFormat::Binary.format(file_size),
        n
    ));
    for (i, chunk) in buf.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if (0x20..0x7f).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        lines.push(format!("{:08x}  {:<47}  {}", i * 16, hex.join(" "), ascii));
    }

    Preview {
        path: path.to_path_buf(),
        kind: PreviewKind::Binary,
        lines,
        file_size,
        truncated: (n as u64) < file_size,
    }
}

fn preview_directory(path: &Path) -> Preview {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => return Preview::error(path, format!("cannot list: {err}")),
    };

    let mut names: Vec<String> = Vec::new();
    let mut truncated = false;
    for entry in entries.flatten() {
        if names.len() >= MAX_PREVIEW_LINES {
            truncated = true;
            break;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let marker = match entry.file_type() {
            Ok(t) if t.is_dir() => "/",
            Ok(t) if t.is_symlink() => "@",
            _ => "",
        };
        names.push(format!("{name}{marker}"));
    }
    names.sort();

    let mut lines = vec![format!("directory, {} entries", names.len())];
    lines.extend(names);

    Preview {
        path: path.to_path_buf(),
        kind: PreviewKind::Directory,
        lines,
        file_size: 0,
        truncated,
    }
}

impl Preview {
    /// Line numbers containing `pattern`, case-insensitive.
    pub fn find_matches(&self, pattern: &str) -> Vec<usize> {
        if pattern.is_empty() {
            return Vec::new();
        }
        let needle = pattern.to_lowercase();
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Scroll cursor over a preview's lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewScroll {
    pub offset: usize,
}

impl PreviewScroll {
    pub fn scroll(&mut self, delta: i64, total_lines: usize, height: usize) {
        let max = total_lines.saturating_sub(height.max(1));
        self.offset = if delta.is_negative() {
            self.offset.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            (self.offset + delta as usize).min(max)
        };
    }

    pub fn home(&mut self) {
        self.offset = 0;
    }

    pub fn end(&mut self, total_lines: usize, height: usize) {
        self.offset = total_lines.saturating_sub(height.max(1));
    }

    /// Centre `line` in a viewport of `height` rows, clamped to content.
    pub fn jump_to(&mut self, line: usize, total_lines: usize, height: usize) {
        let height = height.max(1);
        let max = total_lines.saturating_sub(height);
        self.offset = line.saturating_sub(height / 2).min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn text_file_previews_as_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "first\nsecond\nthird\n").unwrap();

        let preview = generate(&path);
        assert_eq!(preview.kind, PreviewKind::Text);
        assert_eq!(preview.lines, ["first", "second", "third"]);
        assert!(!preview.truncated);
    }

    #[test]
    fn nul_bytes_mean_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8, 1, 2, 3, 0, 255]).unwrap();
        drop(f);

        let preview = generate(&path);
        assert_eq!(preview.kind, PreviewKind::Binary);
        assert!(preview.lines[0].starts_with("binary file"));
    }

    #[test]
    fn empty_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let preview = generate(&path);
        assert_eq!(preview.kind, PreviewKind::Empty);
    }

    #[test]
    fn directory_preview_lists_children() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let preview = generate(dir.path());
        assert_eq!(preview.kind, PreviewKind::Directory);
        assert!(preview.lines.contains(&"a".to_string()));
        assert!(preview.lines.contains(&"sub/".to_string()));
    }

    #[test]
    fn scroll_clamps_to_content() {
        let mut scroll = PreviewScroll::default();
        scroll.scroll(100, 50, 10);
        assert_eq!(scroll.offset, 40);
        scroll.scroll(-100, 50, 10);
        assert_eq!(scroll.offset, 0);
    }

    #[test]
    fn search_matches_are_case_insensitive_line_numbers() {
        let preview = Preview {
            path: "x".into(),
            kind: PreviewKind::Text,
            lines: vec!["alpha".into(), "BETA".into(), "beta again".into()],
            file_size: 0,
            truncated: false,
        };
        assert_eq!(preview.find_matches("beta"), [1, 2]);
        assert!(preview.find_matches("").is_empty());
        assert!(preview.find_matches("zzz").is_empty());
    }

    #[test]
    fn jump_centres_the_target_line() {
        let mut scroll = PreviewScroll::default();
        scroll.jump_to(50, 100, 10);
        assert_eq!(scroll.offset, 45);
        scroll.jump_to(2, 100, 10);
        assert_eq!(scroll.offset, 0);
        scroll.jump_to(99, 100, 10);
        assert_eq!(scroll.offset, 90);
    }
}

//! Size, path and timestamp formatting for both printers and the TUI.

use std::time::SystemTime;

use chrono::{DateTime, Local};

/// Output format for byte quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ByteFormat {
    /// Powers of 1000 (KB, MB, ...)
    #[default]
    Metric,
    /// Powers of 1024 (KiB, MiB, ...)
    Binary,
    /// Raw byte count
    Bytes,
    /// Fixed gigabytes
    Gb,
    /// Fixed gibibytes
    Gib,
    /// Fixed megabytes
    Mb,
    /// Fixed mebibytes
    Mib,
}

const METRIC_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
const BINARY_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

impl ByteFormat {
    /// Render a byte count in this format.
    pub fn format(&self, bytes: u64) -> String {
        match self {
            ByteFormat::Bytes => format!("{bytes} B"),
            ByteFormat::Metric => scaled(bytes, 1000.0, &METRIC_UNITS),
            ByteFormat::Binary => scaled(bytes, 1024.0, &BINARY_UNITS),
            ByteFormat::Gb => format!("{:.2} GB", bytes as f64 / 1_000_000_000.0),
            ByteFormat::Gib => format!("{:.2} GiB", bytes as f64 / 1_073_741_824.0),
            ByteFormat::Mb => format!("{:.2} MB", bytes as f64 / 1_000_000.0),
            ByteFormat::Mib => format!("{:.2} MiB", bytes as f64 / 1_048_576.0),
        }
    }
}

fn scaled(bytes: u64, divisor: f64, units: &[&str; 6]) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= divisor && unit < units.len() - 1 {
        size /= divisor;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", units[0])
    } else {
        format!("{size:.2} {}", units[unit])
    }
}

/// Shorten a path for single-line display: first 30 chars, ellipsis,
/// last 30 chars.
pub fn shorten_path(path: &str, max_length: usize) -> String {
    const PREFIX: usize = 30;
    const SUFFIX: usize = 30;
    const ELLIPSIS: &str = "...";

    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_length || chars.len() <= PREFIX + SUFFIX + ELLIPSIS.len() {
        return path.to_string();
    }

    let head: String = chars[..PREFIX].iter().collect();
    let tail: String = chars[chars.len() - SUFFIX..].iter().collect();
    format!("{head}{ELLIPSIS}{tail}")
}

/// Format an mtime for the optional table column.
pub fn format_mtime(mtime: SystemTime) -> String {
    let local: DateTime<Local> = mtime.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_is_exact() {
        assert_eq!(ByteFormat::Bytes.format(0), "0 B");
        assert_eq!(ByteFormat::Bytes.format(1000), "1000 B");
        assert_eq!(ByteFormat::Bytes.format(123_456_789), "123456789 B");
    }

    #[test]
    fn metric_scales_at_powers_of_1000() {
        assert_eq!(ByteFormat::Metric.format(999), "999 B");
        assert_eq!(ByteFormat::Metric.format(1000), "1.00 KB");
        assert_eq!(ByteFormat::Metric.format(1_500_000), "1.50 MB");
    }

    #[test]
    fn binary_scales_at_powers_of_1024() {
        assert_eq!(ByteFormat::Binary.format(1023), "1023 B");
        assert_eq!(ByteFormat::Binary.format(1024), "1.00 KiB");
        assert_eq!(ByteFormat::Binary.format(1024 * 1024), "1.00 MiB");
    }

    #[test]
    fn fixed_units() {
        assert_eq!(ByteFormat::Gib.format(1_073_741_824), "1.00 GiB");
        assert_eq!(ByteFormat::Mb.format(2_000_000), "2.00 MB");
    }

    #[test]
    fn short_paths_pass_through() {
        assert_eq!(shorten_path("/tmp/a", 45), "/tmp/a");
    }

    #[test]
    fn long_paths_keep_head_and_tail() {
        let long = "a".repeat(100);
        let short = shorten_path(&long, 45);
        assert_eq!(short.len(), 63);
        assert!(short.contains("..."));
        assert!(short.starts_with(&"a".repeat(30)));
        assert!(short.ends_with(&"a".repeat(30)));
    }
}

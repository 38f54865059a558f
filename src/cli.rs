//! Command-line surface and launch-plan resolution.

use std::{
    collections::HashSet,
    io::IsTerminal,
    path::PathBuf,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    fs::walker::WalkConfig,
    util::format::ByteFormat,
};

#[derive(Debug, Parser)]
#[command(
    name = "duscan",
    version,
    about = "A tool to conveniently learn about disk usage, fast!",
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Mode>,

    #[command(flatten)]
    pub opts: Options,

    /// Roots to scan; defaults to the current directory.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Launch the interactive terminal UI
    #[command(visible_alias = "i")]
    Interactive {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Aggregate disk usage and print it (default when stdout is piped)
    #[command(visible_alias = "a")]
    Aggregate {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct Options {
    /// Display apparent size instead of disk usage
    #[arg(short = 'A', long, global = true)]
    pub apparent_size: bool,

    /// Count hard-linked files each time they are seen
    #[arg(short = 'l', long, global = true)]
    pub count_hard_links: bool,

    /// Don't cross filesystem boundaries
    #[arg(short = 'x', long, global = true)]
    pub stay_on_filesystem: bool,

    /// Maximum tree depth to display (tree printer only)
    #[arg(short = 'd', long, value_name = "N", global = true)]
    pub depth: Option<usize>,

    /// Show only the top N entries per directory (tree printer only)
    #[arg(short = 't', long, value_name = "N", global = true)]
    pub top: Option<usize>,

    /// Print a tree instead of the aggregate summary
    #[arg(short = 'T', long, global = true)]
    pub tree: bool,

    /// Output format for sizes
    #[arg(short = 'f', long, value_enum, default_value_t = ByteFormat::Metric, global = true)]
    pub format: ByteFormat,

    /// Number of scan threads (0 = auto)
    #[arg(short = 'j', long, value_name = "N", default_value_t = 0, global = true)]
    pub threads: usize,

    /// Directories to ignore (repeatable; canonicalized before use)
    #[arg(short = 'i', long = "ignore-dirs", value_name = "DIR", global = true)]
    pub ignore_dirs: Vec<PathBuf>,

    /// Don't check that entries exist before scanning
    #[arg(long, global = true)]
    pub no_entry_check: bool,

    /// Disable colored output in non-interactive mode
    #[arg(long, global = true)]
    pub no_colors: bool,

    /// Disable the stderr progress line
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// What to actually run, after defaults and validation.
#[derive(Debug)]
pub struct LaunchPlan {
    pub interactive: bool,
    pub paths: Vec<PathBuf>,
    pub walk: WalkConfig,
    pub format: ByteFormat,
    pub tree: bool,
    pub depth: Option<usize>,
    pub top: Option<usize>,
    pub colors: bool,
}

impl Cli {
    pub fn resolve(self) -> AppResult<LaunchPlan> {
        let (explicit_interactive, mut paths) = match self.command {
            Some(Mode::Interactive { paths }) => (Some(true), paths),
            Some(Mode::Aggregate { paths }) => (Some(false), paths),
            None => (None, self.paths),
        };

        if paths.is_empty() {
            paths.push(PathBuf::from("."));
        }

        if !self.opts.no_entry_check {
            for path in &paths {
                if std::fs::symlink_metadata(path).is_err() {
                    return Err(AppError::MissingRoot(path.clone()));
                }
            }
        }

        let interactive = match explicit_interactive {
            Some(explicit) => explicit,
            None => std::io::stdout().is_terminal() && !self.opts.tree,
        };

        let mut ignore_dirs = HashSet::new();
        for dir in &self.opts.ignore_dirs {
            match std::fs::canonicalize(dir) {
                Ok(canonical) => {
                    ignore_dirs.insert(canonical);
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "cannot resolve ignore directory");
                    eprintln!("Warning: cannot resolve ignore directory: {}", dir.display());
                }
            }
        }

        let walk = WalkConfig {
            apparent_size: self.opts.apparent_size,
            count_hard_links: self.opts.count_hard_links,
            stay_on_filesystem: self.opts.stay_on_filesystem,
            ignore_dirs,
            thread_count: self.opts.threads,
            show_progress: !self.opts.no_progress,
        };

        Ok(LaunchPlan {
            interactive,
            paths,
            walk,
            format: self.opts.format,
            tree: self.opts.tree,
            depth: self.opts.depth,
            top: self.opts.top,
            colors: !self.opts.no_colors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommand_aliases_parse() {
        let cli = Cli::parse_from(["duscan", "i", "--no-entry-check", "/nonexistent"]);
        let plan = cli.resolve().unwrap();
        assert!(plan.interactive);
        assert_eq!(plan.paths, [PathBuf::from("/nonexistent")]);

        let cli = Cli::parse_from(["duscan", "a"]);
        let plan = cli.resolve().unwrap();
        assert!(!plan.interactive);
        assert_eq!(plan.paths, [PathBuf::from(".")]);
    }

    #[test]
    fn flags_reach_the_walk_config() {
        let cli = Cli::parse_from([
            "duscan", "a", "-A", "-l", "-x", "-j", "7", "--no-progress",
        ]);
        let plan = cli.resolve().unwrap();
        assert!(plan.walk.apparent_size);
        assert!(plan.walk.count_hard_links);
        assert!(plan.walk.stay_on_filesystem);
        assert_eq!(plan.walk.thread_count, 7);
        assert!(!plan.walk.show_progress);
    }

    #[test]
    fn missing_root_is_an_input_error() {
        let cli = Cli::parse_from(["duscan", "a", "/definitely/not/here"]);
        assert!(matches!(
            cli.resolve(),
            Err(AppError::MissingRoot(_))
        ));
    }

    #[test]
    fn format_values_parse() {
        let cli = Cli::parse_from(["duscan", "a", "-f", "gib"]);
        assert_eq!(cli.opts.format, ByteFormat::Gib);
    }
}

//! Entry point: argument resolution, the initial scan, and either the
//! interactive session (with guaranteed terminal restoration) or one of
//! the non-interactive printers.

use std::{
    io::{self, Stdout, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use duscan::{
    cli::{Cli, LaunchPlan},
    controller::event_loop::{AppTerminal, EventLoop},
    fs::walker::Walker,
    model::app_state::AppState,
    report::{aggregate, tree},
    Logger,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let plan = match cli.resolve() {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _logger = Logger::init(plan.interactive);

    match run(plan) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(plan: LaunchPlan) -> Result<()> {
    let walker = Walker::new(plan.walk.clone());
    let roots = walker.scan(&plan.paths).context("scan failed")?;
    walker.print_stats(plan.format);

    if plan.interactive {
        run_interactive(plan, roots)
    } else if plan.tree {
        let opts = tree::TreeOptions {
            max_depth: plan.depth,
            top: plan.top,
            format: plan.format,
            colors: plan.colors,
        };
        let stdout = io::stdout();
        tree::print(&mut stdout.lock(), &roots, &opts).context("tree output failed")?;
        Ok(())
    } else {
        let stdout = io::stdout();
        aggregate::print(&mut stdout.lock(), &roots, plan.format, plan.colors)
            .context("aggregate output failed")?;
        Ok(())
    }
}

fn run_interactive(plan: LaunchPlan, roots: Vec<duscan::fs::entry::EntryRef>) -> Result<()> {
    setup_panic_handler();
    let mut terminal = setup_terminal().context("failed to initialize terminal")?;

    let state = AppState::new(roots, plan.paths.clone(), plan.walk.clone(), plan.format);
    let mut event_loop = EventLoop::new(state);
    let outcome = event_loop.run(&mut terminal);

    cleanup_terminal(&mut terminal).context("failed to restore terminal")?;

    // The selection protocol: marked paths, one per line, for pipelines.
    let marked = outcome.context("interactive session failed")?;
    let mut stdout = io::stdout().lock();
    for path in marked {
        writeln!(stdout, "{}", path.display())?;
    }

    info!("exited cleanly");
    Ok(())
}

fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout: Stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))
        .context("failed to create terminal")?;
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Restore the terminal before the default panic output so a crash does not
/// leave the shell in raw mode.
fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        warn!("panicked: {panic_info}");
        original_hook(panic_info);
    }));
}

//! Tracing initialisation.
//!
//! The program persists nothing by default, so subscribers are env-gated:
//! `DUSCAN_LOG=<dir>` routes events to a rolling file (the only option that
//! works while the TUI owns the terminal), and in non-interactive mode
//! `RUST_LOG` enables a stderr layer. With neither set, events vanish.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_DIR_ENV: &str = "DUSCAN_LOG";

/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background writer.
pub struct Logger {
    _guard: Option<WorkerGuard>,
}

impl Logger {
    pub fn init(interactive: bool) -> Logger {
        if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
            let appender = tracing_appender::rolling::daily(dir, "duscan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive("duscan=debug".parse().expect("static directive")))
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            return Logger {
                _guard: Some(guard),
            };
        }

        if !interactive && std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }

        Logger { _guard: None }
    }
}

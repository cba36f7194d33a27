//! Structured logging setup, built on `slog` + `sloggers`.
//!
//! Each long-running thread gets its own child logger tagged with a
//! component name (`capture`, `dispatcher`, `aggregator`, `main_player`,
//! `metrics`), the same pattern the teacher's networking layer uses for its
//! per-channel/per-world loggers.

use serde::{Deserialize, Serialize};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// TOML-serializable logging configuration. Kept deliberately small: a
/// terminal destination plus a level, which covers the `dps-runner`
/// composition root's needs without pulling in a config format the rest of
/// this crate does not use elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { debug: false }
    }
}

/// Builds the root logger for the process. Returns a `slog::Logger`; callers
/// derive per-component child loggers from it with `log.new(slog::o!("component" => name))`.
pub fn init(config: &LoggingConfig) -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.destination(Destination::Stderr);
    builder.level(if config.debug {
        Severity::Debug
    } else {
        Severity::Info
    });

    // A terminal logger only fails to build on a broken stderr handle; there
    // is nowhere sensible left to report that failure, so fall back to a
    // logger that discards everything rather than panicking at startup.
    builder
        .build()
        .unwrap_or_else(|_| slog::Logger::root(slog::Discard, slog::o!()))
}

/// Child logger for one of the five long-running threads in the spec's
/// concurrency model.
pub fn component(root: &slog::Logger, name: &'static str) -> slog::Logger {
    root.new(slog::o!("component" => name))
}

//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --detached is a shorthand for --mode detached.
//! - --debug is a shorthand for --log-level debug.
//! - --delay-ms (fixed) wins over --max-delay-ms (random).

use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};
use crate::supervisor::AttachmentMode;
use crate::worker::StepDelay;

/// Run a cancellable background worker under a supervisor.
/// Ctrl-C once asks the worker to stop; Ctrl-C again while an attached worker
/// is still finishing abandons it and exits immediately.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Supervise a cancellable background worker with graceful Ctrl-C shutdown"
)]
pub struct Args {
    /// Number of worker steps.
    #[arg(long, short = 'n', value_name = "N", help = "Number of worker steps")]
    pub steps: Option<u32>,

    /// Fixed wait after each step, in milliseconds.
    #[arg(long, value_name = "MS", help = "Fixed wait after each step (ms)")]
    pub delay_ms: Option<u64>,

    /// Upper bound of the random wait after each step, in milliseconds.
    #[arg(
        long,
        value_name = "MS",
        help = "Random wait after each step, up to this many ms"
    )]
    pub max_delay_ms: Option<u64>,

    /// Attachment mode. One of: attached, detached.
    #[arg(
        long,
        value_parser = AttachmentMode::from_str,
        help = "Attachment mode: attached (join) or detached (daemon)"
    )]
    pub mode: Option<AttachmentMode>,

    /// Shorthand for `--mode detached`.
    #[arg(long, help = "Run the worker detached (shorthand for --mode detached)")]
    pub detached: bool,

    /// Explicit config file; overrides GRACEFUL_WORKER_CONFIG and the default location.
    #[arg(long, value_hint = ValueHint::FilePath, help = "Path to config.xml")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(
        long,
        value_parser = LogLevel::from_str,
        help = "Set log level: quiet, normal, info, debug"
    )]
    pub log_level: Option<LogLevel>,

    /// Also write logs to this file.
    #[arg(long, value_hint = ValueHint::FilePath, help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,

    /// Print where the config file is looked up, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Effective attachment mode derived from flags.
    /// Precedence: --detached > --mode value > None (use config default).
    pub fn effective_mode(&self) -> Option<AttachmentMode> {
        if self.detached {
            return Some(AttachmentMode::Detached);
        }
        self.mode
    }

    /// Effective step delay derived from flags, if any was given.
    pub fn effective_delay(&self) -> Option<StepDelay> {
        if let Some(ms) = self.delay_ms {
            return Some(StepDelay::Fixed(Duration::from_millis(ms)));
        }
        self.max_delay_ms.map(|ms| StepDelay::Random {
            max: Duration::from_millis(ms),
        })
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(n) = self.steps {
            cfg.steps = n;
        }
        if let Some(delay) = self.effective_delay() {
            cfg.delay = delay;
        }
        if let Some(mode) = self.effective_mode() {
            cfg.mode = mode;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

//! Core library for `graceful_worker`.
//!
//! One supervisor, one cancellable background worker, one interrupt source.
//! The first interrupt asks the worker to stop at its next wait boundary; what
//! happens next depends on the worker's [`AttachmentMode`]:
//! - attached: the supervisor waits for the worker's final report, unless a
//!   second interrupt arrives first, in which case the worker is abandoned;
//! - detached: the supervisor returns at once and the worker is left behind.

pub mod cli;
pub mod config;
pub mod errors;
pub mod output;
pub mod shutdown;
pub mod signal;
pub mod supervisor;
pub mod worker;

pub use config::{
    default_config_path, default_log_path, load_config, load_config_from_xml_path,
    path_has_symlink_ancestor, Config, LogLevel,
};
pub use errors::SupervisorError;
pub use shutdown::CancellationToken;
pub use signal::{register_ctrlc, InterruptRegistration, SignalBridge};
pub use supervisor::{AttachmentMode, Outcome, Supervisor, SupervisorEvent, SupervisorState};
pub use worker::{
    ConsolePrinter, Progress, StepDelay, Termination, Worker, WorkerConfig, WorkerReport,
};

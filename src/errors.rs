//! Typed error definitions for graceful_worker.
//! Timing outcomes (graceful stop, exhaustion, abandonment) are not errors; these
//! cover the few things that can genuinely go wrong around a supervised run.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to install interrupt handler: {0}")]
    SignalInstall(String),

    #[error("An interrupt handler is already bound to another supervised run")]
    AlreadyRegistered,

    #[error("Supervisor has already run; create a new one per run")]
    AlreadyStarted,

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("Worker thread panicked before producing a report")]
    WorkerPanicked,

    #[error("Supervisor event channel closed unexpectedly")]
    ChannelClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SupervisorError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            SupervisorError::SignalInstall(_) => 10,
            SupervisorError::AlreadyRegistered => 11,
            SupervisorError::AlreadyStarted => 12,
            SupervisorError::WorkerSpawn(_) => 20,
            SupervisorError::WorkerPanicked => 21,
            SupervisorError::ChannelClosed => 22,
            SupervisorError::InvalidConfig(_) => 30,
        }
    }
}

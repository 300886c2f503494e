//! Worker lifecycle supervision.
//! Spawns the worker in attached or detached mode and decides when the run is
//! over: on worker exit, on the first interrupt (detached), or on the second
//! interrupt while still waiting on an attached worker.
//!
//! State machine: Idle -> Running -> Stopping -> Done (Running -> Done directly
//! when the worker exits on its own or a detached worker is released).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info, warn};

use crate::errors::SupervisorError;
use crate::shutdown::CancellationToken;
use crate::signal::{register_ctrlc, SignalBridge};
use crate::worker::{Progress, Worker, WorkerReport};

/// Exit status used when the run is abandoned by a second interrupt (128 + SIGINT).
pub const EXIT_ABANDONED: i32 = 130;

/// Whether the supervisor owes the worker a join before it may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentMode {
    /// Supervisor waits for the worker's final report (or a second interrupt).
    #[default]
    Attached,
    /// Supervisor never waits on the worker once interrupted.
    Detached,
}

impl AttachmentMode {
    /// Parse common names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attached" | "join" | "joined" => Some(AttachmentMode::Attached),
            "detached" | "daemon" => Some(AttachmentMode::Detached),
            _ => None,
        }
    }
}

impl fmt::Display for AttachmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttachmentMode::Attached => "attached",
            AttachmentMode::Detached => "detached",
        })
    }
}

impl FromStr for AttachmentMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid attachment mode: '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Stopping,
    Done,
}

/// Messages the supervisor waits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// An interrupt arrived; carries the running count.
    Interrupt(usize),
    /// The worker thread ended. `None` if it panicked.
    WorkerExited(Option<WorkerReport>),
}

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The worker finished (exhausted or cancelled) and its report was produced.
    Joined(WorkerReport),
    /// Detached worker left behind after an interrupt.
    Released { interrupts: usize },
    /// Second interrupt while waiting on an attached worker; worker left mid-step.
    Abandoned { interrupts: usize },
}

impl Outcome {
    pub fn report(&self) -> Option<&WorkerReport> {
        match self {
            Outcome::Joined(r) => Some(r),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Joined(_) | Outcome::Released { .. } => 0,
            Outcome::Abandoned { .. } => EXIT_ABANDONED,
        }
    }
}

/// Owns one supervised run of one worker.
pub struct Supervisor {
    mode: AttachmentMode,
    state: SupervisorState,
    token: CancellationToken,
    bridge: SignalBridge,
    events_tx: Sender<SupervisorEvent>,
    events: Receiver<SupervisorEvent>,
}

impl Supervisor {
    pub fn new(mode: AttachmentMode) -> Self {
        let token = CancellationToken::new();
        let (events_tx, events) = mpsc::channel();
        let bridge = SignalBridge::new(token.clone(), events_tx.clone());
        Self {
            mode,
            state: SupervisorState::Idle,
            token,
            bridge,
            events_tx,
            events,
        }
    }

    pub fn mode(&self) -> AttachmentMode {
        self.mode
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Handle for delivering interrupts from any source (Ctrl-C, tests, embedders).
    pub fn bridge(&self) -> SignalBridge {
        self.bridge.clone()
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = ?self.state, to = ?next, mode = %self.mode, "Supervisor state change");
        self.state = next;
    }

    /// Bind Ctrl-C to this run, then supervise `worker` until Done.
    pub fn run_with_ctrlc<P>(&mut self, worker: Worker<P>) -> Result<Outcome, SupervisorError>
    where
        P: Progress + 'static,
    {
        let _registration = register_ctrlc(&self.bridge)?;
        self.run(worker)
    }

    /// Spawn `worker` and block until the run reaches Done.
    ///
    /// Interrupts must arrive through [`Supervisor::bridge`].
    pub fn run<P>(&mut self, worker: Worker<P>) -> Result<Outcome, SupervisorError>
    where
        P: Progress + 'static,
    {
        if self.state != SupervisorState::Idle {
            return Err(SupervisorError::AlreadyStarted);
        }

        let tx = self.events_tx.clone();
        let token = self.token.clone();
        let handle = thread::Builder::new()
            .name("worker".into())
            .spawn(move || {
                let report = panic::catch_unwind(AssertUnwindSafe(|| worker.run(&token))).ok();
                let _ = tx.send(SupervisorEvent::WorkerExited(report));
            })
            .map_err(SupervisorError::WorkerSpawn)?;
        self.transition(SupervisorState::Running);
        info!(mode = %self.mode, "Worker started");

        loop {
            let event = self
                .events
                .recv()
                .map_err(|_| SupervisorError::ChannelClosed)?;
            match event {
                SupervisorEvent::WorkerExited(report) => {
                    self.transition(SupervisorState::Done);
                    let _ = handle.join();
                    let report = report.ok_or(SupervisorError::WorkerPanicked)?;
                    info!(
                        completed = report.completed_steps,
                        total = report.total_steps,
                        cancelled = report.was_cancelled(),
                        "Worker joined"
                    );
                    return Ok(Outcome::Joined(report));
                }
                SupervisorEvent::Interrupt(n) => match (self.state, self.mode) {
                    (SupervisorState::Running, AttachmentMode::Attached) => {
                        info!(interrupts = n, "Interrupt received; waiting for worker to stop (interrupt again to force)");
                        self.transition(SupervisorState::Stopping);
                    }
                    (SupervisorState::Running, AttachmentMode::Detached) => {
                        info!(interrupts = n, "Interrupt received; releasing detached worker");
                        self.transition(SupervisorState::Done);
                        drop(handle);
                        return Ok(Outcome::Released { interrupts: n });
                    }
                    (SupervisorState::Stopping, _) => {
                        warn!(interrupts = n, "Second interrupt; abandoning worker");
                        self.transition(SupervisorState::Done);
                        drop(handle);
                        return Ok(Outcome::Abandoned { interrupts: n });
                    }
                    (state, _) => {
                        debug!(?state, interrupts = n, "Interrupt ignored");
                    }
                },
            }
        }
    }
}

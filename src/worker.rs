//! Background worker loop.
//! Runs up to N steps, emitting progress before each one and waiting on the
//! cancellation token between them instead of sleeping unconditionally.

use rand::Rng;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};

use crate::output as out;
use crate::shutdown::CancellationToken;

/// Default number of steps when nothing is configured.
pub const DEFAULT_STEPS: u32 = 30;
/// Default upper bound of the random per-step wait.
pub const DEFAULT_MAX_STEP_DELAY: Duration = Duration::from_millis(1000);

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// How long the worker waits on the token after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDelay {
    /// Same wait after every step.
    Fixed(Duration),
    /// Uniformly drawn from `[0, max]` for each step.
    Random { max: Duration },
}

impl Default for StepDelay {
    fn default() -> Self {
        StepDelay::Random {
            max: DEFAULT_MAX_STEP_DELAY,
        }
    }
}

impl StepDelay {
    /// Draw the next wait interval.
    pub fn next_with<R: Rng>(&self, rng: &mut R) -> Duration {
        match *self {
            StepDelay::Fixed(d) => d,
            StepDelay::Random { max } => {
                Duration::from_millis(rng.gen_range(0..=millis_u64(max)))
            }
        }
    }

    /// Longest wait this delay can produce.
    pub fn upper_bound(&self) -> Duration {
        match *self {
            StepDelay::Fixed(d) => d,
            StepDelay::Random { max } => max,
        }
    }
}

/// Worker parameters, fixed for the lifetime of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub steps: u32,
    pub delay: StepDelay,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            delay: StepDelay::default(),
        }
    }
}

/// Why the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every step ran.
    Exhausted,
    /// Cancellation was observed before the last step finished.
    Cancelled,
}

/// Final account of a worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub completed_steps: u32,
    pub total_steps: u32,
    pub termination: Termination,
}

impl WorkerReport {
    pub fn was_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations completed before exiting.",
            self.completed_steps
        )
    }
}

/// Observable side effects of the worker.
///
/// `on_step` runs before each step's wait; `on_finished` runs exactly once when
/// the loop ends, whether exhausted or cancelled.
pub trait Progress: Send {
    fn on_step(&mut self, step: u32, total: u32);
    fn on_finished(&mut self, report: &WorkerReport);
}

/// Prints one line per step and a closing summary to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrinter;

impl Progress for ConsolePrinter {
    fn on_step(&mut self, step: u32, total: u32) {
        out::print_user(&format!("{step} of {total} iterations..."));
    }

    fn on_finished(&mut self, report: &WorkerReport) {
        out::print_user(&report.to_string());
    }
}

/// A cancellable unit of background work.
pub struct Worker<P> {
    config: WorkerConfig,
    progress: P,
}

impl<P: Progress> Worker<P> {
    pub fn new(config: WorkerConfig, progress: P) -> Self {
        Self { config, progress }
    }

    /// Run the loop until all steps are done or `token` is triggered.
    pub fn run(mut self, token: &CancellationToken) -> WorkerReport {
        let total = self.config.steps;
        let mut rng = rand::thread_rng();
        let mut completed = 0;
        let mut termination = Termination::Exhausted;

        for step in 1..=total {
            if token.is_triggered() {
                termination = Termination::Cancelled;
                break;
            }
            self.progress.on_step(step, total);
            completed = step;

            let delay = self.config.delay.next_with(&mut rng);
            trace!(step, delay_ms = millis_u64(delay), "waiting");
            if token.wait(delay) {
                if step < total {
                    termination = Termination::Cancelled;
                }
                break;
            }
        }

        let report = WorkerReport {
            completed_steps: completed,
            total_steps: total,
            termination,
        };
        debug!(
            completed = report.completed_steps,
            total = report.total_steps,
            cancelled = report.was_cancelled(),
            "Worker loop finished"
        );
        self.progress.on_finished(&report);
        report
    }
}

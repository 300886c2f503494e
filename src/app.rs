//! Application orchestrator.
//! Loads/merges config, initializes logging, binds Ctrl-C to a supervised run,
//! and maps the run's outcome to a process exit code.

use anyhow::Result;
use tracing::{debug, error, info};

use graceful_worker::cli::Args;
use graceful_worker::output as out;
use graceful_worker::{
    default_config_path, load_config, ConsolePrinter, Outcome, Supervisor, SupervisorError,
    Worker,
};

use crate::logging::init_tracing;

/// Run the CLI application. Returns the process exit code.
pub fn run(args: Args) -> Result<i32> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&args);
        return Ok(0);
    }

    // Build config (may read XML). CLI args override config values.
    let mut cfg = load_config(args.config.as_deref()).inspect_err(|e| {
        out::print_error(&format!("Failed to load config: {e:#}"));
    })?;
    args.apply_overrides(&mut cfg);

    // Hold the guard until the end of the run so file logs get flushed.
    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(
        |e| {
            out::print_error(&format!("Failed to initialize logging: {e}"));
        },
    )?;

    debug!("Starting graceful_worker: {:?}", args);
    cfg.validate()?;

    let worker = Worker::new(cfg.worker_config(), ConsolePrinter);
    let mut supervisor = Supervisor::new(cfg.mode);
    let result = supervisor.run_with_ctrlc(worker);

    let code = match result {
        Ok(outcome) => {
            match &outcome {
                Outcome::Joined(report) => {
                    info!(
                        completed = report.completed_steps,
                        total = report.total_steps,
                        cancelled = report.was_cancelled(),
                        "Run finished"
                    );
                }
                Outcome::Released { interrupts } => {
                    info!(interrupts, "Run finished; detached worker released");
                    out::print_warn("Interrupted; not waiting for the detached worker.");
                }
                Outcome::Abandoned { interrupts } => {
                    info!(interrupts, "Run aborted; attached worker abandoned");
                    out::print_warn("Interrupted again; exiting without waiting for the worker.");
                }
            }
            outcome.exit_code()
        }
        Err(e) => {
            let code = e.code();
            match &e {
                SupervisorError::SignalInstall(msg) => {
                    error!(code, kind = "signal_install", %msg, "Run failed")
                }
                SupervisorError::WorkerPanicked => {
                    error!(code, kind = "worker_panicked", "Run failed")
                }
                _ => error!(code, error = %e, "Run failed"),
            }
            drop(guard);
            return Err(e.into());
        }
    };

    // Ensure logs are flushed before exit
    drop(guard);
    Ok(code)
}

fn print_config_location(args: &Args) {
    if let Some(p) = &args.config {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("graceful_worker config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults are used.");
            }
        }
        Err(e) => {
            out::print_error(&format!("Could not determine a default config path: {e}"));
        }
    }
}

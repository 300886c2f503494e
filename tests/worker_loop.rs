//! Worker loop behavior against a token, without a supervisor.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use graceful_worker::{
    CancellationToken, Progress, StepDelay, Termination, Worker, WorkerConfig, WorkerReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Step(u32, u32),
    Finished(WorkerReport),
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Seen>>>);

impl Recorder {
    fn seen(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    fn steps(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Step(..)))
            .count()
    }
}

impl Progress for Recorder {
    fn on_step(&mut self, step: u32, total: u32) {
        self.0.lock().unwrap().push(Seen::Step(step, total));
    }

    fn on_finished(&mut self, report: &WorkerReport) {
        self.0.lock().unwrap().push(Seen::Finished(*report));
    }
}

fn fixed(steps: u32, ms: u64) -> WorkerConfig {
    WorkerConfig {
        steps,
        delay: StepDelay::Fixed(Duration::from_millis(ms)),
    }
}

#[test]
fn runs_all_steps_without_cancellation() {
    let rec = Recorder::default();
    let token = CancellationToken::new();
    let report = Worker::new(fixed(5, 10), rec.clone()).run(&token);

    assert_eq!(report.completed_steps, 5);
    assert_eq!(report.total_steps, 5);
    assert_eq!(report.termination, Termination::Exhausted);

    let seen = rec.seen();
    assert_eq!(seen.len(), 6);
    for (i, s) in seen[..5].iter().enumerate() {
        assert_eq!(*s, Seen::Step(i as u32 + 1, 5));
    }
    assert_eq!(seen[5], Seen::Finished(report));
}

#[test]
fn already_cancelled_token_runs_no_steps() {
    let rec = Recorder::default();
    let token = CancellationToken::new();
    token.trigger();
    let report = Worker::new(fixed(30, 1000), rec.clone()).run(&token);

    assert_eq!(report.completed_steps, 0);
    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(rec.seen(), vec![Seen::Finished(report)]);
}

#[test]
fn cancellation_mid_wait_stops_within_one_interval() {
    let rec = Recorder::default();
    let token = CancellationToken::new();
    let worker = Worker::new(fixed(30, 2000), rec.clone());

    let run = {
        let token = token.clone();
        thread::spawn(move || worker.run(&token))
    };
    thread::sleep(Duration::from_millis(100));
    let triggered_at = Instant::now();
    token.trigger();
    let report = run.join().unwrap();

    assert!(
        triggered_at.elapsed() < Duration::from_millis(1500),
        "worker took {:?} to stop",
        triggered_at.elapsed()
    );
    assert_eq!(report.completed_steps, 1);
    assert!(report.was_cancelled());
    // No step side effect after cancellation became visible.
    assert_eq!(rec.steps(), 1);
}

#[test]
fn reported_steps_match_observed_side_effects() {
    let rec = Recorder::default();
    let token = CancellationToken::new();
    let worker = Worker::new(
        WorkerConfig {
            steps: 50,
            delay: StepDelay::Random {
                max: Duration::from_millis(5),
            },
        },
        rec.clone(),
    );

    let run = {
        let token = token.clone();
        thread::spawn(move || worker.run(&token))
    };
    thread::sleep(Duration::from_millis(40));
    token.trigger();
    let report = run.join().unwrap();

    assert!(report.completed_steps <= report.total_steps);
    assert_eq!(report.completed_steps as usize, rec.steps());

    let steps: Vec<u32> = rec
        .seen()
        .iter()
        .filter_map(|s| match s {
            Seen::Step(i, _) => Some(*i),
            Seen::Finished(_) => None,
        })
        .collect();
    assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn zero_delay_exhausts_quickly() {
    let rec = Recorder::default();
    let token = CancellationToken::new();
    let start = Instant::now();
    let report = Worker::new(fixed(100, 0), rec.clone()).run(&token);
    assert_eq!(report.completed_steps, 100);
    assert_eq!(report.termination, Termination::Exhausted);
    assert!(start.elapsed() < Duration::from_secs(2));
}

//! Interrupt delivery.
//! Converts Ctrl-C (SIGINT; SIGTERM too with the `termination` feature) into a
//! token trigger plus a counted event for the supervisor.
//!
//! Notes:
//! - `ctrlc` allows one handler per process, so the handler is installed once and
//!   routes to whichever bridge is currently registered.
//! - The handler runs on ctrlc's own thread, not in async-signal context; it only
//!   bumps a counter, flips the token and forwards an event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

use crate::errors::SupervisorError;
use crate::shutdown::CancellationToken;
use crate::supervisor::SupervisorEvent;

#[derive(Debug)]
struct BridgeInner {
    token: CancellationToken,
    interrupts: AtomicUsize,
    events: Sender<SupervisorEvent>,
}

/// Turns each interrupt into `token.trigger()` and an `Interrupt(n)` event.
#[derive(Debug, Clone)]
pub struct SignalBridge {
    inner: Arc<BridgeInner>,
}

impl SignalBridge {
    pub fn new(token: CancellationToken, events: Sender<SupervisorEvent>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                token,
                interrupts: AtomicUsize::new(0),
                events,
            }),
        }
    }

    /// Record one interrupt. Valid at any point; never blocks on the receiver.
    pub fn deliver(&self) -> usize {
        let count = self.inner.interrupts.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.token.trigger();
        // Receiver gone means the run is already Done.
        let _ = self.inner.events.send(SupervisorEvent::Interrupt(count));
        count
    }

    /// Interrupts received since this bridge was created.
    pub fn interrupts(&self) -> usize {
        self.inner.interrupts.load(Ordering::Acquire)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }
}

static HANDLER: OnceLock<Result<(), String>> = OnceLock::new();
static ACTIVE: Mutex<Option<SignalBridge>> = Mutex::new(None);

fn dispatch_interrupt() {
    let bridge = ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(bridge) = bridge {
        bridge.deliver();
    }
}

/// Binding between the process Ctrl-C handler and one bridge.
/// Dropping it unbinds the bridge; later interrupts are ignored.
#[derive(Debug)]
#[must_use = "the bridge is unbound as soon as the registration is dropped"]
pub struct InterruptRegistration {
    _priv: (),
}

impl Drop for InterruptRegistration {
    fn drop(&mut self) {
        ACTIVE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("Interrupt handler unbound");
    }
}

/// Route Ctrl-C to `bridge` until the returned registration is dropped.
pub fn register_ctrlc(bridge: &SignalBridge) -> Result<InterruptRegistration, SupervisorError> {
    HANDLER
        .get_or_init(|| ctrlc::set_handler(dispatch_interrupt).map_err(|e| e.to_string()))
        .clone()
        .map_err(SupervisorError::SignalInstall)?;

    let mut slot = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(SupervisorError::AlreadyRegistered);
    }
    *slot = Some(bridge.clone());
    debug!("Interrupt handler bound");
    Ok(InterruptRegistration { _priv: () })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn deliver_counts_and_triggers() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        let bridge = SignalBridge::new(token.clone(), tx);

        assert_eq!(bridge.deliver(), 1);
        assert!(token.is_triggered());
        assert_eq!(bridge.deliver(), 2);
        assert_eq!(bridge.interrupts(), 2);

        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![SupervisorEvent::Interrupt(1), SupervisorEvent::Interrupt(2)]
        );
    }

    #[test]
    fn deliver_after_receiver_dropped_is_harmless() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        let bridge = SignalBridge::new(token.clone(), tx);
        drop(rx);
        assert_eq!(bridge.deliver(), 1);
        assert!(token.is_triggered());
    }

    #[test]
    fn concurrent_deliveries_get_distinct_counts() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        let bridge = SignalBridge::new(token.clone(), tx);
        let barrier = Arc::new(std::sync::Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bridge = bridge.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    bridge.deliver()
                })
            })
            .collect();
        let mut returned: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        returned.sort_unstable();
        assert_eq!(returned, vec![1, 2, 3, 4]);
        assert_eq!(bridge.interrupts(), 4);
        assert!(token.is_triggered());

        let mut seen: Vec<usize> = rx
            .try_iter()
            .map(|ev| match ev {
                SupervisorEvent::Interrupt(n) => n,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }
}

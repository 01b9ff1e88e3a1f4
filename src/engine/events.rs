//! Keypad event dispatch.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::keypad::KeyEvent;

pub(crate) type KeyCallback = Arc<dyn Fn(KeyEvent) + Send + Sync>;

/// Opaque handle identifying a registered keypad observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyObserverHandle(u64);

/// Registered keypad observers.
///
/// Callbacks are snapshotted out of the lock before invocation, so an
/// observer may register or unregister (including itself) without
/// deadlocking the dispatcher.
pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<Vec<(u64, KeyCallback)>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, callback: KeyCallback) -> KeyObserverHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .expect("observer list lock poisoned")
            .push((id, callback));
        KeyObserverHandle(id)
    }

    /// Remove an observer; returns false if the handle is unknown.
    pub(crate) fn remove(&self, handle: KeyObserverHandle) -> bool {
        let mut observers = self.observers.lock().expect("observer list lock poisoned");
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle.0);
        observers.len() != before
    }

    fn snapshot(&self) -> Vec<KeyCallback> {
        self.observers
            .lock()
            .expect("observer list lock poisoned")
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

/// Dispatcher task: drains the event queue fed by the receive worker and
/// invokes the current observers. A blocking observer stalls only event
/// delivery, never frame reception or reply correlation.
pub(crate) async fn dispatch_loop(
    mut events: UnboundedReceiver<KeyEvent>,
    registry: Arc<ObserverRegistry>,
    cancel: CancellationToken,
) {
    debug!("event dispatcher started");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        for callback in registry.snapshot() {
            callback(event);
        }
    }
    debug!("event dispatcher stopped");
}

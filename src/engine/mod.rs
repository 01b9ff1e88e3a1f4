//! Packet protocol engine.
//!
//! Runs the CFA635 request/response protocol over a split duplex transport:
//! a receive worker frames and classifies inbound packets, a send worker
//! drains the outbound queue, and a dispatcher task delivers keypad reports
//! to registered observers. Callers correlate replies to their requests by
//! blocking on [`Engine::send_and_expect`] with a packet predicate.

mod events;
mod rx;
mod store;
mod transport;
mod tx;


// Re-export public API
pub use events::KeyObserverHandle;
pub use transport::Transport;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::keypad::KeyEvent;
use crate::packet::Packet;

use events::ObserverRegistry;
use store::InboundBuffer;

/// Protocol engine over an already-open transport.
pub struct Engine {
    outbound: mpsc::UnboundedSender<Packet>,
    inbound: Arc<InboundBuffer>,
    observers: Arc<ObserverRegistry>,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Split the transport and start the worker tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(transport: Box<dyn Transport>, config: &DriverConfig) -> Self {
        let (reader, writer) = tokio::io::split(transport);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (key_tx, key_rx) = mpsc::unbounded_channel();
        let inbound = Arc::new(InboundBuffer::new(config.inbound_capacity));
        let observers = Arc::new(ObserverRegistry::new());
        let cancel = CancellationToken::new();

        let workers = vec![
            tokio::spawn(rx::receive_loop(
                reader,
                Arc::clone(&inbound),
                key_tx,
                cancel.clone(),
                config.receive_timeout(),
            )),
            tokio::spawn(tx::send_loop(
                writer,
                outbound_rx,
                cancel.clone(),
                config.write_timeout(),
            )),
            tokio::spawn(events::dispatch_loop(key_rx, Arc::clone(&observers), cancel.clone())),
        ];

        Self {
            outbound: outbound_tx,
            inbound,
            observers,
            cancel,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a packet for transmission without waiting for any reply.
    pub fn send(&self, packet: Packet) -> Result<()> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        self.outbound.send(packet).map_err(|_| DriverError::Closed)
    }

    /// Queue `packet`, then block until a received reply satisfies `matches`
    /// or `window` elapses.
    ///
    /// Replies are matched by predicate, not arrival order. If two
    /// outstanding requests expect replies that satisfy the same predicate,
    /// a reply can be handed to the wrong caller; callers issuing commands
    /// whose acknowledgements are not distinguishable must serialize them.
    pub async fn send_and_expect<F>(&self, packet: Packet, matches: F, window: Duration) -> Result<Packet>
    where
        F: Fn(&Packet) -> bool,
    {
        self.send(packet)?;
        self.inbound.wait_match(matches, window).await
    }

    /// Register a keypad observer; returns a handle for removal.
    pub fn observe_keys<F>(&self, callback: F) -> KeyObserverHandle
    where
        F: Fn(KeyEvent) + Send + Sync + 'static,
    {
        self.observers.register(Arc::new(callback))
    }

    /// Remove a keypad observer; returns false if the handle is unknown.
    pub fn remove_key_observer(&self, handle: KeyObserverHandle) -> bool {
        self.observers.remove(handle)
    }

    /// Whether the engine has been shut down (or lost its transport).
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.inbound.is_closed()
    }

    /// Stop all workers deterministically.
    ///
    /// Cancels the workers, wakes every blocked caller with
    /// [`DriverError::Closed`], and waits for the tasks to exit. Idempotent;
    /// subsequent `send` calls fail with `Closed`.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.inbound.close();
        let workers: Vec<_> = self
            .workers
            .lock()
            .expect("worker list lock poisoned")
            .drain(..)
            .collect();
        for worker in workers {
            let _ = worker.await;
        }
        info!("Engine shut down");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Stop the workers even if shutdown() was never called; they hold
        // their own clones of the shared state.
        self.cancel.cancel();
        self.inbound.close();
    }
}

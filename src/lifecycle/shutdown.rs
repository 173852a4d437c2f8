//! Shutdown coordination for the background sync worker.

use tokio::sync::watch;

/// Coordinator for stopping the polling loop.
///
/// The signal is sticky: a receiver subscribed after [`Shutdown::trigger`]
/// still observes it, and triggering twice is harmless.
#[derive(Debug)]
pub struct Shutdown {
    /// Watch channel sender; `true` once shutdown was requested.
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Callable from any thread.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until `rx` observes shutdown. Also returns if the sender is gone.
pub async fn wait_for(rx: &mut watch::Receiver<bool>) {
    // wait_for errs only when the sender was dropped, which also means stop
    let _ = rx.wait_for(|stopped| *stopped).await;
}

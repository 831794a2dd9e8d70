//! Event delivery to task subscribers.

use simrun_core::SolverEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Fan-out hub for [`SolverEvent`] notifications.
///
/// Subscribing returns an unbounded receiver; dropping it unsubscribes
/// (closed senders are pruned on the next emit). Events are delivered to
/// every live subscriber in emission order, which preserves per-channel
/// ordering for the stdout and stderr streams.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<SolverEvent>>>>,
}

impl EventHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SolverEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("event hub lock")
            .push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn emit(&self, event: SolverEvent) {
        let mut subscribers = self.subscribers.lock().expect("event hub lock");
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers. Dropped receivers are counted until
    /// the next emit prunes them.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event hub lock").len()
    }
}

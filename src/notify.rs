use tokio::sync::broadcast;

use crate::model::ReservationEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for committed reservation changes. Derived views
/// subscribe and recompute on every event.
pub struct NotifyHub {
    sender: broadcast::Sender<ReservationEvent>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, event: &ReservationEvent) {
        let _ = self.sender.send(event.clone());
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

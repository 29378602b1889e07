use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use super::types::PlayerEvent;

/// Fan-out of `PlayerEvent`s to any number of subscribers.
///
/// Subscribers whose receiver was dropped are pruned on the next send.
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<Vec<Sender<PlayerEvent>>>>,
}

impl Broadcaster {
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn send(&self, event: PlayerEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

//! Acquisition notifications.
//!
//! Consumers (a UI, a log tailer, tests) call [`EventBus::subscribe`] and drain
//! the returned channel. Every subscriber sees events in publish order, which
//! is sample-write order for `SampleUpdated` / `IndexChanged`.
use crossbeam_channel as xch;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A sample was written at `index`.
    SampleUpdated { index: usize, value: f32 },
    /// The buffer write cursor moved to `index`.
    IndexChanged { index: usize },
    /// One reading failed; that cycle was skipped.
    ReadFailed { cycle: u32, message: String },
    RunStarted { experiment: String },
    /// The run ended, either by `stop()` or by reaching the cycle cap.
    RunFinished {
        experiment: String,
        samples: u32,
        cycle_threshold: u32,
    },
    CurrentChanged { experiment: String },
}

/// Fan-out publisher. Clones share one subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<xch::Sender<Event>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> xch::Receiver<Event> {
        let (tx, rx) = xch::unbounded();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    /// Deliver to every live subscriber; dropped receivers are pruned.
    pub fn publish(&self, event: Event) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

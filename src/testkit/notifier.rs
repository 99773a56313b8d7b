//! Recording notifier for event assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{SignalId, SignalStatus};
use crate::port::{Event, Notifier};

/// Thread-safe event collector for notification assertions in tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// `(from, to)` pairs recorded for `id`, oldest first.
    pub fn transitions_of(&self, id: &SignalId) -> Vec<(Option<SignalStatus>, SignalStatus)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Lifecycle(e) if &e.signal_id == id => Some((e.from, e.to)),
                _ => None,
            })
            .collect()
    }

    /// Number of `SignalRejected` events.
    pub fn rejections(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::SignalRejected(_)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}

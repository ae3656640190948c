//! Queue lifecycle events
//!
//! Events are fanned out over a `tokio::sync::broadcast` channel. Sending
//! never blocks the queue; when nobody listens the event is simply dropped,
//! and slow listeners observe `RecvError::Lagged` rather than stalling producers.

use std::time::SystemTime;
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueEventType {
    ItemsAppended,
    SubscriberAdded,
    SubscriberRemoved,
    DrainRequested,
    Closed,
}

#[derive(Clone, Debug)]
pub struct QueueEvent {
    pub event_type: QueueEventType,
    pub timestamp: SystemTime,
    pub queue_id: String,
    /// Item count for `ItemsAppended`, replay length for `SubscriberAdded`,
    /// backlog length for `DrainRequested` and `Closed`
    pub size: Option<usize>,
}

impl QueueEvent {
    pub fn new(event_type: QueueEventType, queue_id: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            queue_id,
            size: None,
        }
    }

    pub fn with_size(event_type: QueueEventType, queue_id: String, size: usize) -> Self {
        Self {
            size: Some(size),
            ..Self::new(event_type, queue_id)
        }
    }
}

#[derive(Debug)]
pub(crate) struct EventBus {
    queue_id: String,
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    pub fn new(queue_id: String, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { queue_id, sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event_type: QueueEventType, size: Option<usize>) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        let event = match size {
            Some(size) => QueueEvent::with_size(event_type, self.queue_id.clone(), size),
            None => QueueEvent::new(event_type, self.queue_id.clone()),
        };
        // Receivers may disappear between the count check and the send
        let _ = self.sender.send(event);
    }
}

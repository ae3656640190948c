//! Queue Error Types

use crate::queue::types::QueueState;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue no longer accepts items (state: {state})")]
    AlreadyClosed { state: QueueState },

    #[error("Queue is full (max size: {max_size})")]
    QueueFull { max_size: usize },

    #[error("Subscriber not found: {subscriber_id}")]
    SubscriberNotFound { subscriber_id: u64 },

    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    #[error("Queue invariant broken: {message}")]
    InvariantBroken { message: String },

    #[error("Timed out after {waited:?} waiting for the queue to drain")]
    Timeout { waited: Duration },

    #[error("Lock poisoned: {message}")]
    LockPoisoned { message: String },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

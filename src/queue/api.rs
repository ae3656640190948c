//! Public API for the queue system
//!
//! External modules should import from here rather than from the internal
//! modules. See the module documentation for architecture details.

// Core queue components
pub use crate::queue::consumer::Subscription;
pub use crate::queue::list::ListQueue;
pub use crate::queue::publisher::QueuePublisher;
pub use crate::queue::work::WorkCounter;

// Configuration
pub use crate::queue::config::QueueConfig;

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Lifecycle events
pub use crate::queue::events::{QueueEvent, QueueEventType};

// State and statistics
pub use crate::queue::types::{LagStats, QueueState, QueueStats};

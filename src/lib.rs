//! In-process broadcast queue with full-history replay.
//!
//! See [`queue`] for the queue itself and [`core`] for logging, settings and
//! lock helpers.

pub mod core;
pub mod queue;

pub use crate::queue::{ListQueue, QueueError, QueueResult, Subscription};

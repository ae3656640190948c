//! Broadcast Queue Component
//!
//! A generic in-process queue where every subscription receives every item
//! ever appended, past and future, exactly once and in append order, no
//! matter when it subscribed.
//!
//! # Overview
//!
//! - **Append-only backlog**: items are stored once as `Arc<T>` and shared by all readers
//! - **Independent cursors**: each subscription tracks its own backlog index
//! - **Full replay**: late subscriptions, even after close, see the whole history
//! - **Drain barrier**: `wait()` returns once every delivered item was acknowledged
//! - **Idempotent insert**: `add_unique` appends at most one item per key
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │
//! └──────┬───────┘     └──────┬───────┘
//!        │ append             │ add_unique
//!        ▼                    ▼
//! ┌───────────────────────────────────────────────┐
//! │                  ListQueue                    │
//! │  ┌───┬───┬───┬───┬───┬───┬───┬───┐            │
//! │  │ 0 │ 1 │ 2 │ 3 │ 4 │ 5 │ 6 │...│  backlog   │
//! │  └───┴───┴───┴───┴───┴───┴───┴───┘            │
//! │    ▲           ▲               ▲              │
//! │    │ cursor    │ cursor        │ cursor       │
//! │  WorkCounter ◄── done() ── outstanding units  │
//! └────┼───────────┼───────────────┼──────────────┘
//!      │ recv      │ recv          │ recv
//! ┌────┴─────┐ ┌───┴──────┐ ┌──────┴───┐
//! │  Sub 0   │ │  Sub 1   │ │  Sub 2   │
//! └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! # Accounting
//!
//! One work unit exists per (item, subscription) pair. Subscribing reserves
//! one unit per backlog item; appending reserves `items × subscriptions`;
//! each `done()` returns one unit. Reservation happens inside the same
//! critical section that registers subscriptions, so units always match the
//! deliveries that will actually happen.

mod config;
mod consumer;
mod error;
mod events;
mod internal;
mod list;
mod publisher;
mod types;
mod work;

pub mod api;

pub use config::QueueConfig;
pub use consumer::Subscription;
pub use error::{QueueError, QueueResult};
pub use events::{QueueEvent, QueueEventType};
pub use list::ListQueue;
pub use publisher::QueuePublisher;
pub use types::{LagStats, QueueState, QueueStats};
pub use work::WorkCounter;

#[cfg(test)]
mod tests;

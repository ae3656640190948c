//! Queue Publisher for appending items
//!
//! Publishers are lightweight producer handles. They hold only a weak
//! reference, so a forgotten publisher never keeps a queue alive; once every
//! `ListQueue` handle and subscription is gone, publishing fails.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::list::{publish_one, Shared};
use std::sync::{Arc, Weak};

/// Producer handle tagged with a `producer_id` that appears in queue logs
///
/// # Example
///
/// ```rust
/// use listqueue::queue::ListQueue;
///
/// let queue: ListQueue<String> = ListQueue::new();
/// let publisher = queue.publisher("ingest-worker");
///
/// let sequence = publisher.publish("record-1".to_string()).unwrap();
/// assert_eq!(sequence, 1);
/// ```
pub struct QueuePublisher<T, K = String> {
    producer_id: String,
    queue: Weak<Shared<T, K>>,
}

impl<T, K> Clone for QueuePublisher<T, K> {
    fn clone(&self) -> Self {
        Self {
            producer_id: self.producer_id.clone(),
            queue: Weak::clone(&self.queue),
        }
    }
}

impl<T, K> QueuePublisher<T, K> {
    pub(crate) fn new(producer_id: String, queue: Weak<Shared<T, K>>) -> Self {
        Self { producer_id, queue }
    }

    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    /// Append one item; returns its 1-based sequence number
    pub fn publish(&self, item: T) -> QueueResult<u64> {
        let shared = self.upgrade()?;
        publish_one(&shared, Some(&self.producer_id), item)
    }

    /// Append items in order; returns how many were appended
    pub fn append<I>(&self, items: I) -> QueueResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let shared = self.upgrade()?;
        let items: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        let count = items.len();
        shared.append(Some(&self.producer_id), items)?;
        Ok(count)
    }

    fn upgrade(&self) -> QueueResult<Arc<Shared<T, K>>> {
        self.queue.upgrade().ok_or_else(|| QueueError::OperationFailed {
            message: format!("publisher '{}' outlived its queue", self.producer_id),
        })
    }
}

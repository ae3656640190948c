//! Subscription handle for reading from a ListQueue
//!
//! Every subscription keeps its own cursor into the shared backlog. It first
//! replays everything appended before it was created, then follows new items,
//! and ends once the queue is closed and the cursor reached the backlog end.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::list::Shared;
use crate::queue::types::{QueueState, Signal};
use futures::stream::{self, Stream};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Ordered, exactly-once view of a queue's backlog
///
/// The subscription unregisters from the queue on drop, returning the work
/// units reserved for items it never received. Items already received but not
/// yet acknowledged still need a matching `done()` call.
///
/// # Example
///
/// ```rust,no_run
/// # use listqueue::queue::{ListQueue, QueueResult};
/// # async fn example(queue: ListQueue<String>) -> QueueResult<()> {
/// let mut subscription = queue.subscribe()?;
///
/// while let Some(item) = subscription.recv().await? {
///     println!("Processing: {}", item);
///     subscription.done()?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Subscription<T, K = String> {
    subscriber_id: u64,
    shared: Arc<Shared<T, K>>,
    signal: watch::Receiver<Signal>,
}

impl<T, K> Subscription<T, K> {
    pub(crate) fn new(
        subscriber_id: u64,
        shared: Arc<Shared<T, K>>,
        signal: watch::Receiver<Signal>,
    ) -> Self {
        Self {
            subscriber_id,
            shared,
            signal,
        }
    }

    pub fn id(&self) -> u64 {
        self.subscriber_id
    }

    /// Backlog index of the next item this subscription will receive
    pub fn position(&self) -> QueueResult<usize> {
        self.shared
            .cursor(self.subscriber_id)?
            .ok_or(QueueError::SubscriberNotFound {
                subscriber_id: self.subscriber_id,
            })
    }

    /// Take the next item if one is available right now
    ///
    /// `Ok(None)` only means nothing is available at the moment; use
    /// [`Subscription::recv`] to wait for more items or the end of the queue.
    pub fn try_recv(&self) -> QueueResult<Option<Arc<T>>> {
        self.shared.read_next(self.subscriber_id)
    }

    /// Wait for the next item; `Ok(None)` once the queue is closed and fully replayed
    pub async fn recv(&mut self) -> QueueResult<Option<Arc<T>>> {
        loop {
            // Mark the signal seen before checking so a concurrent append is never missed
            let observed = *self.signal.borrow_and_update();

            if let Some(item) = self.shared.read_next(self.subscriber_id)? {
                return Ok(Some(item));
            }
            if observed.state == QueueState::Closed {
                return Ok(None);
            }

            self.signal
                .changed()
                .await
                .map_err(|e| QueueError::OperationFailed {
                    message: format!("queue signal closed: {e}"),
                })?;
        }
    }

    /// Acknowledge one item received through this subscription
    pub fn done(&self) -> QueueResult<()> {
        self.shared.acknowledge(Some(self.subscriber_id))
    }

    /// Unregister explicitly; equivalent to dropping the subscription
    pub fn unsubscribe(self) {}

    /// Turn the subscription into a stream of items that ends when the queue closes
    ///
    /// Errors end the stream after being logged.
    pub fn into_stream(self) -> impl Stream<Item = Arc<T>> {
        stream::unfold(self, |mut subscription| async move {
            match subscription.recv().await {
                Ok(Some(item)) => Some((item, subscription)),
                Ok(None) => None,
                Err(e) => {
                    log::error!(
                        "Subscription {} on queue '{}' stopped: {}",
                        subscription.subscriber_id,
                        subscription.shared.name(),
                        e
                    );
                    None
                }
            }
        })
    }
}

impl<T, K> fmt::Debug for Subscription<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.subscriber_id)
            .field("queue", &self.shared.name())
            .finish()
    }
}

impl<T, K> Drop for Subscription<T, K> {
    fn drop(&mut self) {
        self.shared.unregister(self.subscriber_id);
    }
}

//! ListQueue - broadcast queue with full-history replay
//!
//! The `ListQueue` is the coordination point for producers, subscriptions and
//! the drain barrier. All clones of a `ListQueue` share one backlog.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::queue::config::QueueConfig;
use crate::queue::consumer::Subscription;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::events::{EventBus, QueueEvent, QueueEventType};
use crate::queue::internal::QueueInner;
use crate::queue::publisher::QueuePublisher;
use crate::queue::types::{LagStats, QueueState, QueueStats, Signal};
use crate::queue::work::WorkCounter;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// State shared by the queue handle, its publishers and its subscriptions
pub(crate) struct Shared<T, K> {
    config: QueueConfig,
    inner: RwLock<QueueInner<T, K>>,
    work: WorkCounter,
    signal: watch::Sender<Signal>,
    events: EventBus,
    next_subscriber_id: AtomicU64,
}

impl<T, K> Shared<T, K> {
    fn read(&self) -> QueueResult<RwLockReadGuard<'_, QueueInner<T, K>>> {
        handle_rwlock_read(self.inner.read(), |message| QueueError::LockPoisoned {
            message,
        })
    }

    fn write(&self) -> QueueResult<RwLockWriteGuard<'_, QueueInner<T, K>>> {
        handle_rwlock_write(self.inner.write(), |message| QueueError::LockPoisoned {
            message,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    /// Publish the new backlog length / state to parked readers; call with the lock held
    fn publish_signal(&self, inner: &QueueInner<T, K>) {
        self.signal.send_replace(inner.signal());
    }

    /// Return work units, failing fast if the ledger would go negative
    fn settle(&self, units: usize) -> usize {
        match self.work.release(units) {
            Ok(remaining) => remaining,
            Err(e) => {
                log::error!("Queue '{}' accounting failure: {}", self.name(), e);
                panic!("{e}");
            }
        }
    }

    /// Append items; returns the backlog length right after the append
    pub(crate) fn append(
        &self,
        producer_id: Option<&str>,
        items: Vec<Arc<T>>,
    ) -> QueueResult<usize> {
        let count = items.len();
        let (units, backlog_len) = {
            let mut inner = self.write()?;
            inner.ensure_accepting(count)?;
            if count == 0 {
                return Ok(inner.len());
            }
            let units = inner.push_batch(items);
            self.work.add(units);
            self.publish_signal(&inner);
            (units, inner.len())
        };

        log::debug!(
            "Queue '{}' appended {} item(s) from {} (backlog: {}, work units reserved: {})",
            self.name(),
            count,
            producer_id.unwrap_or("anonymous producer"),
            backlog_len,
            units
        );
        self.events.emit(QueueEventType::ItemsAppended, Some(count));
        Ok(backlog_len)
    }

    pub(crate) fn subscribe(self: &Arc<Self>) -> QueueResult<Subscription<T, K>> {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let receiver = self.signal.subscribe();

        // Registration and backlog snapshot form one critical section with append
        let (replay, state) = {
            let mut inner = self.write()?;
            let replay = inner.register(subscriber_id);
            self.work.add(replay);
            (replay, inner.state())
        };

        log::debug!(
            "Queue '{}' registered subscription {} (replaying {} item(s), state: {})",
            self.name(),
            subscriber_id,
            replay,
            state
        );
        self.events.emit(QueueEventType::SubscriberAdded, Some(replay));
        Ok(Subscription::new(subscriber_id, Arc::clone(self), receiver))
    }

    pub(crate) fn unregister(&self, subscriber_id: u64) {
        let mut inner = match self.write() {
            Ok(inner) => inner,
            Err(e) => {
                log::error!(
                    "Queue '{}' could not unregister subscription {}: {}",
                    self.name(),
                    subscriber_id,
                    e
                );
                return;
            }
        };

        if let Some(undelivered) = inner.unregister(subscriber_id) {
            let remaining = self.settle(undelivered);
            drop(inner);
            log::debug!(
                "Queue '{}' unregistered subscription {} (released {} undelivered unit(s), {} outstanding)",
                self.name(),
                subscriber_id,
                undelivered,
                remaining
            );
            self.events.emit(QueueEventType::SubscriberRemoved, Some(undelivered));
        }
    }

    pub(crate) fn read_next(&self, subscriber_id: u64) -> QueueResult<Option<Arc<T>>> {
        let item = self.write()?.read_next(subscriber_id)?;
        if item.is_some() {
            log::trace!(
                "Queue '{}' delivered an item to subscription {}",
                self.name(),
                subscriber_id
            );
        }
        Ok(item)
    }

    pub(crate) fn acknowledge(&self, subscriber_id: Option<u64>) -> QueueResult<()> {
        let mut inner = self.write()?;
        if let Err(e) = inner.acknowledge(subscriber_id) {
            log::warn!("Queue '{}' rejected acknowledgement: {}", self.name(), e);
            return Err(e);
        }
        let remaining = self.settle(1);
        if remaining == 0 {
            log::debug!("Queue '{}' has no outstanding work", self.name());
        }
        Ok(())
    }

    pub(crate) fn state(&self) -> QueueState {
        self.signal.borrow().state
    }

    pub(crate) fn cursor(&self, subscriber_id: u64) -> QueueResult<Option<usize>> {
        Ok(self.read()?.cursor(subscriber_id))
    }

    async fn wait(&self) -> QueueResult<()> {
        {
            let mut inner = self.write()?;
            match inner.state() {
                QueueState::Closed => return Ok(()),
                QueueState::Open => {
                    inner.begin_drain();
                    self.publish_signal(&inner);
                    log::debug!(
                        "Queue '{}' draining ({} item(s), {} subscription(s), {} outstanding)",
                        self.name(),
                        inner.len(),
                        inner.subscriber_count(),
                        self.work.outstanding()
                    );
                    self.events.emit(QueueEventType::DrainRequested, Some(inner.len()));
                }
                QueueState::Draining => {}
            }
        }

        loop {
            self.work.wait_zero().await?;

            // Reservations only happen under the write lock, so zero here is final
            let mut inner = self.write()?;
            let outstanding = self.work.outstanding();
            if outstanding > 0 {
                log::debug!(
                    "Queue '{}' still draining: {} unit(s) reserved after the barrier released",
                    self.name(),
                    outstanding
                );
                continue;
            }

            if inner.close() {
                self.publish_signal(&inner);
                log::debug!(
                    "Queue '{}' closed with {} item(s) delivered to {} subscription(s)",
                    self.name(),
                    inner.len(),
                    inner.subscriber_count()
                );
                self.events.emit(QueueEventType::Closed, Some(inner.len()));
            }
            return Ok(());
        }
    }
}

impl<T, K> Shared<T, K>
where
    K: Eq + Hash,
{
    fn add_unique(&self, key: K, value: T) -> QueueResult<bool> {
        let item = Arc::new(value);
        let backlog_len = {
            let mut inner = self.write()?;
            inner.ensure_accepting(1)?;
            if inner.contains_key(&key) {
                return Ok(false);
            }
            let units = inner.push_unique(key, item);
            self.work.add(units);
            self.publish_signal(&inner);
            inner.len()
        };

        log::debug!(
            "Queue '{}' appended a unique item (backlog: {})",
            self.name(),
            backlog_len
        );
        self.events.emit(QueueEventType::ItemsAppended, Some(1));
        Ok(true)
    }
}

/// Broadcast queue delivering every item, past and future, to every subscription
///
/// # Example
///
/// ```rust,no_run
/// use listqueue::queue::ListQueue;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue: ListQueue<u32> = ListQueue::new();
/// queue.append([1, 2])?;
///
/// let mut subscription = queue.subscribe()?;
/// let consumer = tokio::spawn(async move {
///     while let Some(item) = subscription.recv().await? {
///         println!("{}", item);
///         subscription.done()?;
///     }
///     Ok::<_, listqueue::queue::QueueError>(())
/// });
///
/// queue.append([3, 4])?;
///
/// // Blocks until every delivered item is acknowledged, then closes the queue
/// queue.wait().await?;
/// consumer.await??;
/// # Ok(())
/// # }
/// ```
pub struct ListQueue<T, K = String> {
    shared: Arc<Shared<T, K>>,
}

impl<T, K> Clone for ListQueue<T, K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, K> Default for ListQueue<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> fmt::Debug for ListQueue<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListQueue")
            .field("name", &self.shared.name())
            .field("state", &self.state())
            .field("len", &self.len())
            .field("outstanding_work", &self.outstanding_work())
            .finish()
    }
}

impl<T, K> ListQueue<T, K> {
    /// Create an empty, open, unbounded queue
    pub fn new() -> Self {
        Self::build(QueueConfig::default(), Vec::new())
    }

    pub fn with_config(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::build(config, Vec::new()))
    }

    /// Create an open queue whose backlog already holds `items`
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::build(
            QueueConfig::default(),
            items.into_iter().map(Arc::new).collect(),
        )
    }

    fn build(config: QueueConfig, seed: Vec<Arc<T>>) -> Self {
        let mut backlog = Vec::with_capacity(config.initial_capacity.max(seed.len()));
        backlog.extend(seed);

        let inner = QueueInner::new(backlog, config.max_backlog);
        let (signal, _) = watch::channel(inner.signal());
        let events = EventBus::new(config.name.clone(), config.event_capacity);

        Self {
            shared: Arc::new(Shared {
                config,
                inner: RwLock::new(inner),
                work: WorkCounter::new(),
                signal,
                events,
                next_subscriber_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Create a producer handle tagged with `producer_id`
    pub fn publisher(&self, producer_id: impl Into<String>) -> QueuePublisher<T, K> {
        QueuePublisher::new(producer_id.into(), Arc::downgrade(&self.shared))
    }

    /// Append items in order; returns how many were appended
    ///
    /// Fails with [`QueueError::AlreadyClosed`] once [`ListQueue::wait`] has been called.
    pub fn append<I>(&self, items: I) -> QueueResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        let count = items.len();
        self.shared.append(None, items)?;
        Ok(count)
    }

    /// Append a single item and return its 1-based sequence number
    pub fn publish(&self, item: T) -> QueueResult<u64> {
        publish_one(&self.shared, None, item)
    }

    /// Register a subscription that replays the whole backlog, then follows new items
    pub fn subscribe(&self) -> QueueResult<Subscription<T, K>> {
        self.shared.subscribe()
    }

    /// Acknowledge one delivered item from any subscription
    pub fn done(&self) -> QueueResult<()> {
        self.shared.acknowledge(None)
    }

    /// Stop accepting items, wait for every delivered item to be acknowledged, then close
    ///
    /// A subscription that never consumes its items keeps this future pending forever.
    pub async fn wait(&self) -> QueueResult<()> {
        self.shared.wait().await
    }

    /// [`ListQueue::wait`] bounded by `timeout`; the queue stays draining on timeout
    pub async fn wait_timeout(&self, timeout: Duration) -> QueueResult<()> {
        match tokio::time::timeout(timeout, self.shared.wait()).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Queue '{}' still has {} outstanding work unit(s) after {:?}",
                    self.name(),
                    self.outstanding_work(),
                    timeout
                );
                Err(QueueError::Timeout { waited: timeout })
            }
        }
    }

    pub fn state(&self) -> QueueState {
        self.shared.state()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == QueueState::Closed
    }

    /// Number of items ever appended
    pub fn len(&self) -> usize {
        self.shared.signal.borrow().published
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn outstanding_work(&self) -> usize {
        self.shared.work.outstanding()
    }

    pub fn subscriber_count(&self) -> QueueResult<usize> {
        Ok(self.shared.read()?.subscriber_count())
    }

    pub fn stats(&self) -> QueueResult<QueueStats> {
        let inner = self.shared.read()?;
        Ok(QueueStats {
            backlog_len: inner.len(),
            subscribers: inner.subscriber_count(),
            outstanding_work: self.shared.work.outstanding(),
            delivered: inner.delivered(),
            acknowledged: inner.acknowledged(),
            state: inner.state(),
        })
    }

    pub fn lag_stats(&self) -> QueueResult<LagStats> {
        Ok(self.shared.read()?.lag_stats())
    }

    /// Listen for lifecycle events emitted after this call
    pub fn events(&self) -> broadcast::Receiver<QueueEvent> {
        self.shared.events.subscribe()
    }
}

impl<T, K> ListQueue<T, K>
where
    K: Eq + Hash,
{
    /// Append `value` unless `key` was used before; returns whether it was appended
    pub fn add_unique(&self, key: K, value: T) -> QueueResult<bool> {
        self.shared.add_unique(key, value)
    }

    /// The value recorded for `key` by a successful [`ListQueue::add_unique`]
    pub fn unique<Q>(&self, key: &Q) -> QueueResult<Option<Arc<T>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Ok(self.shared.read()?.unique(key))
    }
}

pub(crate) fn publish_one<T, K>(
    shared: &Shared<T, K>,
    producer_id: Option<&str>,
    item: T,
) -> QueueResult<u64> {
    let backlog_len = shared.append(producer_id, vec![Arc::new(item)])?;
    Ok(backlog_len as u64)
}

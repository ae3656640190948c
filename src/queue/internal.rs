//! Queue state guarded by the queue lock
//!
//! `QueueInner` holds everything guarded by the queue lock:
//! - the append-only backlog of `Arc`-wrapped items
//! - per-subscriber cursors into the backlog
//! - the uniqueness index used by `add_unique`
//! - delivery / acknowledgement totals and the lifecycle state
//!
//! Methods here never block and never touch the work counter. Each mutation
//! returns the number of work units the caller must reserve or release while
//! still holding the lock, which keeps accounting and registration in a single
//! critical section.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::{LagStats, QueueState, Signal};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Per-subscription progress
#[derive(Debug, Clone, Default)]
struct SubscriberPosition {
    /// Backlog index of the next item to deliver
    cursor: usize,
    /// Items acknowledged through the subscription handle
    acknowledged: usize,
}

#[derive(Debug)]
pub(crate) struct QueueInner<T, K> {
    backlog: Vec<Arc<T>>,
    positions: HashMap<u64, SubscriberPosition>,
    key_index: HashMap<K, Arc<T>>,
    state: QueueState,
    max_backlog: Option<usize>,
    delivered: u64,
    acknowledged: u64,
}

impl<T, K> QueueInner<T, K> {
    pub fn new(backlog: Vec<Arc<T>>, max_backlog: Option<usize>) -> Self {
        Self {
            backlog,
            positions: HashMap::new(),
            key_index: HashMap::new(),
            state: QueueState::Open,
            max_backlog,
            delivered: 0,
            acknowledged: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn subscriber_count(&self) -> usize {
        self.positions.len()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn acknowledged(&self) -> u64 {
        self.acknowledged
    }

    pub fn signal(&self) -> Signal {
        Signal {
            published: self.backlog.len(),
            state: self.state,
        }
    }

    /// Reject the append when draining/closed or when it would overflow the bound
    pub fn ensure_accepting(&self, incoming: usize) -> QueueResult<()> {
        if !self.state.accepts_items() {
            return Err(QueueError::AlreadyClosed { state: self.state });
        }
        if let Some(max_size) = self.max_backlog {
            if self.backlog.len() + incoming > max_size {
                return Err(QueueError::QueueFull { max_size });
            }
        }
        Ok(())
    }

    /// Append already-validated items; returns the work units to reserve
    pub fn push_batch(&mut self, items: Vec<Arc<T>>) -> usize {
        let count = items.len();
        self.backlog.extend(items);
        count * self.positions.len()
    }

    /// Register a subscriber at the start of the backlog; returns the replay length
    pub fn register(&mut self, subscriber_id: u64) -> usize {
        self.positions
            .insert(subscriber_id, SubscriberPosition::default());
        self.backlog.len()
    }

    /// Remove a subscriber; returns the units reserved for items it never received
    pub fn unregister(&mut self, subscriber_id: u64) -> Option<usize> {
        self.positions
            .remove(&subscriber_id)
            .map(|position| self.backlog.len() - position.cursor)
    }

    pub fn cursor(&self, subscriber_id: u64) -> Option<usize> {
        self.positions
            .get(&subscriber_id)
            .map(|position| position.cursor)
    }

    /// Hand out the next unseen item for a subscriber and advance its cursor
    pub fn read_next(&mut self, subscriber_id: u64) -> QueueResult<Option<Arc<T>>> {
        let position = self
            .positions
            .get_mut(&subscriber_id)
            .ok_or(QueueError::SubscriberNotFound { subscriber_id })?;

        match self.backlog.get(position.cursor) {
            Some(item) => {
                position.cursor += 1;
                self.delivered += 1;
                Ok(Some(Arc::clone(item)))
            }
            None => Ok(None),
        }
    }

    /// Record one acknowledgement, optionally attributed to a subscription
    pub fn acknowledge(&mut self, subscriber_id: Option<u64>) -> QueueResult<()> {
        if self.acknowledged >= self.delivered {
            return Err(QueueError::PreconditionViolation {
                message: format!(
                    "done() called {} time(s) but only {} item(s) were delivered",
                    self.acknowledged + 1,
                    self.delivered
                ),
            });
        }

        if let Some(subscriber_id) = subscriber_id {
            let position = self
                .positions
                .get_mut(&subscriber_id)
                .ok_or(QueueError::SubscriberNotFound { subscriber_id })?;
            if position.acknowledged >= position.cursor {
                return Err(QueueError::PreconditionViolation {
                    message: format!(
                        "subscription {} acknowledged {} item(s) but received {}",
                        subscriber_id,
                        position.acknowledged + 1,
                        position.cursor
                    ),
                });
            }
            position.acknowledged += 1;
        }

        self.acknowledged += 1;
        Ok(())
    }

    /// `Open → Draining`; returns whether the transition happened
    pub fn begin_drain(&mut self) -> bool {
        if self.state == QueueState::Open {
            self.state = QueueState::Draining;
            true
        } else {
            false
        }
    }

    /// `Open | Draining → Closed`; returns whether the transition happened
    pub fn close(&mut self) -> bool {
        if self.state == QueueState::Closed {
            false
        } else {
            self.state = QueueState::Closed;
            true
        }
    }

    pub fn lag_stats(&self) -> LagStats {
        let lags: Vec<usize> = self
            .positions
            .values()
            .map(|position| self.backlog.len() - position.cursor)
            .collect();
        LagStats::from_lags(&lags)
    }
}

impl<T, K> QueueInner<T, K>
where
    K: Eq + Hash,
{
    /// Whether `key` was already claimed by an earlier insert
    pub fn contains_key(&self, key: &K) -> bool {
        self.key_index.contains_key(key)
    }

    /// Record `key → item` and append the item; the caller checked `contains_key`
    pub fn push_unique(&mut self, key: K, item: Arc<T>) -> usize {
        self.key_index.insert(key, Arc::clone(&item));
        self.push_batch(vec![item])
    }

    pub fn unique<Q>(&self, key: &Q) -> Option<Arc<T>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.key_index.get(key).cloned()
    }
}

//! Type definitions for the queue system
//!
//! This module contains the lifecycle state, the wakeup signal shared with
//! subscriptions, and the statistics snapshots exposed by the queue.

use std::fmt;

/// Lifecycle state of a queue
///
/// Transitions are monotonic: `Open → Draining → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Accepting appends
    Open,
    /// A coordinator is waiting for outstanding work to reach zero; appends are rejected
    Draining,
    /// Fully drained; subscriptions end once their backlog is exhausted
    Closed,
}

impl QueueState {
    pub fn accepts_items(self) -> bool {
        self == QueueState::Open
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueState::Open => "open",
            QueueState::Draining => "draining",
            QueueState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Value broadcast to parked subscription readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Signal {
    pub published: usize,
    pub state: QueueState,
}

/// Point-in-time snapshot of queue accounting
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    /// Number of items in the backlog
    pub backlog_len: usize,
    /// Number of registered subscriptions
    pub subscribers: usize,
    /// Work units not yet acknowledged
    pub outstanding_work: usize,
    /// Items handed out across all subscriptions
    pub delivered: u64,
    /// Acknowledgements received across all subscriptions
    pub acknowledged: u64,
    /// Current lifecycle state
    pub state: QueueState,
}

/// Subscriber lag statistics
#[derive(Debug, Clone, PartialEq)]
pub struct LagStats {
    /// Total number of registered subscriptions
    pub total_subscribers: usize,
    /// Maximum lag among all subscriptions
    pub max_lag: usize,
    /// Minimum lag among all subscriptions
    pub min_lag: usize,
    /// Average lag across all subscriptions
    pub avg_lag: f64,
}

impl LagStats {
    pub(crate) fn from_lags(lags: &[usize]) -> Self {
        if lags.is_empty() {
            return Self {
                total_subscribers: 0,
                max_lag: 0,
                min_lag: 0,
                avg_lag: 0.0,
            };
        }

        Self {
            total_subscribers: lags.len(),
            max_lag: lags.iter().copied().max().unwrap_or(0),
            min_lag: lags.iter().copied().min().unwrap_or(0),
            avg_lag: lags.iter().sum::<usize>() as f64 / lags.len() as f64,
        }
    }
}

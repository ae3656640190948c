//! Outstanding-work accounting
//!
//! `WorkCounter` is a small semaphore-like ledger: producers and subscribers
//! reserve units with [`WorkCounter::add`], consumers return them with
//! [`WorkCounter::done`], and a coordinator parks in
//! [`WorkCounter::wait_zero`] until every unit has been returned.
//!
//! The counter never clamps. Returning more units than are outstanding is an
//! accounting bug elsewhere and is reported as [`QueueError::InvariantBroken`].

use crate::queue::error::{QueueError, QueueResult};
use tokio::sync::watch;

#[derive(Debug)]
pub struct WorkCounter {
    outstanding: watch::Sender<usize>,
}

impl WorkCounter {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self { outstanding }
    }

    /// Units reserved and not yet returned
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Reserve `units` of work
    pub fn add(&self, units: usize) {
        if units == 0 {
            return;
        }
        self.outstanding.send_modify(|count| *count += units);
    }

    /// Return a single unit, yielding the remaining count
    pub fn done(&self) -> QueueResult<usize> {
        self.release(1)
    }

    /// Return `units` at once, yielding the remaining count
    pub fn release(&self, units: usize) -> QueueResult<usize> {
        let mut result = Ok(0);
        self.outstanding.send_if_modified(|count| {
            if units > *count {
                result = Err(QueueError::InvariantBroken {
                    message: format!(
                        "attempted to return {} work unit(s) with only {} outstanding",
                        units, *count
                    ),
                });
                return false;
            }
            *count -= units;
            result = Ok(*count);
            units > 0
        });
        result
    }

    /// Block until the outstanding count reaches zero
    pub async fn wait_zero(&self) -> QueueResult<()> {
        let mut receiver = self.outstanding.subscribe();
        receiver
            .wait_for(|count| *count == 0)
            .await
            .map(|_| ())
            .map_err(|e| QueueError::OperationFailed {
                message: format!("work counter closed while waiting: {e}"),
            })
    }
}

impl Default for WorkCounter {
    fn default() -> Self {
        Self::new()
    }
}

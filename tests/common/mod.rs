//! Common test utilities and helpers
//!
//! Consumers spawned here acknowledge every item through their subscription
//! and return what they received once the queue closes.

#![allow(dead_code)]

use listqueue::queue::{ListQueue, QueueResult, Subscription};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive and acknowledge until end-of-stream
pub async fn consume<T: Clone>(mut subscription: Subscription<T>) -> QueueResult<Vec<T>> {
    let mut received = Vec::new();
    while let Some(item) = subscription.recv().await? {
        received.push((*item).clone());
        subscription.done()?;
    }
    Ok(received)
}

pub fn spawn_consumer<T>(queue: &ListQueue<T>) -> JoinHandle<QueueResult<Vec<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    let subscription = queue.subscribe().expect("subscribe failed");
    tokio::spawn(consume(subscription))
}

/// Drain the queue, failing the test if the barrier never releases
pub async fn drain<T>(queue: &ListQueue<T>) {
    timeout(TEST_TIMEOUT, queue.wait())
        .await
        .expect("drain barrier did not release")
        .expect("wait failed");
}

pub async fn join_consumer<T>(handle: JoinHandle<QueueResult<Vec<T>>>) -> Vec<T> {
    timeout(TEST_TIMEOUT, handle)
        .await
        .expect("consumer did not finish")
        .expect("consumer panicked")
        .expect("consumer failed")
}

//! Test modules for the queue system
//!
//! Tests are organised by functional area. Shared helpers below bound every
//! blocking receive with a timeout so a lost wakeup fails the test instead of
//! hanging it.

mod lifecycle;

use crate::queue::Subscription;
use std::time::Duration;
use tokio::time::timeout;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive the next item, panicking on timeout, error or end-of-stream
pub(crate) async fn recv_item<T: Clone, K>(subscription: &mut Subscription<T, K>) -> T {
    let item = timeout(RECV_TIMEOUT, subscription.recv())
        .await
        .expect("timed out waiting for an item")
        .expect("recv failed")
        .expect("subscription ended early");
    (*item).clone()
}

/// Receive `count` items without acknowledging them
pub(crate) async fn recv_n<T: Clone, K>(
    subscription: &mut Subscription<T, K>,
    count: usize,
) -> Vec<T> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(recv_item(subscription).await);
    }
    items
}

/// Receive and acknowledge until the subscription ends
pub(crate) async fn drain_acking<T: Clone, K>(subscription: &mut Subscription<T, K>) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        let next = timeout(RECV_TIMEOUT, subscription.recv())
            .await
            .expect("timed out waiting for the subscription to end")
            .expect("recv failed");
        match next {
            Some(item) => {
                items.push((*item).clone());
                subscription.done().expect("acknowledgement rejected");
            }
            None => return items,
        }
    }
}

/// Assert the subscription reports end-of-stream
pub(crate) async fn assert_ended<T, K>(subscription: &mut Subscription<T, K>) {
    let next = timeout(RECV_TIMEOUT, subscription.recv())
        .await
        .expect("timed out waiting for end-of-stream")
        .expect("recv failed");
    assert!(next.is_none(), "expected end-of-stream");
}

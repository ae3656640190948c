//! Lifecycle tests - draining, closing and lifecycle events

#[cfg(test)]
mod tests {
    use crate::queue::api::{ListQueue, QueueError, QueueEventType, QueueState};
    use crate::queue::tests::{assert_ended, drain_acking, recv_item, recv_n, RECV_TIMEOUT};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_state_transitions_open_draining_closed() {
        let queue: ListQueue<u32> = ListQueue::new();
        let mut subscription = queue.subscribe().unwrap();
        queue.append([1]).unwrap();
        assert_eq!(queue.state(), QueueState::Open);

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.wait().await })
        };

        // Draining is visible before the last acknowledgement arrives
        timeout(RECV_TIMEOUT, async {
            while queue.state() != QueueState::Draining {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        recv_item(&mut subscription).await;
        subscription.done().unwrap();

        let drained = timeout(RECV_TIMEOUT, waiter).await.unwrap();
        drained.unwrap().unwrap();
        assert_eq!(queue.state(), QueueState::Closed);
        assert_ended(&mut subscription).await;
    }

    #[tokio::test]
    async fn test_subscription_while_draining_holds_barrier() {
        let queue: ListQueue<u32> = ListQueue::new();
        let mut first = queue.subscribe().unwrap();
        queue.append([1, 2]).unwrap();

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.wait().await })
        };
        timeout(RECV_TIMEOUT, async {
            while queue.state() != QueueState::Draining {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // Joining mid-drain reserves the whole replay
        let mut late = queue.subscribe().unwrap();
        assert_eq!(queue.outstanding_work(), 4);

        assert_eq!(recv_n(&mut first, 2).await, vec![1, 2]);
        first.done().unwrap();
        first.done().unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(queue.state(), QueueState::Draining);
        assert_eq!(queue.outstanding_work(), 2);

        assert_eq!(drain_acking(&mut late).await, vec![1, 2]);
        let drained = timeout(RECV_TIMEOUT, waiter).await.unwrap();
        drained.unwrap().unwrap();
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_append_rejected_while_draining() {
        let queue: ListQueue<u32> = ListQueue::new();
        let _subscription = queue.subscribe().unwrap();
        queue.append([1]).unwrap();

        let err = queue
            .wait_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Timeout { .. }));

        let err = queue.append([2]).unwrap_err();
        assert!(matches!(err, QueueError::AlreadyClosed { .. }));
        assert!(err.to_string().contains("draining"));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_append_rejected_after_close() {
        let queue: ListQueue<u32> = ListQueue::new();
        queue.wait().await.unwrap();

        let err = queue.append([1]).unwrap_err();
        assert!(matches!(err, QueueError::AlreadyClosed { .. }));
        assert!(err.to_string().contains("closed"));
        assert!(queue.publish(2).is_err());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_wait_is_idempotent() {
        let queue: ListQueue<u32> = ListQueue::from_items([1]);
        queue.wait().await.unwrap();
        timeout(RECV_TIMEOUT, queue.wait()).await.unwrap().unwrap();
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_waiters_all_return() {
        let queue: ListQueue<u32> = ListQueue::new();
        let mut subscription = queue.subscribe().unwrap();
        queue.append([1, 2]).unwrap();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.wait().await })
            })
            .collect();

        assert_eq!(drain_acking(&mut subscription).await, vec![1, 2]);

        for waiter in waiters {
            let drained = timeout(RECV_TIMEOUT, waiter).await.unwrap();
            drained.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_after_close_replays_then_ends() {
        let queue: ListQueue<&str> = ListQueue::new();
        queue.append(["a", "b"]).unwrap();
        queue.wait().await.unwrap();

        let mut late = queue.subscribe().unwrap();
        assert_eq!(recv_item(&mut late).await, "a");
        assert_eq!(recv_item(&mut late).await, "b");
        assert_ended(&mut late).await;
    }

    #[tokio::test]
    async fn test_wait_timeout_then_wait_completes() {
        let queue: ListQueue<u32> = ListQueue::new();
        let mut subscription = queue.subscribe().unwrap();
        queue.append([1]).unwrap();

        assert!(queue.wait_timeout(Duration::from_millis(20)).await.is_err());

        recv_item(&mut subscription).await;
        subscription.done().unwrap();
        queue
            .wait_timeout(RECV_TIMEOUT)
            .await
            .expect("drain should finish once acknowledged");
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_lifecycle_events_in_order() {
        let queue: ListQueue<u32> = ListQueue::new();
        let mut events = queue.events();

        let mut subscription = queue.subscribe().unwrap();
        queue.append([1, 2]).unwrap();
        let consumer = tokio::spawn(async move { drain_acking(&mut subscription).await });
        queue.wait().await.unwrap();
        consumer.await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.queue_id, "default");
            seen.push((event.event_type, event.size));
        }

        assert_eq!(
            seen,
            vec![
                (QueueEventType::SubscriberAdded, Some(0)),
                (QueueEventType::ItemsAppended, Some(2)),
                (QueueEventType::DrainRequested, Some(2)),
                (QueueEventType::Closed, Some(2)),
                (QueueEventType::SubscriberRemoved, Some(0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_events_are_optional() {
        // No listener: emitting must not fail or block any operation
        let queue: ListQueue<u32> = ListQueue::new();
        queue.append([1]).unwrap();
        queue.wait().await.unwrap();
        assert!(queue.is_closed());
    }
}

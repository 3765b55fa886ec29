//! Fan-out of timer events to subscribers
//!
//! Every subscriber gets its own bounded queue and a dedicated delivery
//! task. Publishing only enqueues, so a stalled handler delays nothing but
//! its own queue, and each subscriber sees events in publish order. Once a
//! queue is full, further events for that subscriber are dropped until it
//! catches up.

use std::{
    collections::HashMap,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use super::NotificationEvent;

/// Events held for a subscriber that has not caught up yet
pub const SUBSCRIBER_QUEUE: usize = 256;

/// Handle for one registered handler
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    alive: Arc<AtomicBool>,
}

impl Subscription {
    /// False once the subscription has been removed or its delivery task ended
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Subscriber {
    tx: mpsc::Sender<NotificationEvent>,
    alive: Arc<AtomicBool>,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
}

/// Publish/subscribe registry for [`NotificationEvent`]s.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Must be called from within a tokio runtime.
    ///
    /// A handler returning `Err` or panicking is logged and keeps receiving
    /// later events.
    pub fn subscribe<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(NotificationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let alive = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE);

        tokio::spawn(deliver(id, rx, Arc::clone(&alive), handler));

        self.subscribers().insert(
            id,
            Subscriber {
                tx,
                alive: Arc::clone(&alive),
            },
        );
        debug!("Subscriber {} registered", id);

        Subscription { id, alive }
    }

    /// Remove a subscription.
    ///
    /// No event is handed to the handler after this returns, apart from one
    /// that was already being delivered. Returns false if it was not
    /// registered.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        subscription.alive.store(false, Ordering::Release);
        let removed = self.subscribers().remove(&subscription.id).is_some();
        if removed {
            debug!("Subscriber {} removed", subscription.id);
        }
        removed
    }

    /// Queue `event` for every current subscriber. Never waits on handlers;
    /// a subscriber whose queue is full misses this event.
    pub fn publish(&self, event: NotificationEvent) {
        self.subscribers().retain(|id, subscriber| {
            if !subscriber.alive.load(Ordering::Acquire) {
                return false;
            }
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    warn!("Subscriber {} is lagging, dropped {:?} event", id, event.kind);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Dropping subscriber {} whose delivery task has ended", id);
                    false
                }
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        // The map holds no invariants a panicking holder could break.
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Delivery loop for a single subscriber
async fn deliver<F, Fut>(
    id: u64,
    mut rx: mpsc::Receiver<NotificationEvent>,
    alive: Arc<AtomicBool>,
    handler: F,
) where
    F: Fn(NotificationEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    while let Some(event) = rx.recv().await {
        if !alive.load(Ordering::Acquire) {
            break;
        }
        let kind = event.kind;
        let result = AssertUnwindSafe(async { handler(event).await })
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Subscriber {} failed handling {:?}: {:#}", id, kind, e),
            Err(_) => error!("Subscriber {} panicked handling {:?}", id, kind),
        }
    }
    alive.store(false, Ordering::Release);
    debug!("Delivery task for subscriber {} finished", id);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::{notify::EventKind, state::Phase};

    fn event(kind: EventKind, cycle_count: u64) -> NotificationEvent {
        NotificationEvent::new(kind, Phase::Work, Duration::ZERO, cycle_count)
    }

    fn collector(hub: &NotificationHub) -> (Subscription, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = hub.subscribe(move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
                anyhow::Ok(())
            }
        });
        (sub, rx)
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let hub = NotificationHub::new();
        let (_sub, mut rx) = collector(&hub);
        for n in 0..20 {
            hub.publish(event(EventKind::Tick, n));
        }
        for n in 0..20 {
            assert_eq!(rx.recv().await.unwrap().cycle_count, n);
        }
    }

    #[tokio::test]
    async fn stalled_subscriber_does_not_block_others() {
        let hub = NotificationHub::new();
        let _stuck = hub.subscribe(|_event| async {
            std::future::pending::<()>().await;
            anyhow::Ok(())
        });
        let (_sub, mut rx) = collector(&hub);

        hub.publish(event(EventKind::Started, 0));
        hub.publish(event(EventKind::Paused, 0));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Started);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Paused);
    }

    #[tokio::test]
    async fn stalled_subscriber_backlog_is_bounded() {
        let hub = NotificationHub::new();
        let gate = Arc::new(Notify::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler_gate = Arc::clone(&gate);
        let _sub = hub.subscribe(move |event: NotificationEvent| {
            let gate = Arc::clone(&handler_gate);
            let tx = tx.clone();
            async move {
                if event.cycle_count == 0 {
                    gate.notified().await;
                }
                let _ = tx.send(event.cycle_count);
                anyhow::Ok(())
            }
        });

        for n in 0..10_000 {
            hub.publish(event(EventKind::Tick, n));
        }
        assert_eq!(hub.subscriber_count(), 1);
        gate.notify_one();

        // Only the queued prefix survives, still in order.
        for n in 0..SUBSCRIBER_QUEUE as u64 {
            assert_eq!(rx.recv().await.unwrap(), n);
        }

        // Caught up again, so new events flow.
        hub.publish(event(EventKind::Cancelled, 99_999));
        assert_eq!(rx.recv().await.unwrap(), 99_999);
    }

    #[tokio::test]
    async fn failing_and_panicking_handlers_are_isolated() {
        let hub = NotificationHub::new();
        let failing = hub.subscribe(|_event| async { Err::<(), _>(anyhow::anyhow!("nope")) });
        let panicking = hub.subscribe(|event: NotificationEvent| async move {
            if event.kind == EventKind::Started {
                panic!("handler bug");
            }
            anyhow::Ok(())
        });
        let (_sub, mut rx) = collector(&hub);

        hub.publish(event(EventKind::Started, 0));
        hub.publish(event(EventKind::Cancelled, 0));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Started);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Cancelled);
        assert!(failing.is_active());
        assert!(panicking.is_active());
        assert_eq!(hub.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn nothing_is_delivered_after_unsubscribe() {
        let hub = NotificationHub::new();
        let (sub, mut rx) = collector(&hub);

        hub.publish(event(EventKind::Started, 0));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Started);

        assert!(hub.unsubscribe(&sub));
        assert!(!sub.is_active());
        hub.publish(event(EventKind::Paused, 0));

        // The delivery task exits and drops the handler, closing the channel.
        assert!(rx.recv().await.is_none());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_twice_is_harmless() {
        let hub = NotificationHub::new();
        let (sub, _rx) = collector(&hub);
        assert!(hub.unsubscribe(&sub));
        assert!(!hub.unsubscribe(&sub));
    }
}

//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! The monitor submits [`NotificationRequest`]s here; the dispatcher (and any
//! other subscriber) receives every one of them. Publishing never blocks.

use hostwatch_core::notification::{NotificationRequest, NotificationSink};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus for notification requests.
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationRequest>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed requests are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a request to all current subscribers.
    pub fn publish(&self, request: NotificationRequest) {
        if self.sender.send(request).is_err() {
            tracing::debug!("Notification published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRequest> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for NotificationBus {
    fn submit(&self, request: NotificationRequest) {
        self.publish(request);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_the_request() {
        let bus = NotificationBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.submit(NotificationRequest::test("ops@x.io", Utc::now()));

        let a = rx1.recv().await.expect("subscriber 1 should receive");
        let b = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(a.id, b.id);
        assert_eq!(a.recipients, vec!["ops@x.io"]);
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = NotificationBus::default();
        bus.publish(NotificationRequest::test("ops@x.io", Utc::now()));
    }
}

//! Notification queue
//!
//! Bounded FIFO between the listener and the updater. Enqueueing waits while
//! the queue is full, which holds the webhook request open until the updater
//! catches up.

use chrono::{DateTime, Utc};
use redeployer_core::domain::notification::BuildNotification;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Number of notifications that can wait for the updater
pub const QUEUE_CAPACITY: usize = 5;

/// A notification waiting to be processed
#[derive(Debug, Clone)]
pub struct QueuedNotification {
    /// Correlates listener and updater log lines
    pub delivery_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub notification: BuildNotification,
}

impl QueuedNotification {
    pub fn new(notification: BuildNotification) -> Self {
        Self {
            delivery_id: Uuid::new_v4(),
            received_at: Utc::now(),
            notification,
        }
    }
}

#[derive(Debug, Error)]
#[error("notification queue is closed")]
pub struct QueueClosed(pub Box<QueuedNotification>);

/// Producer half, cloned into every request handler
#[derive(Debug, Clone)]
pub struct NotificationSender {
    inner: mpsc::Sender<QueuedNotification>,
}

/// Consumer half, owned by the updater
#[derive(Debug)]
pub struct NotificationReceiver {
    inner: mpsc::Receiver<QueuedNotification>,
}

/// Creates the queue with `QUEUE_CAPACITY` slots
pub fn notification_queue() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (
        NotificationSender { inner: tx },
        NotificationReceiver { inner: rx },
    )
}

impl NotificationSender {
    /// Pushes a notification, waiting for a free slot if necessary
    ///
    /// Fails only when the updater has gone away.
    pub async fn enqueue(&self, item: QueuedNotification) -> Result<(), QueueClosed> {
        self.inner
            .send(item)
            .await
            .map_err(|mpsc::error::SendError(item)| QueueClosed(Box::new(item)))
    }

    /// Free slots right now
    pub fn available(&self) -> usize {
        self.inner.capacity()
    }
}

impl NotificationReceiver {
    /// Next notification in arrival order, `None` once every sender is dropped
    pub async fn next(&mut self) -> Option<QueuedNotification> {
        self.inner.recv().await
    }

    /// Stops accepting new notifications; already queued ones stay readable
    pub fn close(&mut self) {
        self.inner.close();
    }
}

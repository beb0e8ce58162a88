//! Notification requests handed to the delivery side.
//!
//! The engine only produces [`NotificationRequest`]s. Submitting one through
//! a [`NotificationSink`] never blocks and cannot fail from the caller's
//! point of view; delivery, retries and transport errors belong to whoever
//! consumes the sink.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::AlertType;
use crate::types::{DbId, Timestamp};

/// Why a notification is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// `NORMAL -> BREACHED`.
    Breach,
    /// `BREACHED -> NORMAL`.
    Recovery,
    /// Diagnostics message, not tied to any rule.
    Test,
}

/// A single request for the dispatcher: one message, many recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub host_id: String,
    pub group_name: Option<String>,
    pub alert_type: Option<AlertType>,
    /// Observed percentage; absent for offline and test notifications.
    pub value: Option<f64>,
    /// Threshold that was crossed; absent for offline and test notifications.
    pub threshold: Option<f64>,
    /// Sorted and deduplicated.
    pub recipients: Vec<String>,
    /// Ids of the rules whose emails contributed to `recipients`.
    pub matched_rules: Vec<DbId>,
    pub occurred_at: Timestamp,
}

impl NotificationRequest {
    /// A diagnostics request addressed to a single recipient.
    pub fn test(email: impl Into<String>, occurred_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NotificationKind::Test,
            host_id: String::new(),
            group_name: None,
            alert_type: None,
            value: None,
            threshold: None,
            recipients: vec![email.into()],
            matched_rules: Vec::new(),
            occurred_at,
        }
    }
}

/// Fire-and-forget destination for notification requests.
pub trait NotificationSink: Send + Sync {
    fn submit(&self, request: NotificationRequest);
}

/// Sink that keeps every request in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    requests: std::sync::Mutex<Vec<NotificationRequest>>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn take(&self) -> Vec<NotificationRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn submit(&self, request: NotificationRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

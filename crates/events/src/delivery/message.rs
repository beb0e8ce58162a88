//! Plain-text rendering of notification requests.

use hostwatch_core::alert::AlertType;
use hostwatch_core::notification::{NotificationKind, NotificationRequest};

/// Subject prefix for every outgoing message.
const SUBJECT_PREFIX: &str = "[Hostwatch]";

/// A message ready for a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Human label for a request, e.g. `"CPU usage high"`.
pub fn label(request: &NotificationRequest) -> String {
    let Some(alert_type) = request.alert_type else {
        return "Test notification".to_string();
    };
    let resource = match alert_type {
        AlertType::Cpu => "CPU usage",
        AlertType::Memory => "Memory usage",
        AlertType::Disk => "Disk usage",
        AlertType::Offline => "Server",
    };
    match (request.kind, alert_type) {
        (NotificationKind::Test, _) => "Test notification".to_string(),
        (NotificationKind::Breach, AlertType::Offline) => format!("{resource} offline"),
        (NotificationKind::Recovery, AlertType::Offline) => format!("{resource} back online"),
        (NotificationKind::Breach, _) => format!("{resource} high"),
        (NotificationKind::Recovery, _) => format!("{resource} recovered"),
    }
}

pub fn render(request: &NotificationRequest) -> RenderedMessage {
    if request.kind == NotificationKind::Test {
        return RenderedMessage {
            subject: format!("{SUBJECT_PREFIX} Test notification"),
            body: format!(
                "This is a test notification sent at {}.\n\
                 If you received it, alert delivery is working.",
                request.occurred_at.to_rfc3339()
            ),
        };
    }

    let label = label(request);
    let mut body = format!("{label}\n\nServer: {}\n", request.host_id);
    if let Some(group) = &request.group_name {
        body.push_str(&format!("Group: {group}\n"));
    }
    if let Some(value) = request.value {
        body.push_str(&format!("Current value: {value:.1}%\n"));
    }
    if let Some(threshold) = request.threshold {
        body.push_str(&format!("Threshold: {threshold:.1}%\n"));
    }
    body.push_str(&format!("Time: {}\n", request.occurred_at.to_rfc3339()));

    RenderedMessage {
        subject: format!("{SUBJECT_PREFIX} {label}: {}", request.host_id),
        body,
    }
}

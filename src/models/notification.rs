use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Medication,
    Appointment,
    Refill,
}

/// A row on the notifications screen. Derived from the collection
/// mirrors on demand, never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub time: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
}

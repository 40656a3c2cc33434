use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "Scheduled")]
    Scheduled,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
    // Defined for parity with the stored schema; nothing assigns it yet.
    #[serde(rename = "Missed")]
    Missed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Appointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "doctorName")]
    pub doctor_name: String,
    pub hospital: String,
    pub specialty: String,
    #[serde(rename = "forWhom")]
    pub for_whom: String,
    pub date: DateTime<Local>,
    pub time: DateTime<Local>,
    pub notes: Option<String>,
    #[serde(rename = "remindersEnabled")]
    pub reminders_enabled: bool,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Local>,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_defaults_to_scheduled_when_absent() {
        let value = serde_json::json!({
            "doctorName": "Silva",
            "hospital": "General",
            "specialty": "Cardiology",
            "forWhom": "Myself",
            "date": Local.with_ymd_and_hms(2026, 5, 2, 9, 30, 0).unwrap(),
            "time": Local.with_ymd_and_hms(2026, 5, 2, 9, 30, 0).unwrap(),
            "notes": null,
            "remindersEnabled": true,
            "userId": "user123",
            "createdAt": Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        });
        let appointment: Appointment = serde_json::from_value(value).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn status_round_trips_display_strings() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Cancelled).unwrap(),
            "\"Cancelled\""
        );
        let missed: AppointmentStatus = serde_json::from_str("\"Missed\"").unwrap();
        assert_eq!(missed, AppointmentStatus::Missed);
    }
}

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicationFrequency {
    #[serde(rename = "Once daily")]
    OnceDaily,
    #[serde(rename = "Twice daily")]
    TwiceDaily,
    #[serde(rename = "Three times daily")]
    ThreeTimesDaily,
    #[serde(rename = "Four times daily")]
    FourTimesDaily,
}

impl MedicationFrequency {
    pub fn times_per_day(&self) -> usize {
        match self {
            MedicationFrequency::OnceDaily => 1,
            MedicationFrequency::TwiceDaily => 2,
            MedicationFrequency::ThreeTimesDaily => 3,
            MedicationFrequency::FourTimesDaily => 4,
        }
    }

    /// Hours between consecutive doses on the same day, evenly spaced
    /// across 24 hours from the first anchor time.
    pub fn hour_step(&self) -> i64 {
        match self {
            MedicationFrequency::OnceDaily => 0,
            MedicationFrequency::TwiceDaily => 12,
            MedicationFrequency::ThreeTimesDaily => 8,
            MedicationFrequency::FourTimesDaily => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicationDuration {
    #[serde(rename = "7 days")]
    SevenDays,
    #[serde(rename = "14 days")]
    FourteenDays,
    #[serde(rename = "30 days")]
    ThirtyDays,
    #[serde(rename = "90 days")]
    NinetyDays,
    #[serde(rename = "Ongoing")]
    Ongoing,
}

impl MedicationDuration {
    /// Number of scheduled days, or None for the ongoing case which is
    /// capped at a 3-month window by the schedule generator.
    pub fn days(&self) -> Option<i64> {
        match self {
            MedicationDuration::SevenDays => Some(7),
            MedicationDuration::FourteenDays => Some(14),
            MedicationDuration::ThirtyDays => Some(30),
            MedicationDuration::NinetyDays => Some(90),
            MedicationDuration::Ongoing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicationStatus {
    #[serde(rename = "Taken")]
    Taken,
    // Defined for parity with the stored schema; nothing assigns it yet.
    #[serde(rename = "Missed")]
    Missed,
    #[serde(rename = "Scheduled")]
    Scheduled,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Medication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub dosage: String,
    pub frequency: MedicationFrequency,
    pub duration: MedicationDuration,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Local>,
    pub times: Vec<DateTime<Local>>,
    #[serde(rename = "remindersEnabled")]
    pub reminders_enabled: bool,
    #[serde(rename = "refillTracking")]
    pub refill_tracking: bool,
    pub notes: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "currentSupply")]
    pub current_supply: Option<i32>,
    #[serde(rename = "totalSupply")]
    pub total_supply: Option<i32>,
}

impl Medication {
    /// Remaining-supply ratio, 0.0 when supply tracking is absent or the
    /// total is zero.
    pub fn progress(&self) -> f64 {
        match (self.current_supply, self.total_supply) {
            (Some(current), Some(total)) if total > 0 => f64::from(current) / f64::from(total),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MedicationLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "medicationId")]
    pub medication_id: String,
    // Name and dosage are snapshots taken when the log is generated, so
    // history stays accurate if the medication is later renamed.
    #[serde(rename = "medicationName")]
    pub medication_name: String,
    pub dosage: String,
    #[serde(rename = "timeScheduled")]
    pub time_scheduled: DateTime<Local>,
    #[serde(rename = "timeTaken")]
    pub time_taken: Option<DateTime<Local>>,
    pub status: MedicationStatus,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn medication(current: Option<i32>, total: Option<i32>) -> Medication {
        Medication {
            id: Some("med-1".to_string()),
            name: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            frequency: MedicationFrequency::OnceDaily,
            duration: MedicationDuration::SevenDays,
            start_date: Local.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            times: vec![],
            reminders_enabled: false,
            refill_tracking: current.is_some(),
            notes: None,
            user_id: "user123".to_string(),
            current_supply: current,
            total_supply: total,
        }
    }

    #[test]
    fn progress_is_supply_ratio() {
        assert!((medication(Some(5), Some(10)).progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_without_supply_is_zero() {
        assert_eq!(medication(None, None).progress(), 0.0);
        assert_eq!(medication(Some(5), None).progress(), 0.0);
    }

    #[test]
    fn progress_with_zero_total_is_zero() {
        assert_eq!(medication(Some(5), Some(0)).progress(), 0.0);
    }

    #[test]
    fn frequency_serializes_display_strings() {
        let json = serde_json::to_string(&MedicationFrequency::TwiceDaily).unwrap();
        assert_eq!(json, "\"Twice daily\"");
        let back: MedicationFrequency = serde_json::from_str("\"Four times daily\"").unwrap();
        assert_eq!(back, MedicationFrequency::FourTimesDaily);
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let value = serde_json::to_value(medication(Some(2), Some(30))).unwrap();
        assert!(value.get("startDate").is_some());
        assert!(value.get("remindersEnabled").is_some());
        assert!(value.get("currentSupply").is_some());
        assert_eq!(value["userId"], "user123");
    }
}

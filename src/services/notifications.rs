use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use tauri::AppHandle;
use tauri_plugin_notification::{NotificationExt, Schedule, ScheduleInterval};
use uuid::Uuid;

use crate::models::{Appointment, Medication};

// Identifier grammar: <kind>_<entityId>[_<hour>_<minute>]. These strings
// are the only handle for later cancellation.

pub fn medication_identifier(medication_id: &str, hour: u32, minute: u32) -> String {
    format!("medication_{}_{}_{}", medication_id, hour, minute)
}

pub fn appointment_reminder_identifier(appointment_id: &str) -> String {
    format!("appointment_5hours_{}", appointment_id)
}

pub fn appointment_at_time_identifier(appointment_id: &str) -> String {
    format!("appointment_at_time_{}", appointment_id)
}

pub fn appointment_completed_identifier(appointment_id: &str) -> String {
    format!("appointment_completed_{}", appointment_id)
}

pub fn appointment_cancelled_identifier(appointment_id: &str) -> String {
    format!("appointment_cancelled_{}", appointment_id)
}

pub fn refill_identifier(medication_id: &str) -> String {
    format!("refill_{}", medication_id)
}

/// Capability handle for the local notification scheduler. Scheduling
/// is fire-and-forget: failures are logged, never surfaced or retried,
/// and arming is not transactional with any store write.
pub trait Notifier: Send + Sync {
    /// Arms one repeating daily reminder matching the dose time's
    /// hour/minute, not one notification per future instant.
    fn schedule_medication_reminder(&self, medication: &Medication, time: DateTime<Local>);
    fn schedule_appointment_reminder(&self, appointment: &Appointment);
    fn schedule_appointment_at_time(&self, appointment: &Appointment);
    fn schedule_appointment_completed(&self, appointment: &Appointment);
    fn schedule_appointment_cancelled(&self, appointment: &Appointment);
    fn schedule_refill_reminder(&self, medication: &Medication);
    /// Cancels every pending reminder whose identifier starts with
    /// `medication_<medicationId>`.
    fn cancel_medication_notifications(&self, medication_id: &str);
    /// Cancels the pending 5-hours-before and at-time reminders.
    fn cancel_appointment_notifications(&self, appointment_id: &str);
    fn clear_all(&self);
    fn pending_identifiers(&self) -> Vec<String>;
}

/// Maps a string identifier onto the plugin's numeric id space (FNV-1a,
/// truncated to the positive range) so cancellation can re-derive it.
fn notification_id(identifier: &str) -> i32 {
    let mut hash: u32 = 2166136261;
    for byte in identifier.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16777619);
    }
    (hash & 0x7fff_ffff) as i32
}

/// Production notifier backed by the Tauri notification plugin.
pub struct TauriNotifier {
    app: AppHandle,
    pending: Mutex<HashSet<String>>,
}

impl TauriNotifier {
    pub fn new(app: AppHandle) -> Self {
        TauriNotifier {
            app,
            pending: Mutex::new(HashSet::new()),
        }
    }

    fn show(&self, identifier: &str, title: &str, body: &str, schedule: Schedule) {
        let result = self
            .app
            .notification()
            .builder()
            .id(notification_id(identifier))
            .title(title)
            .body(body)
            .schedule(schedule)
            .show();

        if let Err(e) = result {
            log::error!("Error scheduling notification {}: {}", identifier, e);
            return;
        }

        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(identifier.to_string());
        }
    }

    fn cancel(&self, identifiers: Vec<String>) {
        if identifiers.is_empty() {
            return;
        }

        let ids: Vec<i32> = identifiers.iter().map(|id| notification_id(id)).collect();
        if let Err(e) = self.app.notification().cancel(ids) {
            log::error!("Error cancelling notifications: {}", e);
        }

        if let Ok(mut pending) = self.pending.lock() {
            for identifier in &identifiers {
                pending.remove(identifier);
            }
        }
    }

    fn one_shot(date: DateTime<Local>) -> Schedule {
        Schedule::At {
            date: date.with_timezone(&Utc).into(),
            repeating: false,
            allow_while_idle: false,
        }
    }
}

impl Notifier for TauriNotifier {
    fn schedule_medication_reminder(&self, medication: &Medication, time: DateTime<Local>) {
        let medication_id = medication
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let identifier = medication_identifier(&medication_id, time.hour(), time.minute());

        let schedule = Schedule::Interval {
            interval: ScheduleInterval {
                hour: Some(time.hour() as u8),
                minute: Some(time.minute() as u8),
                ..Default::default()
            },
            allow_while_idle: false,
        };

        self.show(
            &identifier,
            "Medication Reminder",
            &format!("Time to take {} {}", medication.name, medication.dosage),
            schedule,
        );
    }

    fn schedule_appointment_reminder(&self, appointment: &Appointment) {
        let appointment_id = appointment
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let reminder_date = appointment.date - Duration::hours(5);

        self.show(
            &appointment_reminder_identifier(&appointment_id),
            "Appointment Reminder",
            &format!(
                "You have an appointment with Dr. {} at {}",
                appointment.doctor_name, appointment.hospital
            ),
            Self::one_shot(reminder_date),
        );
    }

    fn schedule_appointment_at_time(&self, appointment: &Appointment) {
        let appointment_id = appointment
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.show(
            &appointment_at_time_identifier(&appointment_id),
            "Doctor Appointment Reminder",
            &format!(
                "You have an appointment with Dr. {} at {}",
                appointment.doctor_name, appointment.hospital
            ),
            Self::one_shot(appointment.date),
        );
    }

    fn schedule_appointment_completed(&self, appointment: &Appointment) {
        let appointment_id = appointment
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.show(
            &appointment_completed_identifier(&appointment_id),
            "Appointment Completed",
            &format!(
                "Your appointment with {} at {} has been marked as completed.",
                appointment.doctor_name, appointment.hospital
            ),
            Self::one_shot(Local::now() + Duration::seconds(1)),
        );
    }

    fn schedule_appointment_cancelled(&self, appointment: &Appointment) {
        let appointment_id = appointment
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.show(
            &appointment_cancelled_identifier(&appointment_id),
            "Appointment Cancelled",
            &format!(
                "Your appointment with {} at {} has been cancelled.",
                appointment.doctor_name, appointment.hospital
            ),
            Self::one_shot(Local::now() + Duration::seconds(1)),
        );
    }

    fn schedule_refill_reminder(&self, medication: &Medication) {
        let medication_id = medication
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.show(
            &refill_identifier(&medication_id),
            "Medication Refill Reminder",
            &format!(
                "Your supply of {} is running low. Time to refill!",
                medication.name
            ),
            Self::one_shot(Local::now() + Duration::seconds(1)),
        );
    }

    fn cancel_medication_notifications(&self, medication_id: &str) {
        let prefix = format!("medication_{}", medication_id);
        let matching: Vec<String> = match self.pending.lock() {
            Ok(pending) => pending
                .iter()
                .filter(|identifier| identifier.starts_with(&prefix))
                .cloned()
                .collect(),
            Err(e) => {
                log::error!("Failed to lock pending notifications: {}", e);
                return;
            }
        };
        self.cancel(matching);
    }

    fn cancel_appointment_notifications(&self, appointment_id: &str) {
        self.cancel(vec![
            appointment_reminder_identifier(appointment_id),
            appointment_at_time_identifier(appointment_id),
        ]);
    }

    fn clear_all(&self) {
        if let Err(e) = self.app.notification().cancel_all() {
            log::error!("Error clearing notifications: {}", e);
        }
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }

    fn pending_identifiers(&self) -> Vec<String> {
        match self.pending.lock() {
            Ok(pending) => pending.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_follow_the_cancellation_grammar() {
        assert_eq!(medication_identifier("abc", 8, 30), "medication_abc_8_30");
        assert_eq!(appointment_reminder_identifier("x1"), "appointment_5hours_x1");
        assert_eq!(appointment_at_time_identifier("x1"), "appointment_at_time_x1");
        assert_eq!(refill_identifier("m9"), "refill_m9");
    }

    #[test]
    fn notification_ids_are_stable_and_positive() {
        let a = notification_id("medication_abc_8_30");
        let b = notification_id("medication_abc_8_30");
        let c = notification_id("medication_abc_20_30");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a >= 0);
    }
}

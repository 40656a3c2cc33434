use chrono::{DateTime, Duration, Local};
use serde::Serialize;

use crate::models::{
    Appointment, AppointmentStatus, Medication, MedicationLog, MedicationStatus, NotificationItem,
    NotificationType,
};

fn same_day(a: DateTime<Local>, b: DateTime<Local>) -> bool {
    a.date_naive() == b.date_naive()
}

/// All log entries scheduled on the given local calendar day, ascending.
pub fn logs_for_date(logs: &[MedicationLog], date: DateTime<Local>) -> Vec<MedicationLog> {
    let mut day_logs: Vec<MedicationLog> = logs
        .iter()
        .filter(|log| same_day(log.time_scheduled, date))
        .cloned()
        .collect();
    day_logs.sort_by_key(|log| log.time_scheduled);
    day_logs
}

/// Appointments whose time falls within [startOfDay, startOfDay + 1d),
/// ascending by time.
pub fn appointments_for_date(
    appointments: &[Appointment],
    date: DateTime<Local>,
) -> Vec<Appointment> {
    let Some(start_of_day) = date
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
    else {
        return Vec::new();
    };
    let end_of_day = start_of_day + Duration::days(1);

    let mut day_appointments: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.time >= start_of_day && a.time < end_of_day)
        .cloned()
        .collect();
    day_appointments.sort_by_key(|a| a.time);
    day_appointments
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryGroup {
    pub title: String,
    pub logs: Vec<MedicationLog>,
}

/// Partitions logs into Today / Yesterday / formatted-date buckets.
/// Today comes first, Yesterday second, every other bucket in
/// descending date order; entries within a bucket are newest-first.
pub fn grouped_history(logs: &[MedicationLog], now: DateTime<Local>) -> Vec<HistoryGroup> {
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);

    let mut days: Vec<chrono::NaiveDate> = logs
        .iter()
        .map(|log| log.time_scheduled.date_naive())
        .collect();
    days.sort();
    days.dedup();
    days.reverse();

    let mut groups = Vec::new();
    let mut push_group = |day: chrono::NaiveDate| {
        let title = if day == today {
            "Today".to_string()
        } else if day == yesterday {
            "Yesterday".to_string()
        } else {
            day.format("%B %-d, %Y").to_string()
        };
        let mut bucket: Vec<MedicationLog> = logs
            .iter()
            .filter(|log| log.time_scheduled.date_naive() == day)
            .cloned()
            .collect();
        bucket.sort_by(|a, b| b.time_scheduled.cmp(&a.time_scheduled));
        groups.push(HistoryGroup { title, logs: bucket });
    };

    if days.contains(&today) {
        push_group(today);
    }
    if days.contains(&yesterday) {
        push_group(yesterday);
    }
    for day in days {
        if day != today && day != yesterday {
            push_group(day);
        }
    }
    groups
}

/// Fraction of today's scheduled doses already taken; 0.0 when nothing
/// is scheduled today.
pub fn daily_progress(logs: &[MedicationLog], now: DateTime<Local>) -> f64 {
    let today_total = logs
        .iter()
        .filter(|log| same_day(log.time_scheduled, now))
        .count();
    if today_total == 0 {
        return 0.0;
    }

    let taken = logs
        .iter()
        .filter(|log| log.status == MedicationStatus::Taken && same_day(log.time_scheduled, now))
        .count();
    taken as f64 / today_total as f64
}

/// True when 20% or less of the tracked supply remains. Medications
/// without both supply counts, or with a zero total, are never low.
pub fn is_low_supply(medication: &Medication) -> bool {
    match (medication.current_supply, medication.total_supply) {
        (Some(current), Some(total)) if total > 0 => {
            f64::from(current) / f64::from(total) <= 0.2
        }
        _ => false,
    }
}

/// Bell-icon badge: future doses still due today, plus today's
/// appointments, plus low-supply medications. A plain sum, so one
/// medication can count twice.
pub fn notification_badge_count(
    logs: &[MedicationLog],
    appointments: &[Appointment],
    medications: &[Medication],
    now: DateTime<Local>,
) -> usize {
    let future_today_logs = logs
        .iter()
        .filter(|log| same_day(log.time_scheduled, now) && log.time_scheduled > now)
        .count();
    let today_appointments = appointments
        .iter()
        .filter(|a| same_day(a.date, now))
        .count();
    let low_supply = medications.iter().filter(|m| is_low_supply(m)).count();

    future_today_logs + today_appointments + low_supply
}

/// The notification screen's rows, newest first.
pub fn notification_items(
    logs: &[MedicationLog],
    appointments: &[Appointment],
    medications: &[Medication],
    now: DateTime<Local>,
) -> Vec<NotificationItem> {
    let mut today_logs: Vec<&MedicationLog> = logs
        .iter()
        .filter(|log| same_day(log.time_scheduled, now))
        .collect();
    today_logs.sort_by_key(|log| log.time_scheduled);

    let mut items = Vec::new();
    for (index, log) in today_logs.iter().enumerate() {
        if log.time_scheduled > now {
            items.push(NotificationItem {
                id: format!("med_{}", index),
                title: "Medication Reminder".to_string(),
                message: format!("Time to take {} {}", log.medication_name, log.dosage),
                time: log.time_scheduled,
                kind: NotificationType::Medication,
            });
        }
    }

    for appointment in appointments.iter().filter(|a| same_day(a.date, now)) {
        items.push(NotificationItem {
            id: format!("appointment_{}", appointment.id.clone().unwrap_or_default()),
            title: "Appointment Reminder".to_string(),
            message: format!("{} at {}", appointment.doctor_name, appointment.hospital),
            time: appointment.date,
            kind: NotificationType::Appointment,
        });
    }

    for medication in medications.iter().filter(|m| is_low_supply(m)) {
        items.push(NotificationItem {
            id: format!("refill_{}", medication.id.clone().unwrap_or_default()),
            title: "Refill Reminder".to_string(),
            message: format!(
                "Your supply of {} is running low. Time to refill!",
                medication.name
            ),
            time: now - Duration::hours(1),
            kind: NotificationType::Refill,
        });
    }

    items.sort_by(|a, b| b.time.cmp(&a.time));
    items
}

/// Medications with at least one dose scheduled today.
pub fn today_medications(
    medications: &[Medication],
    logs: &[MedicationLog],
    now: DateTime<Local>,
) -> Vec<Medication> {
    let today_ids: std::collections::HashSet<&str> = logs
        .iter()
        .filter(|log| same_day(log.time_scheduled, now))
        .map(|log| log.medication_id.as_str())
        .collect();

    medications
        .iter()
        .filter(|m| m.id.as_deref().is_some_and(|id| today_ids.contains(id)))
        .cloned()
        .collect()
}

pub fn upcoming_appointments(appointments: &[Appointment], now: DateTime<Local>) -> Vec<Appointment> {
    let mut upcoming: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.date >= now)
        .cloned()
        .collect();
    upcoming.sort_by_key(|a| a.date);
    upcoming
}

pub fn completed_appointments(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut completed: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .cloned()
        .collect();
    completed.sort_by(|a, b| b.date.cmp(&a.date));
    completed
}

pub fn cancelled_appointments(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut cancelled: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Cancelled)
        .cloned()
        .collect();
    cancelled.sort_by(|a, b| b.date.cmp(&a.date));
    cancelled
}

/// Appointments whose status is Missed and whose date has passed.
/// Nothing currently sets that status, so this stays empty until a
/// sweep that compares scheduled time to now exists.
pub fn missed_appointments(appointments: &[Appointment], now: DateTime<Local>) -> Vec<Appointment> {
    let mut missed: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Missed && a.date < now)
        .cloned()
        .collect();
    missed.sort_by(|a, b| b.date.cmp(&a.date));
    missed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicationDuration, MedicationFrequency};
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn log(id: &str, scheduled: DateTime<Local>, status: MedicationStatus) -> MedicationLog {
        MedicationLog {
            id: Some(id.to_string()),
            medication_id: "med-1".to_string(),
            medication_name: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            time_scheduled: scheduled,
            time_taken: None,
            status,
            user_id: "user123".to_string(),
            created_at: scheduled,
        }
    }

    fn medication(id: &str, current: Option<i32>, total: Option<i32>) -> Medication {
        Medication {
            id: Some(id.to_string()),
            name: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            frequency: MedicationFrequency::OnceDaily,
            duration: MedicationDuration::SevenDays,
            start_date: local(2026, 3, 1, 8, 0),
            times: vec![],
            reminders_enabled: false,
            refill_tracking: current.is_some(),
            notes: None,
            user_id: "user123".to_string(),
            current_supply: current,
            total_supply: total,
        }
    }

    fn appointment(id: &str, date: DateTime<Local>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Some(id.to_string()),
            doctor_name: "Silva".to_string(),
            hospital: "General".to_string(),
            specialty: "Cardiology".to_string(),
            for_whom: "Myself".to_string(),
            date,
            time: date,
            notes: None,
            reminders_enabled: false,
            user_id: "user123".to_string(),
            status,
            created_at: date,
        }
    }

    #[test]
    fn daily_progress_is_zero_with_no_logs_today() {
        let now = local(2026, 3, 10, 12, 0);
        let logs = vec![
            log("a", local(2026, 3, 8, 9, 0), MedicationStatus::Taken),
            log("b", local(2026, 3, 9, 9, 0), MedicationStatus::Taken),
        ];
        assert_eq!(daily_progress(&logs, now), 0.0);
    }

    #[test]
    fn daily_progress_counts_only_today() {
        let now = local(2026, 3, 10, 12, 0);
        let logs = vec![
            log("a", local(2026, 3, 10, 8, 0), MedicationStatus::Taken),
            log("b", local(2026, 3, 10, 20, 0), MedicationStatus::Scheduled),
            log("c", local(2026, 3, 9, 8, 0), MedicationStatus::Taken),
        ];
        assert!((daily_progress(&logs, now) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn low_supply_boundary_is_inclusive() {
        assert!(is_low_supply(&medication("m", Some(2), Some(10))));
        assert!(!is_low_supply(&medication("m", Some(3), Some(10))));
    }

    #[test]
    fn zero_total_supply_is_not_low() {
        assert!(!is_low_supply(&medication("m", Some(0), Some(0))));
        assert!(!is_low_supply(&medication("m", None, Some(10))));
    }

    #[test]
    fn grouped_history_puts_today_first() {
        let now = local(2026, 3, 10, 23, 0);
        let logs = vec![
            log("old", local(2026, 3, 1, 9, 0), MedicationStatus::Taken),
            log("today-early", local(2026, 3, 10, 0, 30), MedicationStatus::Scheduled),
            log("yesterday", local(2026, 3, 9, 9, 0), MedicationStatus::Taken),
        ];
        let groups = grouped_history(&logs, now);
        let titles: Vec<&str> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Today", "Yesterday", "March 1, 2026"]);
        assert_eq!(groups[0].logs[0].id.as_deref(), Some("today-early"));
    }

    #[test]
    fn grouped_history_orders_remaining_buckets_descending() {
        let now = local(2026, 3, 10, 12, 0);
        let logs = vec![
            log("a", local(2026, 3, 1, 9, 0), MedicationStatus::Taken),
            log("b", local(2026, 3, 5, 9, 0), MedicationStatus::Taken),
            log("c", local(2026, 3, 12, 9, 0), MedicationStatus::Scheduled),
        ];
        let titles: Vec<String> = grouped_history(&logs, now)
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["March 12, 2026", "March 5, 2026", "March 1, 2026"]);
    }

    #[test]
    fn badge_count_sums_without_dedup() {
        let now = local(2026, 3, 10, 12, 0);
        let logs = vec![
            log("future", local(2026, 3, 10, 20, 0), MedicationStatus::Scheduled),
            log("past", local(2026, 3, 10, 8, 0), MedicationStatus::Taken),
        ];
        let appointments = vec![appointment("a", local(2026, 3, 10, 15, 0), AppointmentStatus::Scheduled)];
        let medications = vec![medication("m", Some(1), Some(10))];

        assert_eq!(
            notification_badge_count(&logs, &appointments, &medications, now),
            3
        );
    }

    #[test]
    fn notification_items_skip_past_doses_and_sort_descending() {
        let now = local(2026, 3, 10, 12, 0);
        let logs = vec![
            log("past", local(2026, 3, 10, 8, 0), MedicationStatus::Taken),
            log("future", local(2026, 3, 10, 20, 0), MedicationStatus::Scheduled),
        ];
        let appointments = vec![appointment("a", local(2026, 3, 10, 15, 0), AppointmentStatus::Scheduled)];
        let items = notification_items(&logs, &appointments, &[], now);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, NotificationType::Medication);
        assert_eq!(items[1].kind, NotificationType::Appointment);
    }

    #[test]
    fn appointments_for_date_is_half_open_and_ascending() {
        let day = local(2026, 3, 10, 0, 0);
        let appointments = vec![
            appointment("late", local(2026, 3, 10, 23, 59), AppointmentStatus::Scheduled),
            appointment("early", local(2026, 3, 10, 0, 0), AppointmentStatus::Scheduled),
            appointment("next-day", local(2026, 3, 11, 0, 0), AppointmentStatus::Scheduled),
        ];
        let day_appointments = appointments_for_date(&appointments, day);
        let ids: Vec<&str> = day_appointments
            .iter()
            .filter_map(|a| a.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn upcoming_excludes_past_and_non_scheduled() {
        let now = local(2026, 3, 10, 12, 0);
        let appointments = vec![
            appointment("past", local(2026, 3, 9, 9, 0), AppointmentStatus::Scheduled),
            appointment("done", local(2026, 3, 12, 9, 0), AppointmentStatus::Completed),
            appointment("soon", local(2026, 3, 11, 9, 0), AppointmentStatus::Scheduled),
        ];
        let upcoming = upcoming_appointments(&appointments, now);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id.as_deref(), Some("soon"));
    }

    #[test]
    fn today_medications_are_unique_by_log_reference() {
        let now = local(2026, 3, 10, 12, 0);
        let mut second = log("b", local(2026, 3, 10, 20, 0), MedicationStatus::Scheduled);
        second.medication_id = "med-1".to_string();
        let logs = vec![
            log("a", local(2026, 3, 10, 8, 0), MedicationStatus::Scheduled),
            second,
        ];
        let medications = vec![medication("med-1", None, None), medication("med-2", None, None)];

        let today = today_medications(&medications, &logs, now);
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].id.as_deref(), Some("med-1"));
    }
}

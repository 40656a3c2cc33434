use chrono::{DateTime, Duration, Local, Months, NaiveDate, Timelike};

use crate::models::{Medication, MedicationDuration, MedicationFrequency, MedicationLog, MedicationStatus};

pub mod aggregate;

/// Combines a calendar day with an hour/minute anchor in the local
/// timezone. Instants that do not exist locally (DST gaps) resolve to
/// the earliest valid time, or None when the day itself is unbuildable.
fn on_day(day: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    day.and_hms_opt(hour, minute, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
}

/// Expands the single user-supplied anchor time into the per-day dose
/// times for a frequency: the first dose at the anchor's hour/minute on
/// the start date, each following dose offset by the frequency's fixed
/// step so doses spread evenly across the day.
pub fn dose_times(
    frequency: MedicationFrequency,
    start_date: DateTime<Local>,
    anchor: DateTime<Local>,
) -> Vec<DateTime<Local>> {
    let Some(first) = on_day(start_date.date_naive(), anchor.hour(), anchor.minute()) else {
        return Vec::new();
    };

    (0..frequency.times_per_day())
        .map(|i| first + Duration::hours(frequency.hour_step() * i as i64))
        .collect()
}

/// Produces every scheduled dose instant for a medication: one instant
/// per day per dose time, from the start date through the duration
/// window, dropping instants already in the past at generation time.
///
/// Ongoing medications are scheduled 3 months ahead. Nothing extends
/// that window later; re-invocation is the only way to push it out.
pub fn generate_schedule(
    start_date: DateTime<Local>,
    times: &[DateTime<Local>],
    duration: MedicationDuration,
    now: DateTime<Local>,
) -> Vec<DateTime<Local>> {
    let end = match duration.days() {
        Some(days) => start_date + Duration::days(days),
        None => start_date
            .checked_add_months(Months::new(3))
            .unwrap_or(start_date),
    };

    let end_day = end.date_naive();
    let mut day = start_date.date_naive();
    let mut scheduled = Vec::new();

    while day < end_day {
        for time in times {
            let Some(instant) = on_day(day, time.hour(), time.minute()) else {
                continue;
            };
            // A medication started today gets no reminders for times
            // already past.
            if instant < now {
                continue;
            }
            scheduled.push(instant);
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }

    scheduled.sort();
    scheduled
}

/// One log record per retained instant, status Scheduled, carrying the
/// medication's name/dosage snapshot at generation time.
pub fn build_logs(
    medication: &Medication,
    medication_id: &str,
    now: DateTime<Local>,
) -> Vec<MedicationLog> {
    generate_schedule(medication.start_date, &medication.times, medication.duration, now)
        .into_iter()
        .map(|instant| MedicationLog {
            id: None,
            medication_id: medication_id.to_string(),
            medication_name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            time_scheduled: instant,
            time_taken: None,
            status: MedicationStatus::Scheduled,
            user_id: medication.user_id.clone(),
            created_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn twice_daily_times_are_twelve_hours_apart() {
        let times = dose_times(
            MedicationFrequency::TwiceDaily,
            local(2026, 3, 2, 0, 0),
            local(2026, 3, 1, 8, 30),
        );
        assert_eq!(times.len(), 2);
        assert_eq!(times[1] - times[0], Duration::hours(12));
        assert_eq!(times[0], local(2026, 3, 2, 8, 30));
    }

    #[test]
    fn four_times_daily_steps_six_hours() {
        let times = dose_times(
            MedicationFrequency::FourTimesDaily,
            local(2026, 3, 2, 0, 0),
            local(2026, 3, 2, 6, 0),
        );
        let hours: Vec<i64> = times
            .windows(2)
            .map(|w| (w[1] - w[0]).num_hours())
            .collect();
        assert_eq!(hours, vec![6, 6, 6]);
    }

    #[test]
    fn twice_daily_for_seven_days_yields_fourteen_instants() {
        let start = local(2026, 3, 2, 0, 0);
        let now = local(2026, 3, 1, 12, 0);
        let times = dose_times(MedicationFrequency::TwiceDaily, start, local(2026, 3, 1, 9, 0));
        let schedule = generate_schedule(start, &times, MedicationDuration::SevenDays, now);

        assert_eq!(schedule.len(), 14);
        for pair in schedule.chunks(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(12));
        }
    }

    #[test]
    fn past_instants_on_the_start_day_are_skipped() {
        let start = local(2026, 3, 2, 0, 0);
        // Generation happens mid-afternoon on the start day; the 09:00
        // dose is gone, the 21:00 dose survives.
        let now = local(2026, 3, 2, 15, 0);
        let times = dose_times(MedicationFrequency::TwiceDaily, start, local(2026, 3, 2, 9, 0));
        let schedule = generate_schedule(start, &times, MedicationDuration::SevenDays, now);

        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule[0], local(2026, 3, 2, 21, 0));
    }

    #[test]
    fn amoxicillin_started_before_its_first_dose_keeps_today() {
        // Once daily at 08:00 for 7 days, added today at 07:00: today's
        // 08:00 dose is still in the future, so 7 records come out.
        let start = local(2026, 4, 6, 7, 0);
        let now = local(2026, 4, 6, 7, 0);
        let times = dose_times(MedicationFrequency::OnceDaily, start, local(2026, 4, 6, 8, 0));
        let schedule = generate_schedule(start, &times, MedicationDuration::SevenDays, now);

        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule[0], local(2026, 4, 6, 8, 0));
        assert_eq!(schedule[6], local(2026, 4, 12, 8, 0));
    }

    #[test]
    fn ongoing_caps_at_three_months() {
        let start = local(2026, 1, 1, 0, 0);
        let now = local(2025, 12, 31, 0, 0);
        let times = dose_times(MedicationFrequency::OnceDaily, start, local(2026, 1, 1, 8, 0));
        let schedule = generate_schedule(start, &times, MedicationDuration::Ongoing, now);

        // Jan 1 through Mar 31 inclusive.
        assert_eq!(schedule.len(), 31 + 28 + 31);
        assert_eq!(schedule.last().unwrap(), &local(2026, 3, 31, 8, 0));
    }

    #[test]
    fn build_logs_snapshots_name_and_dosage() {
        let start = local(2026, 3, 2, 0, 0);
        let medication = Medication {
            id: None,
            name: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            frequency: MedicationFrequency::OnceDaily,
            duration: MedicationDuration::SevenDays,
            start_date: start,
            times: dose_times(MedicationFrequency::OnceDaily, start, local(2026, 3, 1, 8, 0)),
            reminders_enabled: true,
            refill_tracking: false,
            notes: None,
            user_id: "user123".to_string(),
            current_supply: None,
            total_supply: None,
        };

        let logs = build_logs(&medication, "med-42", local(2026, 3, 1, 0, 0));
        assert_eq!(logs.len(), 7);
        for log in &logs {
            assert_eq!(log.medication_id, "med-42");
            assert_eq!(log.medication_name, "Amoxicillin");
            assert_eq!(log.dosage, "500mg");
            assert_eq!(log.status, MedicationStatus::Scheduled);
            assert!(log.time_taken.is_none());
        }
    }
}

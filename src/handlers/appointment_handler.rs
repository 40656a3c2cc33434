use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::json;

use crate::models::{Appointment, AppointmentStatus};
use crate::schedule::aggregate;
use crate::services::notifications::Notifier;
use crate::services::store::{StoreClient, APPOINTMENTS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AppointmentInput {
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
}

pub(crate) async fn create_appointment(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    user_id: &str,
    input: AppointmentInput,
    now: DateTime<Local>,
) -> Result<Appointment, String> {
    if input.doctor_name.trim().is_empty() {
        return Err("Please enter a doctor name.".to_string());
    }
    if input.hospital.trim().is_empty() {
        return Err("Please enter a hospital.".to_string());
    }

    let mut appointment = Appointment {
        id: None,
        doctor_name: input.doctor_name,
        hospital: input.hospital,
        specialty: input.specialty,
        for_whom: input.for_whom,
        date: input.date,
        time: input.time,
        notes: input.notes.filter(|notes| !notes.is_empty()),
        reminders_enabled: input.reminders_enabled,
        user_id: user_id.to_string(),
        status: AppointmentStatus::Scheduled,
        created_at: now,
    };

    let document = serde_json::to_value(&appointment).map_err(|e| {
        log::error!("Failed to encode appointment: {}", e);
        e.to_string()
    })?;
    let id = store
        .add(APPOINTMENTS, document)
        .await
        .map_err(|e| format!("Error adding appointment: {}", e))?;
    appointment.id = Some(id);

    if appointment.reminders_enabled {
        notifier.schedule_appointment_reminder(&appointment);
        notifier.schedule_appointment_at_time(&appointment);
    }

    Ok(appointment)
}

pub(crate) async fn save_appointment(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    appointment: &Appointment,
) -> Result<(), String> {
    let id = appointment
        .id
        .clone()
        .ok_or_else(|| "Appointment ID is missing".to_string())?;

    let document = serde_json::to_value(appointment).map_err(|e| e.to_string())?;
    store
        .set(APPOINTMENTS, &id, document)
        .await
        .map_err(|e| format!("Error updating appointment: {}", e))?;

    notifier.cancel_appointment_notifications(&id);
    if appointment.reminders_enabled {
        notifier.schedule_appointment_reminder(appointment);
        notifier.schedule_appointment_at_time(appointment);
    }
    Ok(())
}

pub(crate) async fn remove_appointment(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    id: &str,
) -> Result<(), String> {
    store
        .delete(APPOINTMENTS, id)
        .await
        .map_err(|e| format!("Error deleting appointment: {}", e))?;

    notifier.cancel_appointment_notifications(id);
    Ok(())
}

/// Scheduled is the only non-terminal status: moving to Completed or
/// Cancelled drops the pending reminders and fires a one-shot
/// confirmation shortly after.
pub(crate) async fn set_appointment_status(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    id: &str,
    status: AppointmentStatus,
) -> Result<(), String> {
    store
        .update(APPOINTMENTS, id, json!({ "status": status }))
        .await
        .map_err(|e| format!("Error updating appointment status: {}", e))?;

    if status == AppointmentStatus::Completed || status == AppointmentStatus::Cancelled {
        notifier.cancel_appointment_notifications(id);

        match store.get(APPOINTMENTS, id).await {
            Ok(Some(document)) => {
                if let Ok(appointment) = serde_json::from_value::<Appointment>(document) {
                    match status {
                        AppointmentStatus::Completed => {
                            notifier.schedule_appointment_completed(&appointment)
                        }
                        AppointmentStatus::Cancelled => {
                            notifier.schedule_appointment_cancelled(&appointment)
                        }
                        _ => {}
                    }
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("Error fetching appointment {}: {}", id, e),
        }
    }

    Ok(())
}

#[tauri::command]
pub async fn fetch_appointments(state: tauri::State<'_, AppState>) -> Result<(), String> {
    log::info!("Subscribing to appointments");
    let user_id = state.current_user_id()?;

    state.appointment_listener.restart::<Appointment>(
        state.app_handle.clone(),
        Arc::clone(&state.store),
        APPOINTMENTS,
        user_id,
        Arc::clone(&state.appointments),
        Arc::clone(&state.last_error),
    );
    Ok(())
}

#[tauri::command]
pub async fn add_appointment(
    state: tauri::State<'_, AppState>,
    input: AppointmentInput,
) -> Result<Appointment, String> {
    log::info!("Adding appointment with Dr. {}", input.doctor_name);
    let user_id = state.current_user_id()?;
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    create_appointment(&store, &notifier, &user_id, input, Local::now()).await
}

#[tauri::command]
pub async fn update_appointment(
    state: tauri::State<'_, AppState>,
    appointment: Appointment,
) -> Result<(), String> {
    log::info!("Updating appointment: {:?}", appointment.id);
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    save_appointment(&store, &notifier, &appointment).await
}

#[tauri::command]
pub async fn delete_appointment(
    state: tauri::State<'_, AppState>,
    id: String,
) -> Result<(), String> {
    log::info!("Deleting appointment: {}", id);
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    remove_appointment(&store, &notifier, &id).await
}

#[tauri::command]
pub async fn update_appointment_status(
    state: tauri::State<'_, AppState>,
    id: String,
    status: AppointmentStatus,
) -> Result<(), String> {
    log::info!("Updating appointment {} status to {:?}", id, status);
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    set_appointment_status(&store, &notifier, &id, status).await
}

#[tauri::command]
pub async fn appointments_for_date(
    state: tauri::State<'_, AppState>,
    date: DateTime<Local>,
) -> Result<Vec<Appointment>, String> {
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::appointments_for_date(&appointments, date))
}

#[tauri::command]
pub async fn upcoming_appointments(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Appointment>, String> {
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::upcoming_appointments(&appointments, Local::now()))
}

#[tauri::command]
pub async fn completed_appointments(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Appointment>, String> {
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::completed_appointments(&appointments))
}

#[tauri::command]
pub async fn cancelled_appointments(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Appointment>, String> {
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::cancelled_appointments(&appointments))
}

#[tauri::command]
pub async fn missed_appointments(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Appointment>, String> {
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::missed_appointments(&appointments, Local::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifications::{
        appointment_at_time_identifier, appointment_cancelled_identifier,
        appointment_completed_identifier, appointment_reminder_identifier,
    };
    use crate::services::testing::{MemoryStore, RecordingNotifier};
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn input() -> AppointmentInput {
        AppointmentInput {
            doctor_name: "Silva".to_string(),
            hospital: "General".to_string(),
            specialty: "Cardiology".to_string(),
            for_whom: "Myself".to_string(),
            date: local(2026, 5, 2, 9, 30),
            time: local(2026, 5, 2, 9, 30),
            notes: None,
            reminders_enabled: true,
        }
    }

    fn capabilities() -> (
        Arc<dyn StoreClient>,
        Arc<MemoryStore>,
        Arc<dyn Notifier>,
        Arc<RecordingNotifier>,
    ) {
        let memory = Arc::new(MemoryStore::new());
        let recording = Arc::new(RecordingNotifier::new());
        (
            Arc::clone(&memory) as Arc<dyn StoreClient>,
            memory,
            Arc::clone(&recording) as Arc<dyn Notifier>,
            recording,
        )
    }

    #[tokio::test]
    async fn create_appointment_arms_both_reminders() {
        let (store, memory, notifier, recording) = capabilities();
        let appointment =
            create_appointment(&store, &notifier, "user123", input(), local(2026, 5, 1, 12, 0))
                .await
                .unwrap();

        assert_eq!(memory.count(APPOINTMENTS), 1);
        let id = appointment.id.unwrap();
        assert!(recording.is_pending(&appointment_reminder_identifier(&id)));
        assert!(recording.is_pending(&appointment_at_time_identifier(&id)));
    }

    #[tokio::test]
    async fn completing_removes_pending_reminders_and_confirms() {
        let (store, _, notifier, recording) = capabilities();
        let appointment =
            create_appointment(&store, &notifier, "user123", input(), local(2026, 5, 1, 12, 0))
                .await
                .unwrap();
        let id = appointment.id.unwrap();

        set_appointment_status(&store, &notifier, &id, AppointmentStatus::Completed)
            .await
            .unwrap();

        assert!(!recording.is_pending(&appointment_reminder_identifier(&id)));
        assert!(!recording.is_pending(&appointment_at_time_identifier(&id)));
        assert!(recording.is_pending(&appointment_completed_identifier(&id)));
    }

    #[tokio::test]
    async fn cancelling_removes_pending_reminders_and_confirms() {
        let (store, memory, notifier, recording) = capabilities();
        let appointment =
            create_appointment(&store, &notifier, "user123", input(), local(2026, 5, 1, 12, 0))
                .await
                .unwrap();
        let id = appointment.id.unwrap();

        set_appointment_status(&store, &notifier, &id, AppointmentStatus::Cancelled)
            .await
            .unwrap();

        assert!(!recording.is_pending(&appointment_reminder_identifier(&id)));
        assert!(!recording.is_pending(&appointment_at_time_identifier(&id)));
        assert!(recording.is_pending(&appointment_cancelled_identifier(&id)));

        let stored: Appointment =
            serde_json::from_value(memory.documents(APPOINTMENTS)[0].clone()).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn delete_cancels_pending_reminders() {
        let (store, memory, notifier, recording) = capabilities();
        let appointment =
            create_appointment(&store, &notifier, "user123", input(), local(2026, 5, 1, 12, 0))
                .await
                .unwrap();
        let id = appointment.id.unwrap();

        remove_appointment(&store, &notifier, &id).await.unwrap();

        assert_eq!(memory.count(APPOINTMENTS), 0);
        assert!(!recording.is_pending(&appointment_reminder_identifier(&id)));
        assert!(!recording.is_pending(&appointment_at_time_identifier(&id)));
    }

    #[tokio::test]
    async fn create_appointment_requires_a_doctor_name() {
        let (store, memory, notifier, _) = capabilities();
        let mut bad = input();
        bad.doctor_name = "".to_string();

        let result =
            create_appointment(&store, &notifier, "user123", bad, local(2026, 5, 1, 12, 0)).await;
        assert_eq!(result.unwrap_err(), "Please enter a doctor name.");
        assert_eq!(memory.count(APPOINTMENTS), 0);
    }
}

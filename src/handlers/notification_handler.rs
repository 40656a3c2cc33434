use chrono::Local;

use crate::models::NotificationItem;
use crate::schedule::aggregate;
use crate::state::AppState;

#[tauri::command]
pub async fn get_notification_badge_count(
    state: tauri::State<'_, AppState>,
) -> Result<usize, String> {
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    let medications = state.medications.lock().map_err(|e| e.to_string())?;

    Ok(aggregate::notification_badge_count(
        &logs,
        &appointments,
        &medications,
        Local::now(),
    ))
}

#[tauri::command]
pub async fn list_notifications(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<NotificationItem>, String> {
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    let appointments = state.appointments.lock().map_err(|e| e.to_string())?;
    let medications = state.medications.lock().map_err(|e| e.to_string())?;

    Ok(aggregate::notification_items(
        &logs,
        &appointments,
        &medications,
        Local::now(),
    ))
}

#[tauri::command]
pub async fn clear_all_notifications(state: tauri::State<'_, AppState>) -> Result<(), String> {
    log::info!("Clearing all pending notifications");
    state.notifier.clear_all();
    Ok(())
}

#[tauri::command]
pub async fn last_error(state: tauri::State<'_, AppState>) -> Result<Option<String>, String> {
    let error = state.last_error.lock().map_err(|e| e.to_string())?;
    Ok(error.clone())
}

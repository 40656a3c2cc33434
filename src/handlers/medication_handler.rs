use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{Medication, MedicationDuration, MedicationFrequency, MedicationLog, MedicationStatus};
use crate::schedule;
use crate::schedule::aggregate;
use crate::services::notifications::Notifier;
use crate::services::store::{StoreClient, MEDICATIONS, MEDICATION_LOGS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MedicationInput {
    pub name: String,
    pub dosage: String,
    pub frequency: MedicationFrequency,
    pub duration: MedicationDuration,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Local>,
    /// The single user-picked anchor time; the frequency expands it.
    pub time: DateTime<Local>,
    #[serde(rename = "remindersEnabled")]
    pub reminders_enabled: bool,
    #[serde(rename = "refillTracking")]
    pub refill_tracking: bool,
    pub notes: Option<String>,
    #[serde(rename = "currentSupply")]
    pub current_supply: Option<i32>,
    #[serde(rename = "totalSupply")]
    pub total_supply: Option<i32>,
}

pub(crate) async fn create_medication(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    user_id: &str,
    input: MedicationInput,
    now: DateTime<Local>,
) -> Result<Medication, String> {
    if input.name.trim().is_empty() {
        return Err("Please enter a medication name.".to_string());
    }
    if input.dosage.trim().is_empty() {
        return Err("Please enter a dosage.".to_string());
    }

    let times = schedule::dose_times(input.frequency, input.start_date, input.time);
    let mut medication = Medication {
        id: None,
        name: input.name,
        dosage: input.dosage,
        frequency: input.frequency,
        duration: input.duration,
        start_date: input.start_date,
        times,
        reminders_enabled: input.reminders_enabled,
        refill_tracking: input.refill_tracking,
        notes: input.notes.filter(|notes| !notes.is_empty()),
        user_id: user_id.to_string(),
        current_supply: input.current_supply,
        total_supply: input.total_supply,
    };

    let document = serde_json::to_value(&medication).map_err(|e| {
        log::error!("Failed to encode medication: {}", e);
        e.to_string()
    })?;
    let id = store
        .add(MEDICATIONS, document)
        .await
        .map_err(|e| format!("Error adding medication: {}", e))?;
    medication.id = Some(id.clone());

    if medication.reminders_enabled {
        for time in medication.times.clone() {
            notifier.schedule_medication_reminder(&medication, time);
        }
    }

    // Reminder arming above and the log batch below are independent
    // side effects: a failed batch reports the error to the caller but
    // leaves armed reminders in place.
    let logs = schedule::build_logs(&medication, &id, now);
    let mut documents = Vec::with_capacity(logs.len());
    for log in &logs {
        documents.push(serde_json::to_value(log).map_err(|e| {
            log::error!("Error creating log: {}", e);
            e.to_string()
        })?);
    }
    store
        .add_batch(MEDICATION_LOGS, documents)
        .await
        .map_err(|e| format!("Error committing logs batch: {}", e))?;

    Ok(medication)
}

pub(crate) async fn save_medication(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    medication: &Medication,
) -> Result<(), String> {
    let id = medication
        .id
        .clone()
        .ok_or_else(|| "Medication ID is missing".to_string())?;

    let document = serde_json::to_value(medication).map_err(|e| e.to_string())?;
    store
        .set(MEDICATIONS, &id, document)
        .await
        .map_err(|e| format!("Error updating medication: {}", e))?;

    notifier.cancel_medication_notifications(&id);
    if medication.reminders_enabled {
        for time in medication.times.clone() {
            notifier.schedule_medication_reminder(medication, time);
        }
    }
    Ok(())
}

pub(crate) async fn remove_medication(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    id: &str,
) -> Result<(), String> {
    store
        .delete(MEDICATIONS, id)
        .await
        .map_err(|e| format!("Error deleting medication: {}", e))?;

    // Logs cascade with their medication.
    store
        .delete_where(MEDICATION_LOGS, "medicationId", id)
        .await
        .map_err(|e| format!("Error deleting logs: {}", e))?;

    notifier.cancel_medication_notifications(id);
    Ok(())
}

pub(crate) async fn set_log_status(
    store: &Arc<dyn StoreClient>,
    log_id: &str,
    status: MedicationStatus,
    now: DateTime<Local>,
) -> Result<(), String> {
    // Marking a dose taken stamps the time; toggling it back to
    // pending clears it again.
    let time_taken = if status == MedicationStatus::Taken {
        json!(now)
    } else {
        Value::Null
    };

    store
        .update(
            MEDICATION_LOGS,
            log_id,
            json!({ "status": status, "timeTaken": time_taken }),
        )
        .await
        .map_err(|e| format!("Error updating medication status: {}", e))
}

pub(crate) async fn set_supply(
    store: &Arc<dyn StoreClient>,
    notifier: &Arc<dyn Notifier>,
    medications: &[Medication],
    id: &str,
    current_supply: i32,
) -> Result<(), String> {
    store
        .update(MEDICATIONS, id, json!({ "currentSupply": current_supply }))
        .await
        .map_err(|e| format!("Error updating medication supply: {}", e))?;

    if let Some(medication) = medications.iter().find(|m| m.id.as_deref() == Some(id)) {
        let mut updated = medication.clone();
        updated.current_supply = Some(current_supply);
        if aggregate::is_low_supply(&updated) {
            notifier.schedule_refill_reminder(&updated);
        }
    }
    Ok(())
}

pub(crate) async fn query_logs(
    store: &Arc<dyn StoreClient>,
    user_id: &str,
    status: Option<MedicationStatus>,
) -> Result<Vec<MedicationLog>, String> {
    let documents = store
        .list(MEDICATION_LOGS, user_id)
        .await
        .map_err(|e| format!("Error fetching medication logs: {}", e))?;

    let mut logs: Vec<MedicationLog> = documents
        .into_iter()
        .filter_map(|document| serde_json::from_value(document).ok())
        .filter(|log: &MedicationLog| status.map_or(true, |wanted| log.status == wanted))
        .collect();
    logs.sort_by(|a, b| b.time_scheduled.cmp(&a.time_scheduled));
    Ok(logs)
}

#[tauri::command]
pub async fn fetch_medications(state: tauri::State<'_, AppState>) -> Result<(), String> {
    log::info!("Subscribing to medications");
    let user_id = state.current_user_id()?;

    state.medication_listener.restart::<Medication>(
        state.app_handle.clone(),
        Arc::clone(&state.store),
        MEDICATIONS,
        user_id.clone(),
        Arc::clone(&state.medications),
        Arc::clone(&state.last_error),
    );
    state.log_listener.restart::<MedicationLog>(
        state.app_handle.clone(),
        Arc::clone(&state.store),
        MEDICATION_LOGS,
        user_id,
        Arc::clone(&state.medication_logs),
        Arc::clone(&state.last_error),
    );
    Ok(())
}

#[tauri::command]
pub async fn fetch_medication_logs(
    state: tauri::State<'_, AppState>,
    status: Option<MedicationStatus>,
) -> Result<Vec<MedicationLog>, String> {
    let user_id = state.current_user_id()?;
    let store = Arc::clone(&state.store);
    let logs = query_logs(&store, &user_id, status).await?;

    let mut mirror = state.medication_logs.lock().map_err(|e| e.to_string())?;
    *mirror = logs.clone();
    Ok(logs)
}

#[tauri::command]
pub async fn fetch_today_medications(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Medication>, String> {
    let medications = state.medications.lock().map_err(|e| e.to_string())?;
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::today_medications(&medications, &logs, Local::now()))
}

#[tauri::command]
pub async fn add_medication(
    state: tauri::State<'_, AppState>,
    input: MedicationInput,
) -> Result<Medication, String> {
    log::info!("Adding medication: {}", input.name);
    let user_id = state.current_user_id()?;
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    create_medication(&store, &notifier, &user_id, input, Local::now()).await
}

#[tauri::command]
pub async fn update_medication(
    state: tauri::State<'_, AppState>,
    medication: Medication,
) -> Result<(), String> {
    log::info!("Updating medication: {:?}", medication.id);
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    save_medication(&store, &notifier, &medication).await
}

#[tauri::command]
pub async fn delete_medication(
    state: tauri::State<'_, AppState>,
    id: String,
) -> Result<(), String> {
    log::info!("Deleting medication: {}", id);
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    remove_medication(&store, &notifier, &id).await
}

#[tauri::command]
pub async fn mark_medication_status(
    state: tauri::State<'_, AppState>,
    log_id: String,
    status: MedicationStatus,
) -> Result<(), String> {
    log::info!("Marking log {} as {:?}", log_id, status);
    let store = Arc::clone(&state.store);
    set_log_status(&store, &log_id, status, Local::now()).await
}

#[tauri::command]
pub async fn update_medication_supply(
    state: tauri::State<'_, AppState>,
    id: String,
    current_supply: i32,
) -> Result<(), String> {
    log::info!("Updating supply for {}: {}", id, current_supply);
    let medications = {
        let mirror = state.medications.lock().map_err(|e| e.to_string())?;
        mirror.clone()
    };
    let store = Arc::clone(&state.store);
    let notifier = Arc::clone(&state.notifier);
    set_supply(&store, &notifier, &medications, &id, current_supply).await
}

#[tauri::command]
pub async fn get_daily_progress(state: tauri::State<'_, AppState>) -> Result<f64, String> {
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::daily_progress(&logs, Local::now()))
}

#[tauri::command]
pub async fn get_grouped_history(
    state: tauri::State<'_, AppState>,
    status: Option<MedicationStatus>,
) -> Result<Vec<aggregate::HistoryGroup>, String> {
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    let filtered: Vec<MedicationLog> = logs
        .iter()
        .filter(|log| status.map_or(true, |wanted| log.status == wanted))
        .cloned()
        .collect();
    Ok(aggregate::grouped_history(&filtered, Local::now()))
}

#[tauri::command]
pub async fn logs_for_date(
    state: tauri::State<'_, AppState>,
    date: DateTime<Local>,
) -> Result<Vec<MedicationLog>, String> {
    let logs = state.medication_logs.lock().map_err(|e| e.to_string())?;
    Ok(aggregate::logs_for_date(&logs, date))
}

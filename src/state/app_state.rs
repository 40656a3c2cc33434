use std::sync::{Arc, Mutex};

use crate::models::{Appointment, Medication, MedicationLog, User};
use crate::services::connectivity::ConnectivityObserver;
use crate::services::listener::CollectionListener;
use crate::services::notifications::Notifier;
use crate::services::store::StoreClient;

pub struct AppState {
    pub user: Mutex<Option<User>>,
    // Bearer token cell shared with the store client; filled on sign-in.
    pub auth_token: Arc<Mutex<Option<String>>>,

    // Collection mirrors, replaced wholesale by the listeners.
    pub medications: Arc<Mutex<Vec<Medication>>>,
    pub medication_logs: Arc<Mutex<Vec<MedicationLog>>>,
    pub appointments: Arc<Mutex<Vec<Appointment>>>,
    pub last_error: Arc<Mutex<Option<String>>>,

    pub medication_listener: CollectionListener,
    pub log_listener: CollectionListener,
    pub appointment_listener: CollectionListener,

    pub store: Arc<dyn StoreClient>,
    pub notifier: Arc<dyn Notifier>,
    pub connectivity: Arc<dyn ConnectivityObserver>,

    pub app_handle: tauri::AppHandle,
}

impl AppState {
    /// The signed-in user's id, or an error for commands that require a
    /// session.
    pub fn current_user_id(&self) -> Result<String, String> {
        let user = self.user.lock().map_err(|e| e.to_string())?;
        user.as_ref()
            .and_then(|u| u.id.clone())
            .ok_or_else(|| "User not authenticated".to_string())
    }
}

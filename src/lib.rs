#[cfg(debug_assertions)]
use dotenv::dotenv;
use std::sync::{Arc, Mutex};
use tauri::Manager;

mod handlers;
mod models;
mod schedule;
mod services;
mod state;
mod utils;

use services::connectivity::NetworkMonitor;
use services::listener::CollectionListener;
use services::notifications::TauriNotifier;
use services::store::HttpStoreClient;
use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    #[cfg(debug_assertions)]
    dotenv().ok();

    tauri::Builder::default()
        .setup(|app| {
            let auth_token = Arc::new(Mutex::new(None));
            let store = Arc::new(HttpStoreClient::from_env(Arc::clone(&auth_token)));
            let connectivity = Arc::new(NetworkMonitor::start(store.base_url().to_string()));
            let notifier = Arc::new(TauriNotifier::new(app.handle().clone()));

            let app_state = AppState {
                user: Mutex::new(None),
                auth_token,
                medications: Arc::new(Mutex::new(Vec::new())),
                medication_logs: Arc::new(Mutex::new(Vec::new())),
                appointments: Arc::new(Mutex::new(Vec::new())),
                last_error: Arc::new(Mutex::new(None)),
                medication_listener: CollectionListener::new(),
                log_listener: CollectionListener::new(),
                appointment_listener: CollectionListener::new(),
                store,
                notifier,
                connectivity,
                app_handle: app.handle().clone(),
            };
            app.manage(app_state);
            Ok(())
        })
        .plugin(
            tauri_plugin_log::Builder::new()
                .target(tauri_plugin_log::Target::new(
                    tauri_plugin_log::TargetKind::LogDir {
                        file_name: Some("app.log".to_string()),
                    },
                ))
                .build(),
        )
        .plugin(tauri_plugin_http::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_process::init())
        .plugin(tauri_plugin_shell::init())
        .invoke_handler(tauri::generate_handler![
            handlers::sign_up,
            handlers::sign_in,
            handlers::sign_out,
            handlers::fetch_user,
            handlers::update_profile,
            handlers::set_biometric_auth,
            handlers::update_password,
            handlers::send_password_reset,
            handlers::network_status,
            handlers::fetch_medications,
            handlers::fetch_medication_logs,
            handlers::fetch_today_medications,
            handlers::add_medication,
            handlers::update_medication,
            handlers::delete_medication,
            handlers::mark_medication_status,
            handlers::update_medication_supply,
            handlers::get_daily_progress,
            handlers::get_grouped_history,
            handlers::logs_for_date,
            handlers::fetch_appointments,
            handlers::add_appointment,
            handlers::update_appointment,
            handlers::delete_appointment,
            handlers::update_appointment_status,
            handlers::appointments_for_date,
            handlers::upcoming_appointments,
            handlers::completed_appointments,
            handlers::cancelled_appointments,
            handlers::missed_appointments,
            handlers::get_notification_badge_count,
            handlers::list_notifications,
            handlers::clear_all_notifications,
            handlers::last_error,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

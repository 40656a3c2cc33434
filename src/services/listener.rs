use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tauri::{AppHandle, Emitter, EventTarget};

use crate::services::store::StoreClient;

fn poll_interval() -> Duration {
    let secs = env::var("TRACKMED_POLL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(20);
    Duration::from_secs(secs)
}

/// A realtime subscription to one collection. Each delivery replaces
/// the whole in-memory mirror; there is no incremental merge. Poll
/// failures leave the mirror stale and surface as the shared error
/// string, never as a retry.
pub struct CollectionListener {
    handle: Mutex<Option<tauri::async_runtime::JoinHandle<()>>>,
}

impl CollectionListener {
    pub fn new() -> Self {
        CollectionListener {
            handle: Mutex::new(None),
        }
    }

    /// Tears down the previous subscription, then starts polling the
    /// collection. Every snapshot is decoded, swapped into the mirror,
    /// and broadcast to the UI as `<collection>-updated`.
    pub fn restart<T>(
        &self,
        app: AppHandle,
        store: Arc<dyn StoreClient>,
        collection: &'static str,
        user_id: String,
        mirror: Arc<Mutex<Vec<T>>>,
        last_error: Arc<Mutex<Option<String>>>,
    ) where
        T: DeserializeOwned + Serialize + Clone + Send + 'static,
    {
        self.stop();

        let interval = poll_interval();
        let handle = tauri::async_runtime::spawn(async move {
            loop {
                match store.list(collection, &user_id).await {
                    Ok(documents) => {
                        // Documents that fail to decode are dropped,
                        // matching the snapshot decoder's behavior.
                        let decoded: Vec<T> = documents
                            .into_iter()
                            .filter_map(|document| serde_json::from_value(document).ok())
                            .collect();

                        match mirror.lock() {
                            Ok(mut guard) => *guard = decoded.clone(),
                            Err(e) => {
                                log::error!("Failed to lock {} mirror: {}", collection, e);
                                break;
                            }
                        }

                        let event = format!("{}-updated", collection);
                        if let Err(e) = app.emit_to(EventTarget::any(), &event, decoded) {
                            log::error!("Failed to emit {}: {}", event, e);
                        }
                    }
                    Err(e) => {
                        log::error!("Error fetching {}: {}", collection, e);
                        if let Ok(mut guard) = last_error.lock() {
                            *guard = Some(format!("Error fetching {}: {}", collection, e));
                        }
                    }
                }

                tokio::time::sleep(interval).await;
            }
        });

        if let Ok(mut guard) = self.handle.lock() {
            *guard = Some(handle);
        }
    }

    pub fn stop(&self) {
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl Default for CollectionListener {
    fn default() -> Self {
        CollectionListener::new()
    }
}

impl Drop for CollectionListener {
    fn drop(&mut self) {
        self.stop();
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capability handle for network reachability.
pub trait ConnectivityObserver: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Background probe against the API base URL. The latest result lands
/// in an atomic flag the UI thread reads without blocking.
pub struct NetworkMonitor {
    connected: Arc<AtomicBool>,
    handle: Mutex<Option<tauri::async_runtime::JoinHandle<()>>>,
}

impl NetworkMonitor {
    pub fn start(probe_url: String) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);

        let handle = tauri::async_runtime::spawn(async move {
            let client = reqwest::Client::new();
            loop {
                let reachable = client.head(&probe_url).send().await.is_ok();
                flag.store(reachable, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(15)).await;
            }
        });

        NetworkMonitor {
            connected,
            handle: Mutex::new(Some(handle)),
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

impl ConnectivityObserver for NetworkMonitor {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

//! In-memory stand-ins for the capability interfaces, used by tests in
//! place of the HTTP store and the platform notification center.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, Timelike};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Appointment, Medication};
use crate::services::notifications::{
    appointment_at_time_identifier, appointment_cancelled_identifier,
    appointment_completed_identifier, appointment_reminder_identifier, medication_identifier,
    refill_identifier, Notifier,
};
use crate::services::store::StoreClient;

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    pub fail_batches: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .expect("collections lock")
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .expect("collections lock")
            .get(collection)
            .map_or_else(Vec::new, |docs| {
                docs.iter().map(|(_, doc)| doc.clone()).collect()
            })
    }

    fn insert(&self, collection: &str, document: Value) -> String {
        let id = Uuid::new_v4().to_string();
        let mut stamped = document;
        stamped["id"] = Value::String(id.clone());
        self.collections
            .lock()
            .expect("collections lock")
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), stamped));
        id
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn list(&self, collection: &str, user_id: &str) -> Result<Vec<Value>, String> {
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|doc| doc["userId"] == user_id)
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, String> {
        Ok(self
            .collections
            .lock()
            .map_err(|e| e.to_string())?
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn add(&self, collection: &str, document: Value) -> Result<String, String> {
        Ok(self.insert(collection, document))
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), String> {
        let mut collections = self.collections.lock().map_err(|e| e.to_string())?;
        let docs = collections.entry(collection.to_string()).or_default();
        let mut stamped = document;
        stamped["id"] = Value::String(id.to_string());
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = stamped,
            None => docs.push((id.to_string(), stamped)),
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), String> {
        let mut collections = self.collections.lock().map_err(|e| e.to_string())?;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| format!("Unknown collection: {}", collection))?;
        let (_, document) = docs
            .iter_mut()
            .find(|(doc_id, _)| doc_id == id)
            .ok_or_else(|| format!("Document not found: {}/{}", collection, id))?;

        if let (Some(target), Some(fields)) = (document.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), String> {
        let mut collections = self.collections.lock().map_err(|e| e.to_string())?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }

    async fn add_batch(&self, collection: &str, documents: Vec<Value>) -> Result<(), String> {
        if *self.fail_batches.lock().map_err(|e| e.to_string())? {
            return Err("Error committing logs batch".to_string());
        }
        for document in documents {
            self.insert(collection, document);
        }
        Ok(())
    }

    async fn delete_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<(), String> {
        let mut collections = self.collections.lock().map_err(|e| e.to_string())?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|(_, doc)| doc[field] != value);
        }
        Ok(())
    }
}

/// Notifier fake tracking the pending-identifier set exactly as the
/// platform scheduler would.
#[derive(Default)]
pub struct RecordingNotifier {
    pending: Mutex<HashSet<String>>,
    scheduled: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn scheduled_identifiers(&self) -> Vec<String> {
        self.scheduled.lock().expect("scheduled lock").clone()
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        self.pending.lock().expect("pending lock").contains(identifier)
    }

    fn arm(&self, identifier: String) {
        self.scheduled
            .lock()
            .expect("scheduled lock")
            .push(identifier.clone());
        self.pending.lock().expect("pending lock").insert(identifier);
    }
}

impl Notifier for RecordingNotifier {
    fn schedule_medication_reminder(&self, medication: &Medication, time: DateTime<Local>) {
        let medication_id = medication.id.clone().unwrap_or_default();
        self.arm(medication_identifier(
            &medication_id,
            time.hour(),
            time.minute(),
        ));
    }

    fn schedule_appointment_reminder(&self, appointment: &Appointment) {
        self.arm(appointment_reminder_identifier(
            &appointment.id.clone().unwrap_or_default(),
        ));
    }

    fn schedule_appointment_at_time(&self, appointment: &Appointment) {
        self.arm(appointment_at_time_identifier(
            &appointment.id.clone().unwrap_or_default(),
        ));
    }

    fn schedule_appointment_completed(&self, appointment: &Appointment) {
        self.arm(appointment_completed_identifier(
            &appointment.id.clone().unwrap_or_default(),
        ));
    }

    fn schedule_appointment_cancelled(&self, appointment: &Appointment) {
        self.arm(appointment_cancelled_identifier(
            &appointment.id.clone().unwrap_or_default(),
        ));
    }

    fn schedule_refill_reminder(&self, medication: &Medication) {
        self.arm(refill_identifier(&medication.id.clone().unwrap_or_default()));
    }

    fn cancel_medication_notifications(&self, medication_id: &str) {
        let prefix = format!("medication_{}", medication_id);
        self.pending
            .lock()
            .expect("pending lock")
            .retain(|identifier| !identifier.starts_with(&prefix));
    }

    fn cancel_appointment_notifications(&self, appointment_id: &str) {
        let mut pending = self.pending.lock().expect("pending lock");
        pending.remove(&appointment_reminder_identifier(appointment_id));
        pending.remove(&appointment_at_time_identifier(appointment_id));
    }

    fn clear_all(&self) {
        self.pending.lock().expect("pending lock").clear();
    }

    fn pending_identifiers(&self) -> Vec<String> {
        self.pending
            .lock()
            .expect("pending lock")
            .iter()
            .cloned()
            .collect()
    }
}

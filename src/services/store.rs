use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

pub const MEDICATIONS: &str = "medications";
pub const MEDICATION_LOGS: &str = "medicationLogs";
pub const APPOINTMENTS: &str = "appointments";
pub const USERS: &str = "users";

const DEFAULT_API_URL: &str = "https://trackmed-api.fly.dev";

/// Capability handle for the remote document store. Every collection
/// query is scoped to the owning user; documents travel as plain JSON.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn list(&self, collection: &str, user_id: &str) -> Result<Vec<Value>, String>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, String>;
    async fn add(&self, collection: &str, document: Value) -> Result<String, String>;
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), String>;
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), String>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), String>;
    /// Creates every document in one atomic multi-record write.
    async fn add_batch(&self, collection: &str, documents: Vec<Value>) -> Result<(), String>;
    /// Deletes every document whose field equals the given value.
    async fn delete_where(&self, collection: &str, field: &str, value: &str)
        -> Result<(), String>;
}

/// Store client speaking to the backend facade over HTTP. The bearer
/// token cell is shared with the session state and filled on sign-in.
pub struct HttpStoreClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Arc<Mutex<Option<String>>>,
}

impl HttpStoreClient {
    pub fn from_env(auth_token: Arc<Mutex<Option<String>>>) -> Self {
        let base_url =
            env::var("TRACKMED_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        HttpStoreClient {
            client: reqwest::Client::new(),
            base_url,
            auth_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> Result<String, String> {
        let token = self.auth_token.lock().map_err(|e| e.to_string())?;
        token
            .as_ref()
            .cloned()
            .ok_or_else(|| "User not authenticated".to_string())
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/{}", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, collection, id)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, String> {
        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Server returned error: {}", error_text);
            return Err(format!("Server error: {}", error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn list(&self, collection: &str, user_id: &str) -> Result<Vec<Value>, String> {
        let token = self.bearer()?;

        // Date-bearing collections come back ordered by their date field.
        let order_by = match collection {
            MEDICATION_LOGS => Some("timeScheduled"),
            APPOINTMENTS => Some("date"),
            MEDICATIONS => Some("startDate"),
            _ => None,
        };
        let mut query: Vec<(&str, &str)> = vec![("userId", user_id)];
        if let Some(field) = order_by {
            query.push(("orderBy", field));
        }

        let response = self
            .client
            .get(self.collection_url(collection))
            .query(&query)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to fetch {}: {}", collection, e);
                e.to_string()
            })?;

        let json_value = response.json::<Vec<Value>>().await.map_err(|e| {
            log::error!("Failed to parse {} response as JSON: {}", collection, e);
            e.to_string()
        })?;

        Ok(json_value)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, String> {
        let token = self.bearer()?;
        let response = self
            .client
            .get(self.document_url(collection, id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to fetch {}/{}: {}", collection, id, e);
                e.to_string()
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let json_value = response.json::<Value>().await.map_err(|e| {
            log::error!("Failed to parse {} document as JSON: {}", collection, e);
            e.to_string()
        })?;

        Ok(Some(json_value))
    }

    async fn add(&self, collection: &str, document: Value) -> Result<String, String> {
        let token = self.bearer()?;
        let response = self
            .client
            .post(self.collection_url(collection))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&document)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to create {} document: {}", collection, e);
                e.to_string()
            })?;

        let response = Self::check_status(response).await?;
        let json_value = response.json::<Value>().await.map_err(|e| {
            log::error!("Failed to parse create response as JSON: {}", e);
            e.to_string()
        })?;

        json_value["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                let err = "Create response did not contain a document id";
                log::error!("{}", err);
                err.to_string()
            })
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<(), String> {
        let token = self.bearer()?;
        let response = self
            .client
            .put(self.document_url(collection, id))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&document)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to write {}/{}: {}", collection, id, e);
                e.to_string()
            })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), String> {
        let token = self.bearer()?;
        let response = self
            .client
            .patch(self.document_url(collection, id))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&patch)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to update {}/{}: {}", collection, id, e);
                e.to_string()
            })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), String> {
        let token = self.bearer()?;
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to delete {}/{}: {}", collection, id, e);
                e.to_string()
            })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn add_batch(&self, collection: &str, documents: Vec<Value>) -> Result<(), String> {
        let token = self.bearer()?;
        let response = self
            .client
            .post(format!("{}/batch", self.collection_url(collection)))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "create": documents }))
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to commit {} batch: {}", collection, e);
                e.to_string()
            })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn delete_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<(), String> {
        let token = self.bearer()?;
        let response = self
            .client
            .delete(self.collection_url(collection))
            .query(&[(field, value)])
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to delete {} where {}={}: {}", collection, field, value, e);
                e.to_string()
            })?;

        Self::check_status(response).await.map(|_| ())
    }
}

use std::env;

use serde_json::{json, Value};

use crate::models::User;
use crate::services::store::USERS;
use crate::state::AppState;
use crate::utils::{is_valid_email, is_valid_password};

fn auth_endpoint(action: &str) -> Result<String, String> {
    let api_key = env::var("FIREBASE_API_KEY").map_err(|e| {
        log::error!("Failed to get FIREBASE_API_KEY: {}", e);
        "FIREBASE_API_KEY not found in environment".to_string()
    })?;
    Ok(format!(
        "https://identitytoolkit.googleapis.com/v1/accounts:{}?key={}",
        action, api_key
    ))
}

/// Auth errors come back as coded messages; map the common ones to the
/// wording the UI shows.
fn friendly_auth_error(code: &str) -> String {
    if code.starts_with("WEAK_PASSWORD") {
        return "Password is too weak.".to_string();
    }
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            "Incorrect email or password. Please try again.".to_string()
        }
        "EMAIL_EXISTS" => "This email is already registered.".to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        other => other.to_string(),
    }
}

async fn auth_request(action: &str, payload: Value) -> Result<Value, String> {
    let url = auth_endpoint(action)?;

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            log::error!("Auth request {} failed: {}", action, e);
            "Network error. Please check your connection.".to_string()
        })?;

    let json_value = response.json::<Value>().await.map_err(|e| {
        log::error!("Failed to parse auth response as JSON: {}", e);
        e.to_string()
    })?;

    if let Some(code) = json_value["error"]["message"].as_str() {
        log::error!("Auth request {} rejected: {}", action, code);
        return Err(friendly_auth_error(code));
    }

    Ok(json_value)
}

fn session_fields(response: &Value) -> Result<(String, String), String> {
    let local_id = response["localId"]
        .as_str()
        .ok_or_else(|| "Auth response did not contain a user id".to_string())?;
    let id_token = response["idToken"]
        .as_str()
        .ok_or_else(|| "Auth response did not contain a token".to_string())?;
    Ok((local_id.to_string(), id_token.to_string()))
}

fn store_session(state: &AppState, id_token: String, user: User) -> Result<(), String> {
    {
        let mut token = state.auth_token.lock().map_err(|e| e.to_string())?;
        *token = Some(id_token);
    }
    let mut current = state.user.lock().map_err(|e| e.to_string())?;
    *current = Some(user);
    Ok(())
}

#[tauri::command]
pub async fn sign_up(
    state: tauri::State<'_, AppState>,
    name: String,
    email: String,
    password: String,
) -> Result<User, String> {
    // Client-side validation happens before any remote call.
    if name.trim().is_empty() {
        return Err("Please enter your name.".to_string());
    }
    if !is_valid_email(&email) {
        return Err("Please enter a valid email address.".to_string());
    }
    if !is_valid_password(&password) {
        return Err(
            "Password must be at least 6 characters and contain at least one number.".to_string(),
        );
    }

    log::info!("Creating account for {}", email);

    let response = auth_request(
        "signUp",
        json!({ "email": email, "password": password, "returnSecureToken": true }),
    )
    .await?;
    let (local_id, id_token) = session_fields(&response)?;

    // The token has to be in place before the store call can
    // authenticate.
    {
        let mut token = state.auth_token.lock().map_err(|e| e.to_string())?;
        *token = Some(id_token.clone());
    }

    let user = User::new(local_id.clone(), email, name);
    let document = serde_json::to_value(&user).map_err(|e| {
        log::error!("Failed to encode user document: {}", e);
        e.to_string()
    })?;
    state.store.set(USERS, &local_id, document).await.map_err(|e| {
        log::error!("Error saving user data: {}", e);
        format!("Error saving user data: {}", e)
    })?;

    store_session(&state, id_token, user.clone())?;
    Ok(user)
}

#[tauri::command]
pub async fn sign_in(
    state: tauri::State<'_, AppState>,
    email: String,
    password: String,
) -> Result<User, String> {
    log::info!("Signing in {}", email);

    let response = auth_request(
        "signInWithPassword",
        json!({ "email": email, "password": password, "returnSecureToken": true }),
    )
    .await?;
    let (local_id, id_token) = session_fields(&response)?;

    {
        let mut token = state.auth_token.lock().map_err(|e| e.to_string())?;
        *token = Some(id_token.clone());
    }

    let document = state
        .store
        .get(USERS, &local_id)
        .await
        .map_err(|e| format!("Error fetching user data: {}", e))?
        .ok_or_else(|| "User document not found".to_string())?;
    let user: User = serde_json::from_value(document).map_err(|e| {
        log::error!("Error decoding user data: {}", e);
        format!("Error decoding user data: {}", e)
    })?;

    store_session(&state, id_token, user.clone())?;
    Ok(user)
}

#[tauri::command]
pub async fn sign_out(state: tauri::State<'_, AppState>) -> Result<(), String> {
    log::info!("Signing out");

    state.medication_listener.stop();
    state.log_listener.stop();
    state.appointment_listener.stop();

    {
        let mut token = state.auth_token.lock().map_err(|e| e.to_string())?;
        *token = None;
    }
    let mut user = state.user.lock().map_err(|e| e.to_string())?;
    *user = None;
    Ok(())
}

#[tauri::command]
pub async fn fetch_user(state: tauri::State<'_, AppState>) -> Result<Option<User>, String> {
    let user = state.user.lock().map_err(|e| e.to_string())?;
    Ok(user.clone())
}

#[tauri::command]
pub async fn update_profile(
    state: tauri::State<'_, AppState>,
    name: Option<String>,
    language: Option<String>,
    use_biometric_auth: Option<bool>,
) -> Result<User, String> {
    let mut user = {
        let current = state.user.lock().map_err(|e| e.to_string())?;
        current
            .as_ref()
            .cloned()
            .ok_or_else(|| "User not authenticated".to_string())?
    };
    let user_id = user
        .id
        .clone()
        .ok_or_else(|| "User ID is missing".to_string())?;

    if let Some(name) = name {
        user.name = name;
    }
    if let Some(language) = language {
        user.language = language;
    }
    if let Some(use_biometric_auth) = use_biometric_auth {
        user.use_biometric_auth = use_biometric_auth;
    }

    let document = serde_json::to_value(&user).map_err(|e| e.to_string())?;
    state.store.set(USERS, &user_id, document).await.map_err(|e| {
        log::error!("Error saving user data: {}", e);
        format!("Error saving user data: {}", e)
    })?;

    let mut current = state.user.lock().map_err(|e| e.to_string())?;
    *current = Some(user.clone());
    Ok(user)
}

#[tauri::command]
pub async fn set_biometric_auth(
    state: tauri::State<'_, AppState>,
    enabled: bool,
) -> Result<User, String> {
    update_profile(state, None, None, Some(enabled)).await
}

#[tauri::command]
pub async fn update_password(
    state: tauri::State<'_, AppState>,
    current_password: String,
    new_password: String,
) -> Result<(), String> {
    if !is_valid_password(&new_password) {
        return Err(
            "Password must be at least 6 characters and contain at least one number.".to_string(),
        );
    }

    let email = {
        let user = state.user.lock().map_err(|e| e.to_string())?;
        user.as_ref()
            .map(|u| u.email.clone())
            .ok_or_else(|| "User not logged in".to_string())?
    };

    // Re-authenticate first, then update against the fresh token.
    let response = auth_request(
        "signInWithPassword",
        json!({ "email": email, "password": current_password, "returnSecureToken": true }),
    )
    .await?;
    let (_, id_token) = session_fields(&response)?;

    let update = auth_request(
        "update",
        json!({ "idToken": id_token, "password": new_password, "returnSecureToken": true }),
    )
    .await?;

    if let Some(refreshed) = update["idToken"].as_str() {
        let mut token = state.auth_token.lock().map_err(|e| e.to_string())?;
        *token = Some(refreshed.to_string());
    }
    Ok(())
}

#[tauri::command]
pub async fn send_password_reset(email: String) -> Result<(), String> {
    if !is_valid_email(&email) {
        return Err("Please enter a valid email address".to_string());
    }

    auth_request(
        "sendOobCode",
        json!({ "requestType": "PASSWORD_RESET", "email": email }),
    )
    .await
    .map_err(|e| match e.as_str() {
        "Incorrect email or password. Please try again." => {
            "No account found with this email".to_string()
        }
        _ => e,
    })?;
    Ok(())
}

#[tauri::command]
pub async fn network_status(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    Ok(state.connectivity.is_connected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_friendly_messages() {
        assert_eq!(
            friendly_auth_error("EMAIL_NOT_FOUND"),
            "Incorrect email or password. Please try again."
        );
        assert_eq!(
            friendly_auth_error("EMAIL_EXISTS"),
            "This email is already registered."
        );
        assert_eq!(
            friendly_auth_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            "Password is too weak."
        );
        assert_eq!(friendly_auth_error("TOO_MANY_ATTEMPTS"), "TOO_MANY_ATTEMPTS");
    }

    #[test]
    fn session_fields_require_both_values() {
        let ok = json!({ "localId": "u1", "idToken": "t1" });
        assert_eq!(
            session_fields(&ok).unwrap(),
            ("u1".to_string(), "t1".to_string())
        );

        let missing = json!({ "localId": "u1" });
        assert!(session_fields(&missing).is_err());
    }
}

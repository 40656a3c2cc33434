use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(rename = "profileImageUrl")]
    pub profile_image_url: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(rename = "useBiometricAuth", default)]
    pub use_biometric_auth: bool,
}

fn default_language() -> String {
    "en".to_string()
}

impl User {
    pub fn new(id: String, email: String, name: String) -> Self {
        User {
            id: Some(id),
            email,
            name,
            profile_image_url: None,
            language: default_language(),
            use_biometric_auth: false,
        }
    }
}

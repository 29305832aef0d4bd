use serde::{Deserialize, Serialize};

/// Request body for user registration. Fields are optional so that a
/// missing one is reported as a validation error rather than a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of every non-success response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

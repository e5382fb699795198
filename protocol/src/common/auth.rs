//! Token-related common types

use serde::{Deserialize, Serialize};

/// Access/refresh token pair as issued by `/auth/login` and `/auth/refresh`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairPayload {
    pub access_token: String,
    pub refresh_token: String,
}

/// Error body returned by the backend on non-2xx responses
///
/// The Hono layer is not consistent about the key it uses, so every
/// variant we have seen is accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mensaje: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).or(self.mensaje)
    }
}

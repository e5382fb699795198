//! Authentication API DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::{TokenPairPayload, UsuarioPayload};

// ============================================================================
// Login DTOs
// ============================================================================

/// `POST /auth/login` request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub correo: String,
    #[validate(length(min = 1, max = 255))]
    pub contrasena: String,
}

/// `POST /auth/login` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub usuario: UsuarioPayload,
}

impl LoginResponse {
    pub fn tokens(&self) -> TokenPairPayload {
        TokenPairPayload {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

// ============================================================================
// Registration DTOs
// ============================================================================

/// `POST /auth/registro` request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub nombre: String,
    #[validate(email)]
    pub correo: String,
    #[validate(length(min = 6, max = 255))]
    pub contrasena: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intereses: Vec<String>,
}

/// `POST /auth/registro` response is the created user
pub type RegisterResponse = UsuarioPayload;

// ============================================================================
// Token Refresh DTOs
// ============================================================================

/// `POST /auth/refresh` request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// `POST /auth/refresh` response
pub type RefreshTokenResponse = TokenPairPayload;

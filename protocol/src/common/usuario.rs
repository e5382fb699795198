//! User payloads as returned by the backend

use serde::{Deserialize, Serialize};

/// Role attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolPayload {
    pub id_rol: i64,
    #[serde(default)]
    pub nombre: Option<String>,
}

/// `usuario` object
///
/// Only `id_usuario` is required; everything else is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsuarioPayload {
    pub id_usuario: i64,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub rol: Option<RolPayload>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub intereses: Option<Vec<String>>,
}

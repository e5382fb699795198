//! Authenticated user model
//!
//! Backend `usuario` payloads are loosely typed; everything that reaches a
//! session goes through [`User::from_payload`] first.

use panorama_protocol::common::{RolPayload, UsuarioPayload};
use serde::{Deserialize, Serialize};

use crate::error::{PanoramaError, Result};

/// Canonical role ids
pub const ADMINISTRATOR_ROLE_ID: i64 = 1;
pub const ORGANIZER_ROLE_ID: i64 = 2;

/// What a role id means for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleKind {
    Administrator,
    Organizer,
    User,
}

impl RoleKind {
    /// 1 is administrator, 2 is organizer, anything else is a plain user
    pub fn from_role_id(id: i64) -> Self {
        match id {
            ADMINISTRATOR_ROLE_ID => RoleKind::Administrator,
            ORGANIZER_ROLE_ID => RoleKind::Organizer,
            _ => RoleKind::User,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoleKind::Administrator => "Administrator",
            RoleKind::Organizer => "Organizer",
            RoleKind::User => "User",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: Option<String>,
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        RoleKind::from_role_id(self.id)
    }
}

impl From<RolPayload> for Role {
    fn from(payload: RolPayload) -> Self {
        Self {
            id: payload.id_rol,
            name: payload.nombre.filter(|n| !n.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub role: Option<Role>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub interests: Vec<String>,
}

impl User {
    /// Validate a backend payload into a session user
    pub fn from_payload(payload: UsuarioPayload) -> Result<Self> {
        if payload.id_usuario <= 0 {
            return Err(PanoramaError::invalid_response(format!(
                "usuario has invalid id_usuario {}",
                payload.id_usuario
            )));
        }

        Ok(Self {
            id: payload.id_usuario,
            display_name: payload.nombre.unwrap_or_default(),
            email: payload.correo.unwrap_or_default(),
            role: payload.rol.map(Role::from),
            avatar_url: payload.avatar_url.filter(|url| !url.trim().is_empty()),
            bio: payload.bio,
            interests: payload.intereses.unwrap_or_default(),
        })
    }

    /// Missing role reads as a plain user
    pub fn role_kind(&self) -> RoleKind {
        self.role
            .as_ref()
            .map(Role::kind)
            .unwrap_or(RoleKind::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> UsuarioPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn role_ids_map_canonically() {
        assert_eq!(RoleKind::from_role_id(1), RoleKind::Administrator);
        assert_eq!(RoleKind::from_role_id(2), RoleKind::Organizer);
        assert_eq!(RoleKind::from_role_id(3), RoleKind::User);
        assert_eq!(RoleKind::from_role_id(42), RoleKind::User);
    }

    #[test]
    fn minimal_payload_is_accepted() {
        let user = User::from_payload(payload(serde_json::json!({
            "id_usuario": 1,
            "rol": {"id_rol": 1}
        })))
        .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.display_name, "");
        assert_eq!(user.role_kind(), RoleKind::Administrator);
        assert!(user.interests.is_empty());
    }

    #[test]
    fn full_payload_is_carried_over() {
        let user = User::from_payload(payload(serde_json::json!({
            "id_usuario": 9,
            "nombre": "Lucía",
            "correo": "lucia@test.com",
            "rol": {"id_rol": 2, "nombre": "organizador"},
            "avatar_url": "",
            "bio": "Promotora",
            "intereses": ["música", "teatro"]
        })))
        .unwrap();

        assert_eq!(user.email, "lucia@test.com");
        assert_eq!(user.role.as_ref().and_then(|r| r.name.as_deref()), Some("organizador"));
        assert_eq!(user.role_kind(), RoleKind::Organizer);
        assert!(user.avatar_url.is_none());
        assert_eq!(user.interests, vec!["música", "teatro"]);
    }

    #[test]
    fn missing_role_is_plain_user() {
        let user = User::from_payload(payload(serde_json::json!({"id_usuario": 4, "rol": null}))).unwrap();
        assert_eq!(user.role_kind(), RoleKind::User);
    }

    #[test]
    fn non_positive_id_is_rejected() {
        let result = User::from_payload(payload(serde_json::json!({"id_usuario": 0})));
        assert!(result.is_err());
    }
}

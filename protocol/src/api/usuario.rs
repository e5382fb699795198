//! Current-user profile DTOs

use serde::{Deserialize, Serialize};

pub use crate::common::UsuarioPayload;

/// `GET /usuarios/yo` response
///
/// Some deployments wrap the user in a one-element array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileResponse {
    One(UsuarioPayload),
    Many(Vec<UsuarioPayload>),
}

impl ProfileResponse {
    /// The user this response describes, if any
    pub fn into_usuario(self) -> Option<UsuarioPayload> {
        match self {
            ProfileResponse::One(usuario) => Some(usuario),
            ProfileResponse::Many(list) => list.into_iter().next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_object() {
        let parsed: ProfileResponse =
            serde_json::from_str(r#"{"id_usuario":7,"nombre":"Ana"}"#).unwrap();
        let usuario = parsed.into_usuario().unwrap();
        assert_eq!(usuario.id_usuario, 7);
        assert_eq!(usuario.nombre.as_deref(), Some("Ana"));
    }

    #[test]
    fn accepts_array_and_takes_first() {
        let parsed: ProfileResponse =
            serde_json::from_str(r#"[{"id_usuario":3},{"id_usuario":4}]"#).unwrap();
        assert_eq!(parsed.into_usuario().map(|u| u.id_usuario), Some(3));
    }

    #[test]
    fn empty_array_has_no_user() {
        let parsed: ProfileResponse = serde_json::from_str("[]").unwrap();
        assert!(parsed.into_usuario().is_none());
    }

    #[test]
    fn rejects_payload_without_id() {
        assert!(serde_json::from_str::<ProfileResponse>(r#"{"nombre":"Ana"}"#).is_err());
    }
}

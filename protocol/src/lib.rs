//! Wire types for the Panorama REST backend
//!
//! Field names follow the backend's JSON exactly (`correo`, `contrasena`,
//! `id_usuario`, camelCase token fields). Client code converts these into
//! its own domain types after validation.

pub mod api;
pub mod common;

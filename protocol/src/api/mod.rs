//! API DTOs module
//!
//! - `auth`: login, registration and token refresh
//! - `usuario`: current-user profile

pub mod auth;
pub mod usuario;

pub use auth::*;
pub use usuario::*;

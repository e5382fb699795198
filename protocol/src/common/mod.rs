pub mod auth;
pub mod usuario;

pub use auth::*;
pub use usuario::*;

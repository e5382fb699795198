//! Panorama session client
//!
//! Credential storage, a token-refreshing API client, the session
//! synchronizer and role-based routing for the Panorama events platform.
//!
//! ```no_run
//! use std::sync::Arc;
//! use panorama::{AuthService, ClientConfig, RecordingNavigator};
//!
//! # async fn run() -> panorama::Result<()> {
//! let config = ClientConfig::builder().from_environment().build()?;
//! let auth = AuthService::from_config(config, Arc::new(RecordingNavigator::new()))?;
//! auth.initialize_session().await;
//! if !auth.session().is_authenticated() {
//!     auth.login("user@test.com", "secret").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod navigation;
pub mod routing;
pub mod session;
pub mod store;
pub mod user;
pub mod version;

#[cfg(test)]
mod tests;

pub use auth::AuthService;
pub use client::{ApiClient, ApiReply, ApiRequest, HttpTransport, Transport};
pub use config::{AppEnvironment, ClientConfig, ClientConfigBuilder, TokenStorageConfig};
pub use error::{ErrorCode, PanoramaError, Result};
pub use navigation::{NavigationMode, Navigator, RecordingNavigator};
pub use routing::{guard, redirect_target, Access, Route, Section};
pub use session::{SessionManager, SessionSnapshot, SessionState};
pub use store::{CredentialStore, CredentialStoreConfig, StoredCredential, TokenPair};
pub use user::{Role, RoleKind, User};

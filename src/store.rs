//! Credential store for the Panorama session client
//!
//! Holds the access/refresh token pair as cookie-shaped records (name,
//! value, path, expiry, `secure`, `SameSite`). The store is the single
//! source of the bearer token: the HTTP client asks it for the
//! `Authorization` value on every request instead of keeping a default
//! header of its own.
//!
//! Every mutation is announced on a `watch` channel carrying the current
//! access token, so the session can follow refreshes and sign-outs made by
//! the HTTP client.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{PanoramaError, Result};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Access tokens live for one hour
pub const ACCESS_TOKEN_MAX_AGE_SECS: i64 = 3600;
/// Refresh tokens live for seven days
pub const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 604_800;

pub const COOKIE_PATH: &str = "/";

/// Access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<panorama_protocol::common::TokenPairPayload> for TokenPair {
    fn from(payload: panorama_protocol::common::TokenPairPayload) -> Self {
        Self {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// One persisted credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub expires_at: DateTime<Utc>,
}

impl StoredCredential {
    fn new(name: &str, value: &str, max_age_secs: i64, secure: bool, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: COOKIE_PATH.to_string(),
            secure,
            same_site: SameSite::Strict,
            expires_at: now + Duration::seconds(max_age_secs),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Seconds left before expiry, zero once expired
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Default)]
pub struct CredentialStoreConfig {
    /// JSON file backing the store, memory-only when `None`
    pub storage_path: Option<PathBuf>,
    /// Mark credentials `secure` (production)
    pub secure: bool,
}

impl CredentialStoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }
}

impl From<&ClientConfig> for CredentialStoreConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            storage_path: config.token_storage.resolved_path(),
            secure: config.environment.secure_cookies(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialJar {
    #[serde(default)]
    credentials: BTreeMap<String, StoredCredential>,
}

/// Cookie-style store for the session token pair
#[derive(Debug)]
pub struct CredentialStore {
    config: CredentialStoreConfig,
    jar: Mutex<CredentialJar>,
    changes: watch::Sender<Option<String>>,
}

impl CredentialStore {
    pub fn new(config: CredentialStoreConfig) -> Result<Self> {
        let jar = match &config.storage_path {
            Some(path) => load_jar(path)?,
            None => CredentialJar::default(),
        };

        Ok(Self::with_jar(config, jar))
    }

    pub fn in_memory() -> Self {
        Self::with_jar(CredentialStoreConfig::in_memory(), CredentialJar::default())
    }

    fn with_jar(config: CredentialStoreConfig, jar: CredentialJar) -> Self {
        let now = Utc::now();
        let access = jar
            .credentials
            .get(ACCESS_TOKEN_COOKIE)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.value.clone());
        let (changes, _) = watch::channel(access);

        Self {
            config,
            jar: Mutex::new(jar),
            changes,
        }
    }

    /// Follow the access token across every store mutation
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_COOKIE)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_COOKIE)
    }

    /// Persist the access token for one hour, or delete it on `None`
    pub fn set_access_token(&self, token: Option<&str>) -> Result<()> {
        self.update(|jar| self.put(jar, ACCESS_TOKEN_COOKIE, token, ACCESS_TOKEN_MAX_AGE_SECS))
    }

    /// Persist the refresh token for seven days, or delete it on `None`
    pub fn set_refresh_token(&self, token: Option<&str>) -> Result<()> {
        self.update(|jar| self.put(jar, REFRESH_TOKEN_COOKIE, token, REFRESH_TOKEN_MAX_AGE_SECS))
    }

    /// Persist both tokens in one write
    pub fn set_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.update(|jar| {
            self.put(
                jar,
                ACCESS_TOKEN_COOKIE,
                Some(&tokens.access_token),
                ACCESS_TOKEN_MAX_AGE_SECS,
            );
            self.put(
                jar,
                REFRESH_TOKEN_COOKIE,
                Some(&tokens.refresh_token),
                REFRESH_TOKEN_MAX_AGE_SECS,
            );
        })
    }

    /// Drop both tokens. Safe to call on an empty store.
    pub fn clear_auth_tokens(&self) -> Result<()> {
        self.update(|jar| {
            jar.credentials.remove(ACCESS_TOKEN_COOKIE);
            jar.credentials.remove(REFRESH_TOKEN_COOKIE);
        })?;
        debug!("Cleared stored credentials");
        Ok(())
    }

    /// `Bearer <access token>` when an access token is present
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token().map(|token| format!("Bearer {}", token))
    }

    /// Live credentials, expired ones filtered out
    pub fn credentials(&self) -> Vec<StoredCredential> {
        let now = Utc::now();
        self.lock()
            .credentials
            .values()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect()
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.config.storage_path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, CredentialJar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        self.lock()
            .credentials
            .get(name)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.value.clone())
    }

    /// Apply a mutation, persist it and announce the resulting access token
    ///
    /// The in-memory jar keeps the change even when the write fails.
    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialJar),
    {
        let persisted = {
            let mut jar = self.lock();
            apply(&mut *jar);
            self.persist(&jar)
        };
        self.changes.send_replace(self.access_token());
        persisted
    }

    fn put(&self, jar: &mut CredentialJar, name: &str, token: Option<&str>, max_age_secs: i64) {
        match token {
            Some(value) => {
                let credential =
                    StoredCredential::new(name, value, max_age_secs, self.config.secure, Utc::now());
                jar.credentials.insert(name.to_string(), credential);
            }
            None => {
                jar.credentials.remove(name);
            }
        }
    }

    fn persist(&self, jar: &CredentialJar) -> Result<()> {
        let Some(path) = &self.config.storage_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PanoramaError::io_from_error("Failed to create credential directory", e)
            })?;
        }

        // A crash mid-write leaves the previous jar intact.
        let staging = staging_path(path);
        let content = serde_json::to_string_pretty(jar)?;
        fs::write(&staging, content)
            .map_err(|e| PanoramaError::io_from_error("Failed to write credential storage", e))?;
        fs::rename(&staging, path)
            .map_err(|e| PanoramaError::io_from_error("Failed to replace credential storage", e))?;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staging = OsString::from(path.as_os_str());
    staging.push(".tmp");
    PathBuf::from(staging)
}

fn load_jar(path: &Path) -> Result<CredentialJar> {
    if !path.exists() {
        return Ok(CredentialJar::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| PanoramaError::io_from_error("Failed to read credential storage", e))?;

    if content.trim().is_empty() {
        return Ok(CredentialJar::default());
    }

    let mut jar = match serde_json::from_str::<CredentialJar>(&content) {
        Ok(jar) => jar,
        Err(e) => {
            warn!("Ignoring unreadable credential storage {}: {}", path.display(), e);
            return Ok(CredentialJar::default());
        }
    };

    let now = Utc::now();
    jar.credentials.retain(|_, c| !c.is_expired_at(now));
    Ok(jar)
}

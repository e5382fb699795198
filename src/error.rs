//! Unified error handling for the Panorama session client
//!
//! Every error carries a stable code in the format `PXXX`:
//! - P1XX: Authentication and session errors
//! - P2XX: Network and API errors
//! - P3XX: File and I/O errors
//! - P4XX: Configuration errors
//! - P5XX: Validation and input errors
//! - P8XX: UI and interaction errors
//! - P9XX: Serialization errors

use std::fmt;
use thiserror::Error;

/// Unified Result type for all Panorama operations
pub type Result<T> = std::result::Result<T, PanoramaError>;

/// Error codes for Panorama operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (P1XX)
    /// P101: Login rejected by the backend
    InvalidCredentials,
    /// P102: Registration rejected by the backend
    RegistrationRejected,
    /// P103: Session could not be kept alive
    SessionExpired,
    /// P104: Request rejected with 401
    Unauthorized,
    /// P105: Request rejected with 403
    Forbidden,

    // Network (P2XX)
    /// P201: HTTP request failed
    HttpError,
    /// P202: Connection timeout
    ConnectionTimeout,
    /// P203: Connection refused
    ConnectionRefused,
    /// P204: API returned error response
    ApiError,
    /// P205: Invalid API response format
    InvalidResponse,

    // File/IO (P3XX)
    /// P301: File not found
    FileNotFound,
    /// P302: File read error
    FileReadError,
    /// P303: File write error
    FileWriteError,

    // Configuration (P4XX)
    /// P401: Configuration error
    ConfigError,
    /// P402: Invalid endpoint
    InvalidEndpoint,

    // Validation (P5XX)
    /// P501: Invalid input
    InvalidInput,
    /// P502: Validation failed
    ValidationFailed,

    // UI (P8XX)
    /// P801: Dialog error
    DialogError,
    /// P802: User cancelled
    UserCancelled,

    // Serialization (P9XX)
    /// P902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::InvalidCredentials => 101,
            ErrorCode::RegistrationRejected => 102,
            ErrorCode::SessionExpired => 103,
            ErrorCode::Unauthorized => 104,
            ErrorCode::Forbidden => 105,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 203,
            ErrorCode::ApiError => 204,
            ErrorCode::InvalidResponse => 205,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::DialogError => 801,
            ErrorCode::UserCancelled => 802,

            ErrorCode::SerializationError => 902,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.code())
    }
}

/// Main error type for all Panorama operations
#[derive(Error, Debug)]
pub enum PanoramaError {
    // ==================== Authentication Errors (P1XX) ====================
    /// Login rejected
    #[error("[{code}] Invalid credentials: {message}")]
    InvalidCredentials { code: ErrorCode, message: String },

    /// Registration rejected (duplicate email and friends)
    #[error("[{code}] Registration failed: {message}")]
    Registration { code: ErrorCode, message: String },

    /// Profile fetch or token refresh failed for good
    #[error("[{code}] Session expired: {message}")]
    SessionExpired { code: ErrorCode, message: String },

    // ==================== Network Errors (P2XX) ====================
    /// Transport-level failure
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// API error with status code
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    // ==================== File/IO Errors (P3XX) ====================
    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (P4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (P5XX) ====================
    /// Validation error
    #[error("[{code}] Validation error: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        field: Option<String>,
    },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== UI Errors (P8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Serialization Errors (P9XX) ====================
    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl PanoramaError {
    // --- Authentication ---

    /// Create invalid credentials error
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            code: ErrorCode::InvalidCredentials,
            message: message.into(),
        }
    }

    /// Create registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            code: ErrorCode::RegistrationRejected,
            message: message.into(),
        }
    }

    /// Create session expired error
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired {
            code: ErrorCode::SessionExpired,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from message
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            code: ErrorCode::HttpError,
            message: message.into(),
            source: None,
        }
    }

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error, picking the code from the status
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            _ => ErrorCode::ApiError,
        };
        Self::Api {
            code,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status: 0,
            message: message.into(),
        }
    }

    // --- File/IO ---

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::FileWriteError,
            _ => ErrorCode::FileReadError,
        };

        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error with source
    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Validation ---

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- UI ---

    /// Create user cancelled error
    pub fn user_cancelled() -> Self {
        Self::Ui {
            code: ErrorCode::UserCancelled,
            message: "Operation cancelled by user".to_string(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCredentials { code, .. } => *code,
            Self::Registration { code, .. } => *code,
            Self::SessionExpired { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// HTTP status carried by this error, if it came from an API reply
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } if *status != 0 => Some(*status),
            _ => None,
        }
    }

    /// Check if the backend rejected the request with 401
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Check if the backend rejected the request with any 4xx status
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// Check if this is an authentication or session error
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::SessionExpired { .. }
        ) || matches!(self.status(), Some(401) | Some(403))
    }

    /// Check if this is a network error
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for PanoramaError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for PanoramaError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for PanoramaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for PanoramaError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

impl From<validator::ValidationErrors> for PanoramaError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
            field,
        }
    }
}

impl From<dialoguer::Error> for PanoramaError {
    fn from(err: dialoguer::Error) -> Self {
        let dialoguer::Error::IO(io) = err;
        if io.kind() == std::io::ErrorKind::Interrupted {
            return Self::user_cancelled();
        }
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", io),
        }
    }
}

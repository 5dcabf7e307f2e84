use serde::Serialize;
use thiserror::Error;

/// Errors that abort startup or the serving loop
#[derive(Error, Debug)]
pub enum CareHubError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server lifecycle errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Database bootstrap errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used when logging process-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Server,
    Database,
    Configuration,
    Internal,
}

impl CareHubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CareHubError::NetworkError(_) => ErrorKind::Network,
            CareHubError::ServerError(_) => ErrorKind::Server,
            CareHubError::DatabaseError(_) => ErrorKind::Database,
            CareHubError::ConfigError(_) => ErrorKind::Configuration,
            CareHubError::InternalError(_) | CareHubError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Stable code from [`crate::codes`] for this failure
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Database => crate::codes::database::CONNECTION_FAILED,
            _ => crate::codes::system::INTERNAL,
        }
    }
}

/// Result type alias for CareHub process-level operations
pub type Result<T> = std::result::Result<T, CareHubError>;

/// Log a process-level error with its classification
pub fn log_error(context: &str, error: &CareHubError) {
    tracing::error!(
        context = context,
        error_kind = ?error.kind(),
        error_code = error.code(),
        error = %error,
        "CareHub error occurred"
    );
}

use crate::handle::HandleType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlapiError>;

/// All failures surfaced by the client runtime. Every variant carries a
/// human-readable message suitable for printing as `Error: <message>`.
#[derive(Debug, Error)]
pub enum FlapiError {
    #[error("cannot connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("cannot launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("timed out waiting for server")]
    Timeout,

    /// Server-reported failure that has no more specific mapping.
    #[error("server error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("expected a {expected} handle, got {found}")]
    TypeMismatch {
        expected: HandleType,
        found: HandleType,
    },

    #[error("render processor is already running a job")]
    AlreadyRunning,

    /// Handle was released, or belongs to a session that has been closed.
    #[error("stale handle: {0}")]
    StaleHandle(String),

    #[error("operation cancelled")]
    Cancelled,

    /// Reply from the server did not have the shape we expect.
    #[error("malformed server reply: {0}")]
    Protocol(String),
}

// Error codes the service uses for business failures the client can type.
pub(crate) const CODE_NOT_FOUND: i64 = 404;
pub(crate) const CODE_PERMISSION: i64 = 403;
pub(crate) const CODE_BUSY: i64 = 409;
pub(crate) const CODE_BAD_OPTIONS: i64 = 422;

impl FlapiError {
    /// Map a server-reported error reply onto the typed taxonomy.
    pub(crate) fn from_remote(code: i64, message: String) -> Self {
        match code {
            CODE_NOT_FOUND => FlapiError::NotFound(message),
            CODE_PERMISSION => FlapiError::Permission(message),
            CODE_BUSY => FlapiError::AlreadyRunning,
            CODE_BAD_OPTIONS => FlapiError::InvalidOptions(message),
            _ => FlapiError::Remote { code, message },
        }
    }
}

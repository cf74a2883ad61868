//! SSH-specific error types

use thiserror::Error;
use std::io;
use std::time::Duration;

/// Transport-specific errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// SSH connection error
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// The remote host rejected the offered credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Timeout error
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Command issued before a successful `connect`
    #[error("Not connected")]
    NotConnected,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransportError {
    /// Whether the failure was a credential rejection
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

#[cfg(feature = "ssh2")]
impl From<ssh2::Error> for TransportError {
    fn from(err: ssh2::Error) -> Self {
        match err.code() {
            ssh2::ErrorCode::Session(code)
                if code == LIBSSH2_ERROR_AUTHENTICATION_FAILED
                    || code == LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED =>
            {
                Self::Authentication(err.message().to_string())
            }
            ssh2::ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => Self::Connection(format!("timed out: {}", err.message())),
            _ => Self::Connection(err.message().to_string()),
        }
    }
}

#[cfg(feature = "ssh2")]
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
#[cfg(feature = "ssh2")]
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;
#[cfg(feature = "ssh2")]
const LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED: i32 = -19;

//! Error types for configuration parsing

use thiserror::Error;

/// Configuration parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A line could not be interpreted in its position
    #[error("Malformed config at line {line}: {reason}")]
    MalformedConfig {
        /// One-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// A remote URL did not have the `user@host:path` shape
    #[error("Malformed remote URL: {0}")]
    MalformedRemoteUrl(String),
}

impl ConfigError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedConfig {
            line,
            reason: reason.into(),
        }
    }
}

//! # Webbynode Config
//!
//! Readers for the local files a webbynode application directory carries:
//! the git configuration (`.git/config`) and the provisioning marker file
//! (`.pushand`).

#![warn(missing_docs)]

/// Structured (git-config style) parser
pub mod git_config;

/// Provisioning marker extraction
pub mod marker;

/// `user@host:path` remote URL splitting
pub mod remote_url;

/// Error types for configuration parsing
pub mod error;

pub use git_config::{parse_structured_config, ParsedConfig, Section};
pub use marker::{extract_marker, PUSHAND_DIRECTIVE};
pub use remote_url::RemoteUrl;
pub use error::ConfigError;

/// Result type alias for configuration parsing
pub type Result<T> = std::result::Result<T, ConfigError>;

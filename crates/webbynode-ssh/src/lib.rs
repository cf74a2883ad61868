//! # Webbynode SSH Transport
//!
//! Remote shell transports used to run commands on a Webby.

#![warn(missing_docs)]

/// Transport abstraction and the `ssh` subprocess implementation
pub mod transport;

/// Authenticated libssh2 session wrapper
#[cfg(feature = "ssh2")]
pub mod connection;

/// libssh2-backed transport
#[cfg(feature = "ssh2")]
pub mod libssh2;

/// SSH-specific error types
pub mod error;

pub use transport::{
    CommandOutput, ConnectionInfo, Credentials, HostKeyPolicy, SshConfig, StdioTransport, Transport, TransportType,
};
#[cfg(feature = "ssh2")]
pub use connection::Connection;
#[cfg(feature = "ssh2")]
pub use libssh2::Ssh2Transport;
pub use error::TransportError;

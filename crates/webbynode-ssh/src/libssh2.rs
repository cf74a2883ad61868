//! Transport built on libssh2

use async_trait::async_trait;
use crate::{CommandOutput, Connection, ConnectionInfo, Credentials, SshConfig, Transport, TransportError, TransportType};
use std::time::Duration;
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// SSH transport that keeps one authenticated libssh2 session open.
///
/// Supports both key and password authentication. Every blocking libssh2 call
/// runs on tokio's blocking pool and is bounded by the configured timeouts.
pub struct Ssh2Transport {
    /// SSH configuration
    config: SshConfig,
    /// Authenticated session, once connected
    connection: Option<Connection>,
}

impl Ssh2Transport {
    /// Create a new libssh2 transport
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }
}

/// Extra time the worker gets to close a command that hit its own deadline
const EXEC_GRACE: Duration = Duration::from_secs(5);

/// Run blocking libssh2 work off the async thread, bounded by `limit`
async fn blocking<T, F>(limit: Duration, work: F) -> Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
{
    timeout(limit, task::spawn_blocking(work))
        .await
        .map_err(|_| TransportError::Timeout(limit))?
        .map_err(|e| TransportError::Connection(format!("SSH worker failed: {}", e)))?
}

#[async_trait]
impl Transport for Ssh2Transport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        if self.connection.is_some() {
            return Ok(());
        }

        info!("Connecting to {}@{}:{}", self.config.username, self.config.host, self.config.port);

        let config = self.config.clone();
        let credentials = credentials.clone();
        let connection = blocking(self.config.connect_timeout(), move || {
            Connection::open(&config, &credentials)
        })
        .await?;

        self.connection = Some(connection);
        info!("Successfully connected to {}@{}", self.config.username, self.config.host);
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandOutput, TransportError> {
        let connection = self.connection.clone().ok_or(TransportError::NotConnected)?;
        debug!("Executing SSH command: {}", command);

        let command = command.to_string();
        let limit = self.config.command_timeout();
        blocking(limit + EXEC_GRACE, move || connection.exec(&command, limit)).await
    }

    fn supports_password(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            host: self.config.host.clone(),
            port: self.config.port,
            username: self.config.username.clone(),
            transport_type: TransportType::SshLibssh2,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(connection) = self.connection.take() {
            debug!("Closing SSH connection");
            if let Err(e) = blocking(self.config.connect_timeout(), move || connection.disconnect()).await {
                warn!("Failed to disconnect cleanly: {}", e);
            }
        }
        Ok(())
    }
}

//! Remote session with password fallback

use crate::{Result, WebbynodeError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webbynode_ssh::{CommandOutput, ConnectionInfo, Credentials, Transport, TransportError};

/// Text the remote shell prints when `cd` targets a missing directory
pub const MISSING_DIRECTORY: &str = "No such file or directory";

/// Source of the password used when key authentication is rejected
pub trait PasswordPrompt: Send + Sync {
    /// Ask for the password of `user` on `host`
    fn password(&self, user: &str, host: &str) -> Result<String>;
}

/// Session status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No connection attempted yet
    Idle,
    /// Authenticated and ready
    Connected,
    /// Closed by the caller
    Closed,
    /// Connecting failed
    Failed(String),
}

/// Session state information
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Unique session ID
    pub id: Uuid,
    /// Connection information of the bound host
    pub connection_info: ConnectionInfo,
    /// Current session status
    pub status: SessionStatus,
}

/// One connection to one Webby, opened on first use.
///
/// Key authentication is tried first. If the host rejects it, the prompt is
/// asked for a password and connecting is retried exactly once.
pub struct RemoteSession {
    state: SessionState,
    transport: Box<dyn Transport>,
    prompt: Arc<dyn PasswordPrompt>,
}

impl RemoteSession {
    /// Create a session over `transport`; nothing is opened yet
    pub fn new(transport: Box<dyn Transport>, prompt: Arc<dyn PasswordPrompt>) -> Self {
        let state = SessionState {
            id: Uuid::new_v4(),
            connection_info: transport.connection_info(),
            status: SessionStatus::Idle,
        };
        Self {
            state,
            transport,
            prompt,
        }
    }

    /// Get session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Host this session is bound to
    pub fn host(&self) -> &str {
        &self.state.connection_info.host
    }

    /// Open the connection if it is not open yet
    pub async fn connect(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }

        let result = self.authenticate().await;
        self.state.status = match &result {
            Ok(()) => SessionStatus::Connected,
            Err(e) => SessionStatus::Failed(e.to_string()),
        };
        result
    }

    async fn authenticate(&mut self) -> Result<()> {
        let user = self.state.connection_info.username.clone();
        let host = self.state.connection_info.host.clone();
        info!("Opening session {} to {}@{}", self.state.id, user, host);

        let rejected = match self.transport.connect(&Credentials::Key).await {
            Ok(()) => return Ok(()),
            Err(TransportError::Authentication(reason)) => reason,
            Err(e) => return Err(e.into()),
        };
        debug!("Key authentication rejected: {}", rejected);

        if !self.transport.supports_password() {
            return Err(WebbynodeError::AuthenticationFailed { user, host });
        }

        let password = self.prompt.password(&user, &host)?;
        match self.transport.connect(&Credentials::Password(password)).await {
            Ok(()) => Ok(()),
            Err(TransportError::Authentication(reason)) => {
                warn!("Password authentication rejected: {}", reason);
                Err(WebbynodeError::AuthenticationFailed { user, host })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `command` as-is and return its output
    pub async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        self.connect().await?;
        debug!("Session {} executing: {}", self.state.id, command);
        Ok(self.transport.execute(command).await?)
    }

    /// Run `command` and return stdout without its trailing line break
    pub async fn run_and_return(&mut self, command: &str) -> Result<String> {
        let output = self.execute(command).await?;
        Ok(output.stdout_trimmed().to_string())
    }

    /// Run `command` inside the application directory.
    ///
    /// A `cd` probe runs first; if the directory is missing the command is not
    /// run and [`WebbynodeError::ApplicationNotDeployed`] is returned.
    pub async fn execute_in(&mut self, remote_path: &str, command: &str) -> Result<CommandOutput> {
        let cd = format!("cd {}", shell_quote(remote_path));

        let probe = self.execute(&cd).await?;
        if probe.combined().contains(MISSING_DIRECTORY) {
            return Err(WebbynodeError::ApplicationNotDeployed);
        }

        self.execute(&format!("{} && {}", cd, command)).await
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            info!("Closing session {}", self.state.id);
            self.transport.close().await?;
        }
        self.state.status = SessionStatus::Closed;
        Ok(())
    }
}

/// Quote `value` for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-/~+".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

//! Transport abstraction and implementations

use async_trait::async_trait;
use crate::TransportError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// Transport abstraction for running commands on a remote host
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open and authenticate the connection with the given credentials.
    ///
    /// Calling this on an already connected transport is a no-op.
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError>;

    /// Run a single command and capture its output
    async fn execute(&mut self, command: &str) -> Result<CommandOutput, TransportError>;

    /// Whether [`Credentials::Password`] can be offered to this transport
    fn supports_password(&self) -> bool;

    /// Whether `connect` has succeeded
    fn is_connected(&self) -> bool;

    /// Get connection information
    fn connection_info(&self) -> ConnectionInfo;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Credentials offered during authentication
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Password-less key authentication (agent or key files)
    Key,
    /// Password for the configured username
    Password(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key => f.write_str("Key"),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
        }
    }
}

/// Captured output of a remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit status reported by the remote side
    pub exit_code: i32,
}

impl CommandOutput {
    /// Create output with only stdout and a zero exit status
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }

    /// Stdout without its trailing line break
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout
            .strip_suffix('\n')
            .map(|s| s.strip_suffix('\r').unwrap_or(s))
            .unwrap_or(&self.stdout)
    }

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Connection information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Remote hostname or IP
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Username
    pub username: String,
    /// Connection type
    pub transport_type: TransportType,
}

/// Transport type enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportType {
    /// SSH with subprocess
    SshSubprocess,
    /// SSH with libssh2
    SshLibssh2,
    /// In-process double (for testing)
    Local,
}

/// How the server's host key is checked against `~/.ssh/known_hosts`.
///
/// A key that differs from the recorded one is always refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Record keys of hosts seen for the first time
    #[default]
    AcceptNew,
    /// Refuse hosts that are not already listed
    Strict,
}

impl HostKeyPolicy {
    /// Value for OpenSSH's `StrictHostKeyChecking` option
    pub fn ssh_option(self) -> &'static str {
        match self {
            Self::AcceptNew => "accept-new",
            Self::Strict => "yes",
        }
    }
}

/// SSH configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    /// Remote hostname or IP
    pub host: String,
    /// Remote port (default: 22)
    pub port: u16,
    /// Username
    pub username: String,
    /// SSH key path
    pub key_path: Option<PathBuf>,
    /// SSH options
    pub options: BTreeMap<String, String>,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Command timeout in seconds
    pub command_timeout: u64,
    /// Host key verification
    pub host_key_policy: HostKeyPolicy,
}

impl SshConfig {
    /// Connection timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Command timeout as a [`Duration`]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            username: "git".to_string(),
            key_path: None,
            options: BTreeMap::new(),
            connect_timeout: 30,
            command_timeout: 300,
            host_key_policy: HostKeyPolicy::default(),
        }
    }
}

/// Exit status the `ssh` client uses for its own failures
const SSH_CLIENT_FAILURE: i32 = 255;

/// SSH transport that shells out to the system `ssh` client.
///
/// Runs in batch mode, so only key authentication is available.
pub struct StdioTransport {
    /// SSH configuration
    config: SshConfig,
    /// Connection state
    connected: bool,
}

impl StdioTransport {
    /// Create a new stdio transport
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            connected: false,
        }
    }

    /// Build SSH command arguments
    fn build_ssh_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(), "BatchMode=yes".to_string(),
            "-o".to_string(), format!("StrictHostKeyChecking={}", self.config.host_key_policy.ssh_option()),
            "-o".to_string(), format!("ConnectTimeout={}", self.config.connect_timeout),
            "-p".to_string(), self.config.port.to_string(),
        ];

        // Add SSH key if specified
        if let Some(key_path) = &self.config.key_path {
            args.push("-i".to_string());
            args.push(key_path.to_string_lossy().to_string());
        }

        // Add custom options
        for (key, value) in &self.config.options {
            args.push("-o".to_string());
            args.push(format!("{}={}", key, value));
        }

        // Add target
        args.push(format!("{}@{}", self.config.username, self.config.host));

        args
    }

    /// Run one `ssh` invocation, bounded by `limit`
    async fn run_ssh(&self, command: &str, limit: Duration) -> Result<CommandOutput, TransportError> {
        let mut ssh_args = self.build_ssh_args();
        ssh_args.push(command.to_string());

        debug!("Executing SSH command: ssh {}", ssh_args.join(" "));

        let output = timeout(
            limit,
            Command::new("ssh").args(&ssh_args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| TransportError::Timeout(limit))?
        .map_err(|e| TransportError::Connection(format!("Failed to execute SSH: {}", e)))?;

        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if output.exit_code == SSH_CLIENT_FAILURE {
            return Err(classify_client_failure(&output.stderr));
        }

        Ok(output)
    }
}

fn classify_client_failure(stderr: &str) -> TransportError {
    let message = stderr.trim().to_string();
    if message.contains("Permission denied") {
        TransportError::Authentication(message)
    } else {
        TransportError::Connection(message)
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        if self.connected {
            return Ok(());
        }

        if let Credentials::Password(_) = credentials {
            return Err(TransportError::Authentication(
                "password authentication is not available with the ssh subprocess transport".to_string(),
            ));
        }

        info!("Connecting to {}@{}:{}", self.config.username, self.config.host, self.config.port);

        // Simple connectivity test
        let probe = self.run_ssh("echo 'connection_test'", self.config.connect_timeout()).await?;
        if !probe.stdout.contains("connection_test") {
            return Err(TransportError::Connection("Connection test failed".to_string()));
        }

        self.connected = true;
        info!("Successfully connected to {}@{}", self.config.username, self.config.host);
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandOutput, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.run_ssh(command, self.config.command_timeout()).await
    }

    fn supports_password(&self) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            host: self.config.host.clone(),
            port: self.config.port,
            username: self.config.username.clone(),
            transport_type: TransportType::SshSubprocess,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }
}

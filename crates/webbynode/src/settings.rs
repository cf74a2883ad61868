//! Runtime settings with environment overrides

use crate::{Result, WebbynodeError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use webbynode_ssh::{HostKeyPolicy, SshConfig, StdioTransport, Transport};

/// Which SSH implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// In-process libssh2 (supports password fallback)
    Ssh2,
    /// System `ssh` client in batch mode (key authentication only)
    Subprocess,
}

impl FromStr for TransportKind {
    type Err = WebbynodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssh2" | "libssh2" => Ok(Self::Ssh2),
            "subprocess" | "ssh" => Ok(Self::Subprocess),
            other => Err(WebbynodeError::Settings {
                name: "WEBBYNODE_TRANSPORT".to_string(),
                reason: format!("unknown transport {:?} (expected ssh2 or subprocess)", other),
            }),
        }
    }
}

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SSH implementation
    pub transport: TransportKind,
    /// Remote username (the Webby's git user)
    pub username: String,
    /// SSH port
    pub port: u16,
    /// Private key to use instead of the agent and default keys
    pub key_path: Option<PathBuf>,
    /// Bound on connecting and authenticating
    pub connect_timeout: Duration,
    /// Bound on each remote command
    pub command_timeout: Duration,
    /// Handling of hosts missing from `~/.ssh/known_hosts`
    pub host_key_policy: HostKeyPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transport: if cfg!(feature = "ssh2") {
                TransportKind::Ssh2
            } else {
                TransportKind::Subprocess
            },
            username: "git".to_string(),
            port: 22,
            key_path: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(300),
            host_key_policy: HostKeyPolicy::AcceptNew,
        }
    }
}

impl Settings {
    /// Defaults overridden by `WEBBYNODE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup("WEBBYNODE_TRANSPORT") {
            settings.transport = value.parse()?;
        }
        if let Some(value) = lookup("WEBBYNODE_USER").filter(|v| !v.trim().is_empty()) {
            settings.username = value.trim().to_string();
        }
        if let Some(value) = lookup("WEBBYNODE_SSH_PORT") {
            settings.port = parse_number("WEBBYNODE_SSH_PORT", &value)?;
        }
        if let Some(value) = lookup("WEBBYNODE_SSH_KEY").filter(|v| !v.trim().is_empty()) {
            settings.key_path = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = lookup("WEBBYNODE_CONNECT_TIMEOUT") {
            settings.connect_timeout = Duration::from_secs(parse_number("WEBBYNODE_CONNECT_TIMEOUT", &value)?);
        }
        if let Some(value) = lookup("WEBBYNODE_COMMAND_TIMEOUT") {
            settings.command_timeout = Duration::from_secs(parse_number("WEBBYNODE_COMMAND_TIMEOUT", &value)?);
        }
        if let Some(value) = lookup("WEBBYNODE_HOST_KEYS") {
            settings.host_key_policy = parse_host_key_policy(&value)?;
        }

        Ok(settings)
    }

    /// SSH configuration for `host`
    pub fn ssh_config(&self, host: &str) -> SshConfig {
        SshConfig {
            host: host.to_string(),
            port: self.port,
            username: self.username.clone(),
            key_path: self.key_path.clone(),
            connect_timeout: self.connect_timeout.as_secs(),
            command_timeout: self.command_timeout.as_secs(),
            host_key_policy: self.host_key_policy,
            ..Default::default()
        }
    }

    /// Build the configured transport for `host`
    pub fn build_transport(&self, host: &str) -> Result<Box<dyn Transport>> {
        let config = self.ssh_config(host);
        match self.transport {
            TransportKind::Subprocess => Ok(Box::new(StdioTransport::new(config))),
            #[cfg(feature = "ssh2")]
            TransportKind::Ssh2 => Ok(Box::new(webbynode_ssh::Ssh2Transport::new(config))),
            #[cfg(not(feature = "ssh2"))]
            TransportKind::Ssh2 => Err(WebbynodeError::Settings {
                name: "WEBBYNODE_TRANSPORT".to_string(),
                reason: "built without the ssh2 feature".to_string(),
            }),
        }
    }
}

fn parse_host_key_policy(value: &str) -> Result<HostKeyPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "accept-new" => Ok(HostKeyPolicy::AcceptNew),
        "strict" => Ok(HostKeyPolicy::Strict),
        other => Err(WebbynodeError::Settings {
            name: "WEBBYNODE_HOST_KEYS".to_string(),
            reason: format!("unknown policy {:?} (expected accept-new or strict)", other),
        }),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    let trimmed = value.trim();
    trimmed.parse().map_err(|_| WebbynodeError::Settings {
        name: name.to_string(),
        reason: format!("{:?} is not a valid number", trimmed),
    })
}

//! Shared helpers for webbynode integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use webbynode::ssh::{CommandOutput, ConnectionInfo, Credentials, SshConfig, Transport, TransportError, TransportType};
use webbynode::{PasswordPrompt, Result, VersionControl, WebbynodeError};

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Contents of a file under `tests/fixtures`
pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("fixture {}: {}", name, e))
}

/// An application directory with the given `.git/config` and `.pushand` fixtures
pub fn app_dir(git_config: Option<&str>, pushand: Option<&str>) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join(".git")).expect(".git");
    if let Some(name) = git_config {
        fs::write(dir.path().join(".git/config"), read_fixture(name)).expect(".git/config");
    }
    if let Some(name) = pushand {
        fs::write(dir.path().join(".pushand"), read_fixture(name)).expect(".pushand");
    }
    dir
}

/// Git client that reports a fixed remote list
pub struct StaticRemotes(pub Vec<String>);

impl StaticRemotes {
    pub fn webbynode() -> Arc<dyn VersionControl> {
        Arc::new(Self(vec!["origin".to_string(), "webbynode".to_string()]))
    }

    pub fn none() -> Arc<dyn VersionControl> {
        Arc::new(Self(Vec::new()))
    }
}

#[async_trait]
impl VersionControl for StaticRemotes {
    async fn remotes(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn add_remote(&self, _name: &str, _url: &str) -> Result<()> {
        Ok(())
    }
}

/// Prompt that must never be asked
pub struct NoPassword;

impl PasswordPrompt for NoPassword {
    fn password(&self, _user: &str, _host: &str) -> Result<String> {
        Err(WebbynodeError::Prompt("no terminal".to_string()))
    }
}

/// What the scripted transport saw
#[derive(Debug, Default)]
pub struct Journal {
    pub configs: Vec<SshConfig>,
    pub connects: usize,
    pub commands: Vec<String>,
}

/// Transport that answers each command with the next scripted output
pub struct ScriptedTransport {
    config: SshConfig,
    outputs: Vec<CommandOutput>,
    journal: Arc<Mutex<Journal>>,
    connected: bool,
}

impl ScriptedTransport {
    /// A factory suitable for `Context::with_transport_factory`
    pub fn factory(
        outputs: Vec<CommandOutput>,
        journal: Arc<Mutex<Journal>>,
    ) -> webbynode::context::TransportFactory {
        Box::new(move |config: SshConfig| {
            journal.lock().unwrap().configs.push(config.clone());
            Box::new(ScriptedTransport {
                config,
                outputs: outputs.iter().rev().cloned().collect(),
                journal: journal.clone(),
                connected: false,
            }) as Box<dyn Transport>
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, _credentials: &Credentials) -> std::result::Result<(), TransportError> {
        self.journal.lock().unwrap().connects += 1;
        self.connected = true;
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> std::result::Result<CommandOutput, TransportError> {
        self.journal.lock().unwrap().commands.push(command.to_string());
        Ok(self.outputs.pop().unwrap_or_default())
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
            transport_type: TransportType::Local,
        }
    }

    async fn close(&mut self) -> std::result::Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }
}

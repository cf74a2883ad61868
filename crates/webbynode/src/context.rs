//! Per-run execution context handed to handlers

use crate::{
    EnvironmentGuard, PasswordPrompt, RemoteEndpointResolver, RemoteSession, Result, Settings, VersionControl,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use webbynode_ssh::{CommandOutput, SshConfig, Transport};

/// Builds the transport for the resolved host
pub type TransportFactory = Box<dyn Fn(SshConfig) -> Box<dyn Transport> + Send + Sync>;

/// Produces the settings when a handler first needs them
pub type SettingsLoader = fn() -> Result<Settings>;

/// Everything a handler needs for one run.
///
/// Settings are loaded on first use, so commands that never reach the network
/// are not affected by invalid settings. The remote session is created on the
/// first remote command and reused for the rest of the run.
pub struct Context {
    root: PathBuf,
    settings: Option<Settings>,
    load_settings: SettingsLoader,
    vcs: Arc<dyn VersionControl>,
    guard: EnvironmentGuard,
    resolver: RemoteEndpointResolver,
    prompt: Arc<dyn PasswordPrompt>,
    transport_factory: Option<TransportFactory>,
    session: Option<RemoteSession>,
}

impl Context {
    /// Create a context for the application rooted at `root`
    pub fn new(
        root: impl Into<PathBuf>,
        settings: Settings,
        vcs: Arc<dyn VersionControl>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Self {
        let mut ctx = Self::deferred(root, Settings::from_env, vcs, prompt);
        ctx.settings = Some(settings);
        ctx
    }

    /// Create a context whose settings come from `load` on first use
    pub fn deferred(
        root: impl Into<PathBuf>,
        load: SettingsLoader,
        vcs: Arc<dyn VersionControl>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Self {
        let root = root.into();
        Self {
            guard: EnvironmentGuard::new(root.clone(), vcs.clone()),
            resolver: RemoteEndpointResolver::new(root.clone()),
            root,
            settings: None,
            load_settings: load,
            vcs,
            prompt,
            transport_factory: None,
            session: None,
        }
    }

    /// Build transports with `factory` instead of from the settings
    pub fn with_transport_factory(mut self, factory: TransportFactory) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    /// Application root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runtime settings, loaded on first call
    pub fn settings(&mut self) -> Result<&Settings> {
        let settings = match self.settings.take() {
            Some(settings) => settings,
            None => {
                let settings = (self.load_settings)()?;
                debug!("Loaded settings: {:?}", settings);
                settings
            }
        };
        Ok(self.settings.insert(settings))
    }

    /// Version-control client
    pub fn vcs(&self) -> Arc<dyn VersionControl> {
        self.vcs.clone()
    }

    /// Environment guard
    pub fn guard(&self) -> &EnvironmentGuard {
        &self.guard
    }

    /// Endpoint resolver
    pub fn resolver(&self) -> &RemoteEndpointResolver {
        &self.resolver
    }

    /// Fail unless the root is an initialized application
    pub async fn require_application_environment(&self, command: &str) -> Result<()> {
        self.guard.verify(command).await
    }

    /// The session, created for the resolved host on first use
    pub fn session(&mut self) -> Result<&mut RemoteSession> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let host = self.resolver.resolve_host()?.to_string();
                let settings = self.settings()?.clone();
                let transport = match &self.transport_factory {
                    Some(factory) => factory(settings.ssh_config(&host)),
                    None => settings.build_transport(&host)?,
                };
                debug!("Created session for {}", host);
                RemoteSession::new(transport, self.prompt.clone())
            }
        };

        Ok(self.session.insert(session))
    }

    /// Run `command` in the application directory on the Webby
    pub async fn run_remote_command(&mut self, command: &str) -> Result<CommandOutput> {
        let target = self.resolver.resolve()?;
        let session = self.session()?;
        session.execute_in(&target.remote_path, command).await
    }

    /// Close the session if one was opened
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.close().await?;
        }
        Ok(())
    }
}

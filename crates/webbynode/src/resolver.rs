//! Remote host and application path resolution

use crate::{Result, WebbynodeError, GIT_CONFIG_FILE, MARKER_FILE, REMOTE_NAME};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;
use webbynode_config::{extract_marker, parse_structured_config, RemoteUrl, PUSHAND_DIRECTIVE};

/// Where remote commands go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Webby host name or IP
    pub host: String,
    /// Application directory on the Webby
    pub remote_path: String,
}

/// Reads the Webby host from `.git/config` and the application directory from
/// `.pushand`.
///
/// Each value is read at most once per resolver; later calls return the cached
/// value even if the files change.
#[derive(Debug)]
pub struct RemoteEndpointResolver {
    root: PathBuf,
    host: OnceLock<String>,
    remote_path: OnceLock<String>,
}

impl RemoteEndpointResolver {
    /// Resolve relative to the application root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            host: OnceLock::new(),
            remote_path: OnceLock::new(),
        }
    }

    /// Application root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host part of `remote.webbynode.url`
    pub fn resolve_host(&self) -> Result<&str> {
        if let Some(host) = self.host.get() {
            return Ok(host);
        }
        let host = self.read_host()?;
        debug!("Resolved Webby host {}", host);
        Ok(self.host.get_or_init(|| host))
    }

    /// Application directory named in `.pushand`
    pub fn resolve_remote_path(&self) -> Result<&str> {
        if let Some(path) = self.remote_path.get() {
            return Ok(path);
        }
        let path = self.read_remote_path()?;
        debug!("Resolved remote application path {}", path);
        Ok(self.remote_path.get_or_init(|| path))
    }

    /// Both parts of the target
    pub fn resolve(&self) -> Result<RemoteTarget> {
        Ok(RemoteTarget {
            host: self.resolve_host()?.to_string(),
            remote_path: self.resolve_remote_path()?.to_string(),
        })
    }

    fn read_host(&self) -> Result<String> {
        let text = match std::fs::read_to_string(self.root.join(GIT_CONFIG_FILE)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(WebbynodeError::NoRemoteConfigured),
            Err(e) => return Err(e.into()),
        };

        let config = parse_structured_config(&text)?;
        let url = config
            .get("remote", Some(REMOTE_NAME), "url")
            .ok_or(WebbynodeError::NoRemoteConfigured)?;

        RemoteUrl::parse(url)
            .map(|remote| remote.host)
            .map_err(|_| WebbynodeError::MalformedRemoteUrl { url: url.to_string() })
    }

    fn read_remote_path(&self) -> Result<String> {
        let path = self.root.join(MARKER_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(WebbynodeError::MarkerNotFound { path }),
            Err(e) => return Err(e.into()),
        };

        extract_marker(&text, PUSHAND_DIRECTIVE)
            .map(str::to_string)
            .ok_or(WebbynodeError::MarkerNotFound { path })
    }
}

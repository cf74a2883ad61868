//! Version-control client

use async_trait::async_trait;
use crate::{Result, WebbynodeError};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// The git operations webbynode needs
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Names of the configured remotes
    async fn remotes(&self) -> Result<Vec<String>>;

    /// Create a repository in the working directory
    async fn init(&self) -> Result<()>;

    /// Add a remote
    async fn add_remote(&self, name: &str, url: &str) -> Result<()>;
}

/// [`VersionControl`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Run git inside `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working directory git runs in
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!("Running git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| WebbynodeError::LocalCommand {
                program: "git".to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(WebbynodeError::LocalCommand {
                program: format!("git {}", args.join(" ")),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn remotes(&self) -> Result<Vec<String>> {
        let listing = self.git(&["remote"]).await?;
        Ok(parse_remote_list(&listing))
    }

    async fn init(&self) -> Result<()> {
        self.git(&["init"]).await.map(|_| ())
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.git(&["remote", "add", name, url]).await.map(|_| ())
    }
}

/// One remote name per line, as printed by `git remote`
pub(crate) fn parse_remote_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_list() {
        assert_eq!(parse_remote_list("origin\nwebbynode\n"), vec!["origin", "webbynode"]);
        assert_eq!(parse_remote_list("\n  webbynode  \n\n"), vec!["webbynode"]);
        assert!(parse_remote_list("").is_empty());
    }

    #[tokio::test]
    async fn test_git_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path().join("missing"));
        let err = git.remotes().await.unwrap_err();
        assert!(matches!(err, WebbynodeError::LocalCommand { .. }));
    }
}

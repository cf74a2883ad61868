//! Application environment precondition checks

use crate::{Result, VersionControl, WebbynodeError, GIT_DIR, MARKER_FILE, REMOTE_NAME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Checks that a directory is an initialized webbynode application:
/// `.pushand` exists, `.git` exists and git lists a `webbynode` remote.
#[derive(Clone)]
pub struct EnvironmentGuard {
    root: PathBuf,
    vcs: Arc<dyn VersionControl>,
}

impl EnvironmentGuard {
    /// Guard the application rooted at `root`
    pub fn new(root: impl Into<PathBuf>, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            root: root.into(),
            vcs,
        }
    }

    /// Application root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether all three conditions hold
    pub async fn is_initialized(&self) -> bool {
        if !self.root.join(MARKER_FILE).is_file() {
            debug!("{} is missing", MARKER_FILE);
            return false;
        }
        if !self.root.join(GIT_DIR).is_dir() {
            debug!("{} is missing", GIT_DIR);
            return false;
        }
        match self.vcs.remotes().await {
            Ok(remotes) => {
                let found = remotes.iter().any(|remote| remote == REMOTE_NAME);
                if !found {
                    debug!("No {} remote among {:?}", REMOTE_NAME, remotes);
                }
                found
            }
            Err(e) => {
                warn!("Could not list git remotes: {}", e);
                false
            }
        }
    }

    /// Fail with [`WebbynodeError::NotInitializedEnvironment`] naming `command`
    /// unless the directory is initialized
    pub async fn verify(&self, command: &str) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(WebbynodeError::NotInitializedEnvironment {
                command: command.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fs;

    struct FixedRemotes(Result<Vec<String>>);

    #[async_trait]
    impl VersionControl for FixedRemotes {
        async fn remotes(&self) -> Result<Vec<String>> {
            match &self.0 {
                Ok(remotes) => Ok(remotes.clone()),
                Err(e) => Err(WebbynodeError::LocalCommand {
                    program: "git".to_string(),
                    message: e.to_string(),
                }),
            }
        }

        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn add_remote(&self, _name: &str, _url: &str) -> Result<()> {
            Ok(())
        }
    }

    fn remotes(names: &[&str]) -> Arc<dyn VersionControl> {
        Arc::new(FixedRemotes(Ok(names.iter().map(|n| n.to_string()).collect())))
    }

    fn app_dir(pushand: bool, git: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if pushand {
            fs::write(dir.path().join(MARKER_FILE), "phd $0 app\n").unwrap();
        }
        if git {
            fs::create_dir(dir.path().join(GIT_DIR)).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_initialized_environment() {
        let dir = app_dir(true, true);
        let guard = EnvironmentGuard::new(dir.path(), remotes(&["origin", "webbynode"]));
        assert!(guard.is_initialized().await);
        assert!(guard.verify("remote").await.is_ok());
    }

    #[tokio::test]
    async fn test_each_condition_is_required() {
        let cases = [
            (false, true, remotes(&["webbynode"])),
            (true, false, remotes(&["webbynode"])),
            (true, true, remotes(&["origin"])),
            (true, true, remotes(&["webbynode2"])),
            (
                true,
                true,
                Arc::new(FixedRemotes(Err(WebbynodeError::Usage("not a git repository".to_string()))))
                    as Arc<dyn VersionControl>,
            ),
        ];

        for (pushand, git, vcs) in cases {
            let dir = app_dir(pushand, git);
            let guard = EnvironmentGuard::new(dir.path(), vcs);
            let err = guard.verify("remote").await.unwrap_err();
            assert!(matches!(
                err,
                WebbynodeError::NotInitializedEnvironment { ref command } if command == "remote"
            ));
        }
    }

    #[tokio::test]
    async fn test_marker_must_be_a_file() {
        let dir = app_dir(false, true);
        fs::create_dir(dir.path().join(MARKER_FILE)).unwrap();
        let guard = EnvironmentGuard::new(dir.path(), remotes(&["webbynode"]));
        assert!(!guard.is_initialized().await);
    }
}

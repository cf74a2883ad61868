//! Splitting of scp-style git remote URLs

use crate::{ConfigError, Result};
use std::fmt;
use std::str::FromStr;

/// A git remote URL of the form `user@host:path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// Login user, e.g. `git`
    pub user: String,
    /// Host name or IP address
    pub host: String,
    /// Repository path on the host
    pub path: String,
}

impl RemoteUrl {
    /// Parse a `user@host:path` URL.
    ///
    /// The user is made of word characters. The host runs up to the last `:`
    /// so that the path is everything after it. All three parts must be
    /// non-empty.
    pub fn parse(url: &str) -> Result<Self> {
        let malformed = || ConfigError::MalformedRemoteUrl(url.to_string());

        let (user, rest) = url.split_once('@').ok_or_else(malformed)?;
        if user.is_empty() || !user.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(malformed());
        }

        let (host, path) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if host.is_empty() || path.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}

impl FromStr for RemoteUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_url() {
        let url = RemoteUrl::parse("git@67.23.79.32:test_app").unwrap();
        assert_eq!(url.user, "git");
        assert_eq!(url.host, "67.23.79.32");
        assert_eq!(url.path, "test_app");
        assert_eq!(url.to_string(), "git@67.23.79.32:test_app");
    }

    #[test]
    fn test_host_runs_to_last_colon() {
        let url: RemoteUrl = "git@[::1]:app".parse().unwrap();
        assert_eq!(url.host, "[::1]");
        assert_eq!(url.path, "app");
    }

    #[test]
    fn test_malformed_urls() {
        let cases = [
            "67.23.79.32:test_app",
            "@67.23.79.32:test_app",
            "git@67.23.79.32",
            "git@:test_app",
            "git@67.23.79.32:",
            "ssh://git@example.com/app.git",
            "",
        ];

        for case in cases {
            assert_eq!(
                RemoteUrl::parse(case),
                Err(ConfigError::MalformedRemoteUrl(case.to_string())),
                "expected {:?} to be rejected",
                case
            );
        }
    }
}

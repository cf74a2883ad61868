//! Error types for the webbynode library

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use webbynode_config::ConfigError;
use webbynode_ssh::TransportError;

/// Main error type for webbynode operations.
///
/// Display strings are written for the person at the terminal; the binary
/// prints them as-is.
#[derive(Debug, Error)]
pub enum WebbynodeError {
    /// `.git/config` has no `remote.webbynode.url`
    #[error("No \"webbynode\" git remote is configured. Run \"wn init\" first.")]
    NoRemoteConfigured,

    /// `remote.webbynode.url` is not of the form `user@host:path`
    #[error("The webbynode remote URL \"{url}\" is not of the form user@host:path.")]
    MalformedRemoteUrl {
        /// The offending URL
        url: String,
    },

    /// `.pushand` has no `phd $0 <path>` line
    #[error("Could not find the application directory in {}.", path.display())]
    MarkerNotFound {
        /// Marker file that was searched
        path: PathBuf,
    },

    /// The working directory is not a webbynode application
    #[error("You can only execute the \"{command}\" from inside a Webbynode initialized application.")]
    NotInitializedEnvironment {
        /// Command that was attempted
        command: String,
    },

    /// Both key and password authentication were rejected
    #[error("Authentication failed for {user}@{host}.")]
    AuthenticationFailed {
        /// Remote username
        user: String,
        /// Remote host
        host: String,
    },

    /// The application directory does not exist on the Webby
    #[error("Your application has not yet been deployed to your Webby.\nTo issue remote commands from the Webby, you must first push your application.")]
    ApplicationNotDeployed,

    /// The remote command ran and exited with a nonzero status
    #[error("Remote command exited with status {code}")]
    RemoteCommandFailed {
        /// Exit status reported by the Webby
        code: i32,
    },

    /// No handler is registered for the command
    #[error("Command \"{name}\" doesn't exist")]
    UnknownCommand {
        /// Command name as typed
        name: String,
    },

    /// Handler was invoked with unusable options
    #[error("{0}")]
    Usage(String),

    /// Local configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime settings are invalid
    #[error("Invalid setting {name}: {reason}")]
    Settings {
        /// Setting or environment variable
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Transport-level failure
    #[error("Remote connection error: {0}")]
    Transport(String),

    /// Timeout errors
    #[error("Timed out after {duration:?}")]
    Timeout {
        /// Duration that was exceeded
        duration: Duration,
    },

    /// Password prompt could not be shown
    #[error("Could not read password: {0}")]
    Prompt(String),

    /// Local command (e.g. `git`) failed
    #[error("{program} failed: {message}")]
    LocalCommand {
        /// Program that was run
        program: String,
        /// Its stderr or spawn error
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebbynodeError {
    /// Process exit status `wn` should end with for this error
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::RemoteCommandFailed { code } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

impl From<TransportError> for WebbynodeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(duration) => Self::Timeout { duration },
            TransportError::Io(e) => Self::Io(e),
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        let err = WebbynodeError::NotInitializedEnvironment {
            command: "remote".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "You can only execute the \"remote\" from inside a Webbynode initialized application."
        );

        let err = WebbynodeError::UnknownCommand {
            name: "thisdoesnotexist".to_string(),
        };
        assert_eq!(err.to_string(), "Command \"thisdoesnotexist\" doesn't exist");

        assert!(WebbynodeError::ApplicationNotDeployed
            .to_string()
            .contains("you must first push your application"));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(WebbynodeError::RemoteCommandFailed { code: 3 }.exit_status(), 3);
        assert_eq!(WebbynodeError::RemoteCommandFailed { code: 255 }.exit_status(), 255);
        assert_eq!(WebbynodeError::RemoteCommandFailed { code: -1 }.exit_status(), 1);
        assert_eq!(WebbynodeError::RemoteCommandFailed { code: 256 }.exit_status(), 1);
        assert_eq!(WebbynodeError::ApplicationNotDeployed.exit_status(), 1);
    }

    #[test]
    fn test_transport_error_mapping() {
        let err: WebbynodeError = TransportError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(err, WebbynodeError::Timeout { duration } if duration == Duration::from_secs(5)));

        let err: WebbynodeError = TransportError::Connection("refused".to_string()).into();
        assert!(matches!(err, WebbynodeError::Transport(msg) if msg.contains("refused")));
    }
}

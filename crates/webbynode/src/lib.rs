//! # Webbynode
//!
//! Maps a local git application directory to its Webby and runs commands there.
//!
//! A run goes through four steps: the [`dispatcher`] turns the argument vector
//! into a [`Command`] and picks a handler, the handler checks the directory with
//! the [`EnvironmentGuard`], the [`RemoteEndpointResolver`] reads the Webby's
//! address and application directory from `.git/config` and `.pushand`, and the
//! [`RemoteSession`] runs the command over SSH.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use webbynode_config as config;
pub use webbynode_ssh as ssh;

/// Error types for the webbynode library
pub mod error;

/// Argument grammar
pub mod command;

/// Handler registry and dispatch
pub mod dispatcher;

/// Remote host and application path resolution
pub mod resolver;

/// Application environment precondition checks
pub mod guard;

/// Version-control client
pub mod vcs;

/// Remote session with password fallback
pub mod session;

/// Runtime settings
pub mod settings;

/// Per-run execution context handed to handlers
pub mod context;

pub use error::WebbynodeError;
pub use command::{Command, Invocation, NamedOptions, OptionValue};
pub use dispatcher::{handler_name, DispatchOutcome, Dispatcher, Handler};
pub use resolver::{RemoteEndpointResolver, RemoteTarget};
pub use guard::EnvironmentGuard;
pub use vcs::{GitCli, VersionControl};
pub use session::{PasswordPrompt, RemoteSession, SessionState, SessionStatus};
pub use settings::{Settings, TransportKind};
pub use context::Context;

/// Name of the git remote that points at the Webby
pub const REMOTE_NAME: &str = "webbynode";

/// Provisioning marker file, relative to the application root
pub const MARKER_FILE: &str = ".pushand";

/// Git directory, relative to the application root
pub const GIT_DIR: &str = ".git";

/// Git configuration file, relative to the application root
pub const GIT_CONFIG_FILE: &str = ".git/config";

/// Result type alias for webbynode operations
pub type Result<T> = std::result::Result<T, WebbynodeError>;

//! Authenticated libssh2 session management

use crate::{CommandOutput, Credentials, HostKeyPolicy, SshConfig, TransportError};
use ssh2::{CheckResult, Channel, KnownHostFileKind, Session, Stream};
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Pause between polls when neither stream had data
const IDLE_POLL: Duration = Duration::from_millis(20);

/// An authenticated SSH session.
///
/// Cheap to clone; clones share the underlying session. All methods block and
/// are meant to run on a blocking thread.
#[derive(Clone)]
pub struct Connection {
    session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

impl Connection {
    /// Connect, handshake and authenticate
    pub fn open(config: &SshConfig, credentials: &Credentials) -> Result<Self, TransportError> {
        let tcp = connect_tcp(config)?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_millis(config.connect_timeout()));
        session.handshake()?;
        verify_host_key(&session, config)?;

        match credentials {
            Credentials::Key => authenticate_with_key(&session, config)?,
            Credentials::Password(password) => {
                debug!("Trying password authentication for {}", config.username);
                session
                    .userauth_password(&config.username, password)
                    .map_err(|e| TransportError::Authentication(e.message().to_string()))?;
            }
        }

        if !session.authenticated() {
            return Err(TransportError::Authentication(format!(
                "{}@{} rejected the offered credentials",
                config.username, config.host
            )));
        }

        session.set_timeout(timeout_millis(config.command_timeout()));
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }

    /// Run a command on a fresh channel and collect its output.
    ///
    /// Both streams are read in one non-blocking loop. If the command is still
    /// running after `limit` the channel is closed and
    /// [`TransportError::Timeout`] is returned, which releases the session.
    pub fn exec(&self, command: &str, limit: Duration) -> Result<CommandOutput, TransportError> {
        let session = self
            .session
            .lock()
            .map_err(|_| TransportError::Connection("SSH session lock poisoned".to_string()))?;

        let mut channel = session.channel_session()?;
        channel.exec(command)?;
        let stderr = channel.stderr();

        session.set_blocking(false);
        let mut output = ExecChannel { channel, stderr };
        let drained = drain(&mut output, limit);
        session.set_blocking(true);

        let ExecChannel { mut channel, .. } = output;
        let (stdout, stderr) = match drained {
            Ok(streams) => streams,
            Err(e) => {
                if let Err(close) = channel.close() {
                    debug!("Closing the timed out channel failed: {}", close);
                }
                return Err(e);
            }
        };

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }

    /// Send an SSH disconnect message
    pub fn disconnect(&self) -> Result<(), TransportError> {
        let session = self
            .session
            .lock()
            .map_err(|_| TransportError::Connection("SSH session lock poisoned".to_string()))?;
        session.disconnect(None, "closing", None)?;
        Ok(())
    }
}

/// Output side of a running command
trait ChannelOutput {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Whether the remote end has finished sending
    fn eof(&self) -> bool;
}

struct ExecChannel {
    channel: Channel,
    stderr: Stream,
}

impl ChannelOutput for ExecChannel {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.channel.read(buf)
    }

    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stderr.read(buf)
    }

    fn eof(&self) -> bool {
        self.channel.eof()
    }
}

/// Read stdout and stderr until EOF, failing once `limit` has passed
fn drain(output: &mut impl ChannelOutput, limit: Duration) -> Result<(Vec<u8>, Vec<u8>), TransportError> {
    let started = Instant::now();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let read = output.read_stdout(&mut buf);
        let mut progressed = collect(read, &buf, &mut stdout)?;
        let read = output.read_stderr(&mut buf);
        progressed |= collect(read, &buf, &mut stderr)?;

        if output.eof() && !progressed {
            return Ok((stdout, stderr));
        }
        if started.elapsed() >= limit {
            return Err(TransportError::Timeout(limit));
        }
        if !progressed {
            std::thread::sleep(IDLE_POLL);
        }
    }
}

/// Append what a non-blocking read produced; `true` if it produced anything
fn collect(read: io::Result<usize>, buf: &[u8], sink: &mut Vec<u8>) -> Result<bool, TransportError> {
    match read {
        Ok(0) => Ok(false),
        Ok(n) => {
            sink.extend_from_slice(&buf[..n]);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// What to do with the server's key after looking it up
#[derive(Debug, PartialEq, Eq)]
enum HostKeyAction {
    /// Already listed with the same key
    Trusted,
    /// Unknown and allowed; add it to `known_hosts`
    Record,
}

fn host_key_action(check: CheckResult, policy: HostKeyPolicy, host: &str) -> Result<HostKeyAction, TransportError> {
    match (check, policy) {
        (CheckResult::Match, _) => Ok(HostKeyAction::Trusted),
        (CheckResult::NotFound, HostKeyPolicy::AcceptNew) => Ok(HostKeyAction::Record),
        (CheckResult::NotFound, HostKeyPolicy::Strict) => Err(TransportError::Connection(format!(
            "Host key for {} is not in known_hosts",
            host
        ))),
        (CheckResult::Mismatch, _) => Err(TransportError::Connection(format!(
            "Host key for {} does not match known_hosts. Refusing to connect.",
            host
        ))),
        (CheckResult::Failure, _) => Err(TransportError::Connection(format!(
            "Could not check the host key for {}",
            host
        ))),
    }
}

/// `known_hosts` name of the configured host
fn host_entry(config: &SshConfig) -> String {
    if config.port == 22 {
        config.host.clone()
    } else {
        format!("[{}]:{}", config.host, config.port)
    }
}

fn known_hosts_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

/// Check the server's key before any credentials are sent
fn verify_host_key(session: &Session, config: &SshConfig) -> Result<(), TransportError> {
    let (key, key_type) = session
        .host_key()
        .ok_or_else(|| TransportError::Connection(format!("{} sent no host key", config.host)))?;
    let path = known_hosts_path()
        .ok_or_else(|| TransportError::Configuration("cannot locate ~/.ssh/known_hosts".to_string()))?;

    let mut known_hosts = session.known_hosts()?;
    if path.exists() {
        known_hosts.read_file(&path, KnownHostFileKind::OpenSSH)?;
    }

    let check = known_hosts.check_port(&config.host, config.port, key);
    match host_key_action(check, config.host_key_policy, &config.host)? {
        HostKeyAction::Trusted => debug!("Host key for {} matches {}", config.host, path.display()),
        HostKeyAction::Record => {
            warn!("Permanently adding {} to {}", host_entry(config), path.display());
            known_hosts.add(&host_entry(config), key, "", key_type.into())?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            known_hosts.write_file(&path, KnownHostFileKind::OpenSSH)?;
        }
    }
    Ok(())
}

fn connect_tcp(config: &SshConfig) -> Result<TcpStream, TransportError> {
    let addrs = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Connection(format!("Cannot resolve {}: {}", config.host, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                debug!("TCP connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => TransportError::Connection(format!("Failed to connect to {}:{}: {}", config.host, config.port, e)),
        None => TransportError::Connection(format!("No addresses found for {}", config.host)),
    })
}

/// Agent first, then each candidate key file
fn authenticate_with_key(session: &Session, config: &SshConfig) -> Result<(), TransportError> {
    match session.userauth_agent(&config.username) {
        Ok(()) if session.authenticated() => {
            debug!("Authenticated {} through ssh-agent", config.username);
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => debug!("ssh-agent authentication unavailable: {}", e),
    }

    for key in candidate_keys(config) {
        if !key.exists() {
            continue;
        }
        debug!("Trying key {}", key.display());
        match session.userauth_pubkey_file(&config.username, None, &key, None) {
            Ok(()) if session.authenticated() => return Ok(()),
            Ok(()) => {}
            Err(e) => warn!("Key {} was not accepted: {}", key.display(), e),
        }
    }

    Err(TransportError::Authentication(format!(
        "no key accepted for {}@{}",
        config.username, config.host
    )))
}

fn candidate_keys(config: &SshConfig) -> Vec<PathBuf> {
    if let Some(key) = &config.key_path {
        return vec![key.clone()];
    }
    dirs::home_dir()
        .map(|home| {
            ["id_ed25519", "id_ecdsa", "id_rsa"]
                .iter()
                .map(|name| home.join(".ssh").join(name))
                .collect()
        })
        .unwrap_or_default()
}

fn timeout_millis(duration: std::time::Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

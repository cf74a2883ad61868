//! Unit tests for handler dispatch

use super::*;
use crate::{Invocation, PasswordPrompt, Settings, VersionControl, WebbynodeError};
use std::sync::Mutex;

struct NoGit;

#[async_trait]
impl VersionControl for NoGit {
    async fn remotes(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn add_remote(&self, _name: &str, _url: &str) -> Result<()> {
        Ok(())
    }
}

struct NoPassword;

impl PasswordPrompt for NoPassword {
    fn password(&self, _user: &str, _host: &str) -> Result<String> {
        Err(WebbynodeError::Prompt("no terminal".to_string()))
    }
}

#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<Command>>,
}

#[async_trait]
impl Handler for Recording {
    async fn run(&self, _ctx: &mut Context, command: &Command) -> Result<()> {
        self.calls.lock().unwrap().push(command.clone());
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl Handler for Failing {
    async fn run(&self, ctx: &mut Context, command: &Command) -> Result<()> {
        ctx.require_application_environment(&command.name).await
    }
}

fn context() -> (tempfile::TempDir, Context) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::new(dir.path(), Settings::default(), Arc::new(NoGit), Arc::new(NoPassword));
    (dir, ctx)
}

fn command(args: &[&str]) -> Command {
    match Command::parse(args.iter().copied()) {
        Invocation::Run(command) => command,
        Invocation::Help => panic!("empty argv"),
    }
}

#[test]
fn test_handler_name() {
    assert_eq!(handler_name("add_key"), "AddKey");
    assert_eq!(handler_name("init"), "Init");
    assert_eq!(handler_name("remote"), "Remote");
    assert_eq!(handler_name("ADD_KEY"), "AddKey");
    assert_eq!(handler_name("AddKey"), "Addkey");
    assert_eq!(handler_name(""), "");
}

#[test]
fn test_register_by_either_spelling() {
    let dispatcher = Dispatcher::new()
        .with("add_key", Arc::new(Recording::default()))
        .with("Remote", Arc::new(Recording::default()));

    assert!(dispatcher.contains("add_key"));
    assert!(dispatcher.contains("remote"));
    assert!(!dispatcher.contains("init"));
    assert_eq!(dispatcher.handler_names(), vec!["AddKey", "Remote"]);
}

#[tokio::test]
async fn test_dispatch_invokes_handler_with_options() {
    let recording = Arc::new(Recording::default());
    let dispatcher = Dispatcher::new().with("init", recording.clone());
    let (_dir, mut ctx) = context();

    let cmd = command(&["init", "2.2.2.2", "test.webbynodeqwerty.com", "--force"]);
    let outcome = dispatcher.dispatch(&mut ctx, &cmd).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed);
    let calls = recording.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].positional, vec!["2.2.2.2", "test.webbynodeqwerty.com"]);
    assert!(calls[0].has_option("force"));
}

#[tokio::test]
async fn test_unknown_command_invokes_nothing() {
    let recording = Arc::new(Recording::default());
    let dispatcher = Dispatcher::new()
        .with("init", recording.clone())
        .with("remote", recording.clone());
    let (_dir, mut ctx) = context();

    let outcome = dispatcher
        .dispatch(&mut ctx, &command(&["thisdoesnotexist"]))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::UnknownCommand("thisdoesnotexist".to_string()));
    assert!(recording.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_handler_errors_propagate() {
    let dispatcher = Dispatcher::new().with("remote", Arc::new(Failing));
    let (_dir, mut ctx) = context();

    let err = dispatcher
        .dispatch(&mut ctx, &command(&["remote", "ls"]))
        .await
        .unwrap_err();

    assert!(matches!(err, WebbynodeError::NotInitializedEnvironment { command } if command == "remote"));
}

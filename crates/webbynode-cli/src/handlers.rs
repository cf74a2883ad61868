//! Command handlers

use async_trait::async_trait;
use crate::templates;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webbynode::{Command, Context, Dispatcher, Handler, Result, WebbynodeError, GIT_DIR, MARKER_FILE, REMOTE_NAME};

/// Dispatcher with every command this binary knows
pub fn dispatcher() -> Dispatcher {
    Dispatcher::new()
        .with("remote", Arc::new(RemoteHandler))
        .with("init", Arc::new(InitHandler))
        .with("help", Arc::new(HelpHandler))
}

/// `wn remote <command...>`: run a command in the application directory on the Webby
pub struct RemoteHandler;

#[async_trait]
impl Handler for RemoteHandler {
    async fn run(&self, ctx: &mut Context, command: &Command) -> Result<()> {
        ctx.require_application_environment(&command.name).await?;

        if command.arguments.is_empty() {
            return Err(WebbynodeError::Usage("Usage: wn remote <command>".to_string()));
        }
        let remote_command = command.argument_line();

        let output = ctx.run_remote_command(&remote_command).await?;
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);

        if !output.success() {
            warn!("Remote command exited with status {}", output.exit_code);
            return Err(WebbynodeError::RemoteCommandFailed {
                code: output.exit_code,
            });
        }
        Ok(())
    }
}

/// `wn init <webby_ip> [dns]`: prepare the working directory for deployment
pub struct InitHandler;

#[async_trait]
impl Handler for InitHandler {
    async fn run(&self, ctx: &mut Context, command: &Command) -> Result<()> {
        let Some(webby_ip) = command.positional.first() else {
            return Err(WebbynodeError::Usage("Usage: wn init <webby_ip> [dns]".to_string()));
        };

        let root = ctx.root().to_path_buf();
        let app_name = app_name(&root)?;
        let app_dir = command.positional.get(1).unwrap_or(&app_name);

        let pushand = root.join(MARKER_FILE);
        if pushand.exists() {
            debug!("{} already present", MARKER_FILE);
        } else {
            println!("Creating {}...", MARKER_FILE);
            tokio::fs::write(&pushand, templates::pushand(app_dir)).await?;
            make_executable(&pushand).await?;
        }

        let gitignore = root.join(".gitignore");
        if !gitignore.exists() {
            println!("Creating .gitignore...");
            tokio::fs::write(&gitignore, templates::GITIGNORE).await?;
        }

        let vcs = ctx.vcs();
        if !root.join(GIT_DIR).is_dir() {
            println!("Initializing git repository...");
            vcs.init().await?;
        }

        if vcs.remotes().await?.iter().any(|remote| remote == REMOTE_NAME) {
            println!("Webbynode remote already configured.");
        } else {
            let url = format!("git@{}:{}", webby_ip, app_name);
            println!("Adding webbynode remote {}...", url);
            vcs.add_remote(REMOTE_NAME, &url).await?;
        }

        info!("Initialized {} for {}", app_name, webby_ip);
        println!("Application {} ready for Webbynode deployment.", app_name);
        Ok(())
    }
}

/// `wn help`: print the help text
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn run(&self, _ctx: &mut Context, _command: &Command) -> Result<()> {
        print!("{}", templates::HELP);
        Ok(())
    }
}

/// Directory name with dots replaced, used as the remote repository name
fn app_name(root: &Path) -> Result<String> {
    root.file_name()
        .map(|name| name.to_string_lossy().replace('.', "_"))
        .ok_or_else(|| WebbynodeError::Usage(format!("Cannot derive an application name from {}", root.display())))
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

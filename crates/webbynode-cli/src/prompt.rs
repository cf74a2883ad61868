//! Terminal password prompt

use dialoguer::Password;
use webbynode::{PasswordPrompt, Result, WebbynodeError};

/// Asks for the password on the controlling terminal without echo
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn password(&self, user: &str, host: &str) -> Result<String> {
        Password::new()
            .with_prompt(format!("Password for {}@{}", user, host))
            .interact()
            .map_err(|e| WebbynodeError::Prompt(e.to_string()))
    }
}

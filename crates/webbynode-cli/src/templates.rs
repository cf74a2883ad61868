//! Literal texts shipped with the binary

use webbynode::config::PUSHAND_DIRECTIVE;

/// Help text
pub const HELP: &str = include_str!("../templates/help");

/// Default `.gitignore` for a new application
pub const GITIGNORE: &str = include_str!("../templates/gitignore");

/// `.pushand` pointing the Webby at `app_dir`
pub fn pushand(app_dir: &str) -> String {
    format!("#! /bin/bash\n{}{}\n", PUSHAND_DIRECTIVE, app_dir)
}

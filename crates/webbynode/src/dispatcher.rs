//! Handler registry and dispatch

use async_trait::async_trait;
use crate::{Command, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A command implementation
#[async_trait]
pub trait Handler: Send + Sync {
    /// Run the command with its positional and named options
    async fn run(&self, ctx: &mut Context, command: &Command) -> Result<()>;
}

/// Result of dispatching a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion
    Completed,
    /// No handler is registered under the command's handler name
    UnknownCommand(String),
}

/// Handler name for a command name: each `_`-separated word capitalized and
/// joined, so `add_key` becomes `AddKey`
pub fn handler_name(command: &str) -> String {
    command
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Registry of handlers keyed by handler name
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `command` (`add_key` and `AddKey` are equivalent)
    pub fn register(&mut self, command: &str, handler: Arc<dyn Handler>) {
        let name = handler_name(command);
        debug!("Registered handler {} for command {}", name, command);
        self.handlers.insert(name, handler);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, command: &str, handler: Arc<dyn Handler>) -> Self {
        self.register(command, handler);
        self
    }

    /// Whether a handler would be found for `command`
    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(&handler_name(command))
    }

    /// Registered handler names, sorted
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up and run the handler for `command`
    pub async fn dispatch(&self, ctx: &mut Context, command: &Command) -> Result<DispatchOutcome> {
        let name = handler_name(&command.name);
        let Some(handler) = self.handlers.get(&name).cloned() else {
            debug!("No handler named {} for command {:?}", name, command.name);
            return Ok(DispatchOutcome::UnknownCommand(command.name.clone()));
        };

        debug!("Dispatching {:?} to {}", command.name, name);
        handler.run(ctx, command).await?;
        Ok(DispatchOutcome::Completed)
    }
}

#[cfg(test)]
mod tests;

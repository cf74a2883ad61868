//! Argument grammar: `<command> [positional...] [--name[=value]]...`

use std::collections::BTreeMap;

/// Value of a named option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `--name` with no value
    Flag,
    /// `--name=value`, quotes removed
    Value(String),
}

impl OptionValue {
    /// The string value, if one was given
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Flag => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// Named options keyed by name
pub type NamedOptions = BTreeMap<String, OptionValue>;

/// A parsed command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// First token of the argument vector
    pub name: String,
    /// Remaining non-option tokens, in order
    pub positional: Vec<String>,
    /// `--name` / `--name=value` tokens
    pub named: NamedOptions,
    /// Every token after the name exactly as given, options included
    pub arguments: Vec<String>,
}

/// What the argument vector asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// No arguments: show help and exit successfully
    Help,
    /// Run a command
    Run(Command),
}

impl Command {
    /// Parse an argument vector (without the program name).
    ///
    /// The first token is the command name. Each later token of the form
    /// `--name` or `--name=value` becomes a named option; everything else is
    /// positional. Later duplicates of a named option replace earlier ones.
    pub fn parse<I, S>(args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = args.into_iter().map(Into::into);

        let Some(name) = tokens.next() else {
            return Invocation::Help;
        };

        let mut command = Command {
            name,
            ..Default::default()
        };

        for token in tokens {
            match parse_named(&token) {
                Some((key, value)) => {
                    command.named.insert(key, value);
                }
                None => command.positional.push(token.clone()),
            }
            command.arguments.push(token);
        }

        Invocation::Run(command)
    }

    /// Whether a named option was given, with or without a value
    pub fn has_option(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// String value of a named option
    pub fn option(&self, name: &str) -> Option<&str> {
        self.named.get(name).and_then(OptionValue::as_str)
    }

    /// The arguments joined back into one command line
    pub fn argument_line(&self) -> String {
        self.arguments.join(" ")
    }
}

fn parse_named(token: &str) -> Option<(String, OptionValue)> {
    let body = token.strip_prefix("--")?;
    let (key, value) = match body.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (body, None),
    };

    if !is_option_name(key) {
        return None;
    }

    let value = match value.map(|v| v.replace('"', "")) {
        Some(v) if !v.is_empty() => OptionValue::Value(v),
        _ => OptionValue::Flag,
    };

    Some((key.to_string(), value))
}

fn is_option_name(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
        && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

//! Parser for the two-level `[section "subsection"]` format used by `.git/config`

use crate::{ConfigError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Key/value pairs of one section or subsection
pub type Entries = BTreeMap<String, String>;

/// A top-level section with its own entries and any quoted subsections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Entries written directly under `[section]`
    pub entries: Entries,
    /// Entries written under `[section "name"]`, keyed by name
    pub subsections: BTreeMap<String, Entries>,
}

/// Parsed structured configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    sections: BTreeMap<String, Section>,
}

impl ParsedConfig {
    /// Look up a section by name
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Look up a subsection, e.g. `("remote", "webbynode")`
    pub fn subsection(&self, section: &str, subsection: &str) -> Option<&Entries> {
        self.sections.get(section)?.subsections.get(subsection)
    }

    /// Look up a value by `section[.subsection].key`
    pub fn get(&self, section: &str, subsection: Option<&str>, key: &str) -> Option<&str> {
        let entries = match subsection {
            Some(sub) => self.subsection(section, sub)?,
            None => &self.section(section)?.entries,
        };
        entries.get(key).map(String::as_str)
    }

    /// Names of all top-level sections
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    fn entries_mut(&mut self, target: &Target) -> &mut Entries {
        let section = self.sections.entry(target.section.clone()).or_default();
        match &target.subsection {
            Some(sub) => section.subsections.entry(sub.clone()).or_default(),
            None => &mut section.entries,
        }
    }
}

/// Where key/value lines currently land
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    section: String,
    subsection: Option<String>,
}

#[derive(Debug)]
enum ParserState {
    NoSection,
    InSection(Target),
}

/// Parse structured config text line by line.
///
/// Headers (`[section]` or `[section "subsection"]`) select the write target,
/// creating it if absent and reusing it if seen before. Other lines are split
/// on the first ` = `; the last write of a key wins. Blank lines and `#`/`;`
/// comments are skipped, and a key without a value is stored as `"true"`.
///
/// A key line before any header fails with [`ConfigError::MalformedConfig`].
pub fn parse_structured_config(text: &str) -> Result<ParsedConfig> {
    let mut config = ParsedConfig::default();
    let mut state = ParserState::NoSection;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let target = parse_header(line, line_no)?;
            config.entries_mut(&target);
            state = ParserState::InSection(target);
            continue;
        }

        let ParserState::InSection(target) = &state else {
            return Err(ConfigError::malformed(line_no, "key/value line before any section header"));
        };

        let (key, value) = match line.split_once(" = ") {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "true"),
        };

        if key.is_empty() {
            return Err(ConfigError::malformed(line_no, "empty key"));
        }

        config.entries_mut(target).insert(key.to_string(), value.to_string());
    }

    debug!("Parsed config with sections: {:?}", config.sections.keys().collect::<Vec<_>>());
    Ok(config)
}

fn parse_header(line: &str, line_no: usize) -> Result<Target> {
    let close = line
        .find(']')
        .ok_or_else(|| ConfigError::malformed(line_no, "unterminated section header"))?;

    let trailing = line[close + 1..].trim_start();
    if !(trailing.is_empty() || trailing.starts_with('#') || trailing.starts_with(';')) {
        return Err(ConfigError::malformed(line_no, "unexpected text after section header"));
    }

    let inner = line[1..close].trim();
    let (name, subsection) = match inner.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(parse_subsection(rest.trim(), line_no)?)),
        None => (inner, None),
    };

    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(ConfigError::malformed(line_no, format!("invalid section name {:?}", name)));
    }

    Ok(Target {
        section: name.to_string(),
        subsection,
    })
}

fn parse_subsection(quoted: &str, line_no: usize) -> Result<String> {
    quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::malformed(line_no, "subsection name must be a non-empty quoted string"))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

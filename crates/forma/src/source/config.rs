//! INI-style config text source.
//!
//! Models the classic section/option file shape:
//!
//! ```ini
//! [slurp]
//! state_dir = /var/lib/slurp
//! includes = /etc/slurp/conf.d/*.conf /etc/slurp/conf.d/*.py
//! auth[user] = slurp
//! auth[pass] = hunter2
//! ```
//!
//! Option values are flat strings, so two emulations bridge the gap to
//! structured traversal: a value shlex-splits on demand when addressed as a
//! sequence, and bracket-suffixed option families (`auth[user]`) synthesize
//! a virtual sub-mapping under the family name. A `[DEFAULT]` section
//! provides per-section fallback options, and the raw (non-dedented)
//! multi-line text of any option stays retrievable.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::path::{Path, Segment};
use crate::source::{Source, SourceError, TypeHint, coerce};
use crate::value::Value;

static FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>\w+)\[(?P<key>\w+)\]$").expect("family pattern"));

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Config text that could not be parsed. Raised at construction, never
/// during traversal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A line that is neither a section header, an option, a comment, nor
    /// a continuation.
    #[error("line {0}: expected `[section]` or `key = value`")]
    Syntax(usize),

    /// An option appeared before any section header.
    #[error("line {0}: option before any section header")]
    OrphanOption(usize),
}

// ============================================================================
// PARSED MODEL
// ============================================================================

#[derive(Debug, Clone, Default)]
struct OptionData {
    /// Logical value: continuation lines dedented and joined.
    value: String,
    /// Original text, continuation lines kept verbatim.
    raw: String,
}

#[derive(Debug, Clone, Default)]
struct SectionData {
    options: IndexMap<String, OptionData>,
    /// `name[key] = value` options grouped by family name.
    families: IndexMap<String, IndexMap<String, String>>,
}

/// What a path resolves to inside the config model.
enum Node<'a> {
    /// The unscoped root: sections as a mapping.
    Sections,
    Section(&'a SectionData),
    Family(&'a IndexMap<String, String>),
    /// An option's logical value.
    Text(&'a str),
    /// One shlex token out of an option value.
    Token(String),
}

// ============================================================================
// CONFIG SOURCE
// ============================================================================

/// A source over INI-style section/option text.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    sections: IndexMap<String, SectionData>,
    defaults: IndexMap<String, OptionData>,
    section: Option<String>,
    location: Option<String>,
}

impl ConfigSource {
    /// Parses config text. All structure (sections, families, raw text) is
    /// built here; traversal only reads.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut sections: IndexMap<String, SectionData> = IndexMap::new();
        let mut current: Option<String> = None;
        let mut open_option: Option<(String, String)> = None; // (section, option)

        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                open_option = None;
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                // Continuation of the previous option.
                let Some((section, option)) = &open_option else {
                    return Err(ConfigError::Syntax(number));
                };
                let Some(data) = sections
                    .get_mut(section)
                    .and_then(|s| s.options.get_mut(option))
                else {
                    return Err(ConfigError::Syntax(number));
                };
                data.value.push('\n');
                data.value.push_str(trimmed);
                data.raw.push('\n');
                data.raw.push_str(line);
                continue;
            }
            if let Some(name) = trimmed.strip_prefix('[') {
                let Some(name) = name.strip_suffix(']') else {
                    return Err(ConfigError::Syntax(number));
                };
                current = Some(name.to_owned());
                sections.entry(name.to_owned()).or_default();
                open_option = None;
                continue;
            }
            let Some(delimiter) = trimmed.find(['=', ':']) else {
                return Err(ConfigError::Syntax(number));
            };
            let Some(section) = &current else {
                return Err(ConfigError::OrphanOption(number));
            };
            let key = trimmed[..delimiter].trim().to_owned();
            let value = trimmed[delimiter + 1..].trim().to_owned();
            let data = OptionData {
                raw: value.clone(),
                value,
            };
            // Later duplicates win.
            sections
                .entry(section.clone())
                .or_default()
                .options
                .insert(key.clone(), data);
            open_option = Some((section.clone(), key));
        }

        for section in sections.values_mut() {
            for (option, data) in &section.options {
                if let Some(captures) = FAMILY.captures(option) {
                    section
                        .families
                        .entry(captures["name"].to_owned())
                        .or_default()
                        .insert(captures["key"].to_owned(), data.value.clone());
                }
            }
        }

        let defaults = sections
            .shift_remove("DEFAULT")
            .map(|section| section.options)
            .unwrap_or_default();

        Ok(Self {
            sections,
            defaults,
            section: None,
            location: None,
        })
    }

    /// Scopes the source to one section: paths resolve against its options
    /// instead of the section mapping.
    #[must_use]
    pub fn section(mut self, name: impl Into<String>) -> Self {
        self.section = Some(name.into());
        self
    }

    /// Labels rendered paths with a file location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// The raw, non-dedented text of an option, exactly as it appeared.
    #[must_use]
    pub fn raw(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.options.get(option))
            .or_else(|| self.defaults.get(option))
            .map(|data| data.raw.as_str())
    }

    fn option<'a>(&'a self, section: &'a SectionData, key: &str) -> Option<&'a str> {
        section
            .options
            .get(key)
            .or_else(|| self.defaults.get(key))
            .map(|data| data.value.as_str())
    }

    fn walk(&self, path: &Path) -> Option<Node<'_>> {
        let mut node = match &self.section {
            Some(name) => Node::Section(self.sections.get(name)?),
            None => Node::Sections,
        };
        for segment in path.segments() {
            node = match (node, segment) {
                (Node::Sections, Segment::Key(key)) => Node::Section(self.sections.get(key)?),
                (Node::Section(section), Segment::Key(key)) => {
                    if let Some(family) = section.families.get(key) {
                        Node::Family(family)
                    } else {
                        Node::Text(self.option(section, key)?)
                    }
                }
                (Node::Family(family), Segment::Key(key)) => {
                    Node::Text(family.get(key).map(String::as_str)?)
                }
                (Node::Text(text), Segment::Index(index)) => {
                    Node::Token(shlex::split(text)?.into_iter().nth(*index)?)
                }
                _ => return None,
            };
        }
        Some(node)
    }
}

impl Source for ConfigSource {
    fn exists(&self, path: &Path) -> bool {
        self.walk(path).is_some()
    }

    fn is_null(&self, _path: &Path) -> bool {
        // The format has no null literal; options are present or absent.
        false
    }

    fn primitive(&self, path: &Path, hints: &[TypeHint]) -> Result<Value, SourceError> {
        match self.walk(path) {
            Some(Node::Text(text)) => {
                coerce::primitive(|| self.render(path), &Value::Str(text.to_owned()), hints)
            }
            Some(Node::Token(token)) => {
                coerce::primitive(|| self.render(path), &Value::Str(token), hints)
            }
            Some(_) => Err(SourceError::new(self.render(path), "is not a primitive")),
            None => Err(SourceError::new(self.render(path), "does not exist")),
        }
    }

    fn sequence(&self, path: &Path) -> Result<usize, SourceError> {
        match self.walk(path) {
            Some(Node::Text(text)) => shlex::split(text)
                .map(|tokens| tokens.len())
                .ok_or_else(|| SourceError::new(self.render(path), "is not a sequence")),
            _ => Err(SourceError::new(self.render(path), "is not a sequence")),
        }
    }

    fn mapping(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        match self.walk(path) {
            Some(Node::Sections) => Ok(self.sections.keys().cloned().collect()),
            Some(Node::Section(section)) => {
                let mut keys: Vec<String> = section.families.keys().cloned().collect();
                for option in section.options.keys() {
                    if !FAMILY.is_match(option) {
                        keys.push(option.clone());
                    }
                }
                for option in self.defaults.keys() {
                    if !keys.contains(option) {
                        keys.push(option.clone());
                    }
                }
                Ok(keys)
            }
            Some(Node::Family(family)) => Ok(family.keys().cloned().collect()),
            _ => Err(SourceError::new(self.render(path), "is not a mapping")),
        }
    }

    fn render(&self, path: &Path) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(location) = &self.location {
            parts.push(location.clone());
        }
        if let Some(section) = &self.section {
            parts.push(format!("[{section}]"));
        }
        if !path.is_empty() {
            parts.push(path.to_string());
        }
        parts.join(":")
    }
}

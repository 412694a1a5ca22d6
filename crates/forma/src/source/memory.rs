//! In-memory source over an owned [`Value`] tree.

use crate::path::{Path, Segment};
use crate::source::{Source, SourceError, TypeHint, coerce};
use crate::value::Value;

/// The default source: resolves paths against nested in-memory containers.
///
/// Key segments resolve by mapping lookup; integer segments index lists;
/// dotted keys (`"a.b"`) split and resolve one atom at a time. Positional
/// aliases, when declared, let named keys address list positions at the
/// first level — the tuple-style-source convention.
///
/// # Examples
///
/// ```
/// use forma::source::{MemorySource, Source};
/// use forma::Path;
///
/// let src = MemorySource::from(serde_json::json!({"slurp": {"read_size": 1024}}));
/// let path: Path = ["slurp", "read_size"].into_iter().collect();
/// assert!(src.exists(&path));
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Value,
    aliases: Vec<String>,
}

impl MemorySource {
    /// Creates a source over a value tree.
    #[must_use]
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            aliases: Vec::new(),
        }
    }

    /// Declares positional aliases for a list-shaped source: the alias at
    /// position `n` addresses element `n`. Applies to the first path
    /// segment only.
    #[must_use]
    pub fn with_aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// The underlying value tree.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    fn resolve(&self, path: &Path) -> Option<&Value> {
        let mut current = &self.data;
        for (depth, segment) in path.segments().iter().enumerate() {
            current = self.step(current, segment, depth == 0)?;
        }
        Some(current)
    }

    fn step<'a>(&self, current: &'a Value, segment: &Segment, first: bool) -> Option<&'a Value> {
        match segment {
            Segment::Index(index) => current.as_list()?.get(*index),
            Segment::Key(key) => {
                if let Some(entries) = current.as_map() {
                    if let Some(value) = entries.get(key) {
                        return Some(value);
                    }
                    if key.contains('.') {
                        let mut value = current;
                        for atom in key.split('.') {
                            value = value.as_map()?.get(atom)?;
                        }
                        return Some(value);
                    }
                    None
                } else if first && current.as_list().is_some() {
                    let position = self.aliases.iter().position(|alias| alias == key)?;
                    current.as_list()?.get(position)
                } else {
                    None
                }
            }
        }
    }
}

impl From<serde_json::Value> for MemorySource {
    fn from(json: serde_json::Value) -> Self {
        Self::new(Value::from_json(json))
    }
}

impl Source for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }

    fn is_null(&self, path: &Path) -> bool {
        self.resolve(path).is_some_and(Value::is_null)
    }

    fn primitive(&self, path: &Path, hints: &[TypeHint]) -> Result<Value, SourceError> {
        let value = self
            .resolve(path)
            .ok_or_else(|| SourceError::new(path.to_string(), "does not exist"))?;
        coerce::primitive(|| path.to_string(), value, hints)
    }

    fn sequence(&self, path: &Path) -> Result<usize, SourceError> {
        match self.resolve(path) {
            Some(Value::List(items)) => Ok(items.len()),
            _ => Err(SourceError::new(path.to_string(), "is not a sequence")),
        }
    }

    fn mapping(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        match self.resolve(path) {
            Some(Value::Map(entries)) => Ok(entries.keys().cloned().collect()),
            _ => Err(SourceError::new(path.to_string(), "is not a mapping")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> MemorySource {
        MemorySource::from(json!({
            "slurp": {
                "state_dir": "/var/lib/slurp",
                "backfill": "f",
                "read_size": "1024",
                "poop": null,
                "includes": ["/etc/slurp/conf.d/*.conf", "/etc/slurp/conf.d/*.py"],
            }
        }))
    }

    fn path<S: Into<Segment>>(segments: impl IntoIterator<Item = S>) -> Path {
        segments.into_iter().collect()
    }

    #[test]
    fn existence_tracks_traversal() {
        let src = fixture();
        assert!(src.exists(&Path::new()));
        assert!(src.exists(&path(["slurp"])));
        assert!(src.exists(&path(["slurp", "includes"]).child(1usize)));
        assert!(!src.exists(&path(["slurp", "includes"]).child(2usize)));
        assert!(!src.exists(&path(["slurp", "includes", "peep"])));
        assert!(!src.exists(&path(["slurp"]).child(2usize)));
    }

    #[test]
    fn null_is_present_but_null() {
        let src = fixture();
        assert!(src.exists(&path(["slurp", "poop"])));
        assert!(src.is_null(&path(["slurp", "poop"])));
        assert!(!src.is_null(&path(["slurp", "backfill"])));
    }

    #[test]
    fn dotted_keys_split() {
        let src = fixture();
        let p = path(["slurp.read_size"]);
        assert!(src.exists(&p));
        assert_eq!(src.primitive(&p, &[TypeHint::Int]).unwrap(), Value::Int(1024));
    }

    #[test]
    fn sequence_and_mapping_enumeration() {
        let src = fixture();
        assert_eq!(src.sequence(&path(["slurp", "includes"])).unwrap(), 2);
        assert!(src.sequence(&path(["slurp", "state_dir"])).is_err());
        let keys = src.mapping(&path(["slurp"])).unwrap();
        assert!(keys.contains(&"backfill".to_owned()));
        assert!(src.mapping(&path(["slurp", "includes"])).is_err());
    }

    #[test]
    fn positional_aliases_address_first_level() {
        let src = MemorySource::new(Value::List(vec![
            Value::from("localhost"),
            Value::Int(8080),
        ]))
        .with_aliases(["host", "port"]);
        assert_eq!(
            src.primitive(&path(["port"]), &[TypeHint::Int]).unwrap(),
            Value::Int(8080)
        );
        assert!(!src.exists(&path(["scheme"])));
    }
}

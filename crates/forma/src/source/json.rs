//! JSON text source.

use crate::path::{Path, Segment};
use crate::source::{Source, SourceError, TypeHint};
use crate::value::Value;

/// A source over a JSON document, parsed once at construction.
///
/// Object keys containing dots traverse nested objects. By default the
/// source is lenient the way dynamic JSON consumers expect — integral
/// floats coerce to integers, integers to booleans, scalars stringify;
/// [`JsonSource::strict`] turns all of that off and only hands back values
/// already of the requested type.
#[derive(Debug, Clone)]
pub struct JsonSource {
    data: Value,
    strict: bool,
    location: Option<String>,
}

impl JsonSource {
    /// Parses `text` as JSON. Malformed text fails here, once, not during
    /// traversal.
    pub fn new(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: Value::from_json(serde_json::from_str(text)?),
            strict: false,
            location: None,
        })
    }

    /// Refuses cross-type coercion: floats never narrow to ints, ints
    /// never widen to bools, non-strings never stringify.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Labels rendered paths with a document location (a file name,
    /// typically).
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    fn resolve(&self, path: &Path) -> Option<&Value> {
        let mut current = &self.data;
        for segment in path.segments() {
            current = match segment {
                Segment::Index(index) => current.as_list()?.get(*index)?,
                Segment::Key(key) => {
                    let entries = current.as_map()?;
                    match entries.get(key) {
                        Some(value) => value,
                        None if key.contains('.') => {
                            let mut value = current;
                            for atom in key.split('.') {
                                value = value.as_map()?.get(atom)?;
                            }
                            value
                        }
                        None => return None,
                    }
                }
            };
        }
        Some(current)
    }

    fn coerce(&self, at: &str, value: &Value, hints: &[TypeHint]) -> Result<Value, SourceError> {
        let hints = if hints.is_empty() {
            &[TypeHint::Auto]
        } else {
            hints
        };
        for hint in hints {
            let coerced = match (*hint, value) {
                (TypeHint::Auto, v) => Some(v.clone()),
                (TypeHint::Str, Value::Str(s)) => Some(Value::Str(s.clone())),
                (TypeHint::Str, v) if !self.strict && !matches!(v, Value::List(_) | Value::Map(_)) => {
                    Some(Value::Str(v.to_string()))
                }
                (TypeHint::Int, Value::Int(n)) => Some(Value::Int(*n)),
                (TypeHint::Int, Value::Float(f)) if !self.strict && f.fract() == 0.0 => {
                    Some(Value::Int(*f as i64))
                }
                (TypeHint::Float, Value::Float(f)) => Some(Value::Float(*f)),
                (TypeHint::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
                (TypeHint::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
                (TypeHint::Bool, Value::Int(n)) if !self.strict => Some(Value::Bool(*n != 0)),
                _ => None,
            };
            if let Some(coerced) = coerced {
                return Ok(coerced);
            }
        }
        Err(super::coerce::mismatch(at, value, hints))
    }
}

impl Source for JsonSource {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }

    fn is_null(&self, path: &Path) -> bool {
        self.resolve(path).is_some_and(Value::is_null)
    }

    fn primitive(&self, path: &Path, hints: &[TypeHint]) -> Result<Value, SourceError> {
        let value = self
            .resolve(path)
            .ok_or_else(|| SourceError::new(self.render(path), "does not exist"))?;
        self.coerce(&self.render(path), value, hints)
    }

    fn sequence(&self, path: &Path) -> Result<usize, SourceError> {
        match self.resolve(path) {
            Some(Value::List(items)) => Ok(items.len()),
            _ => Err(SourceError::new(self.render(path), "is not a sequence")),
        }
    }

    fn mapping(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        match self.resolve(path) {
            Some(Value::Map(entries)) => Ok(entries.keys().cloned().collect()),
            _ => Err(SourceError::new(self.render(path), "is not a mapping")),
        }
    }

    fn render(&self, path: &Path) -> String {
        match &self.location {
            Some(location) => format!("{location}:{path}"),
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "slurp": {
            "backfill": false,
            "read_size": 1024,
            "ratio": 2.0,
            "includes": ["a.conf", "b.py"]
        }
    }"#;

    fn path<S: Into<Segment>>(segments: impl IntoIterator<Item = S>) -> Path {
        segments.into_iter().collect()
    }

    #[test]
    fn malformed_text_fails_at_construction() {
        assert!(JsonSource::new("{nope").is_err());
    }

    #[test]
    fn lenient_coercions() {
        let src = JsonSource::new(DOC).unwrap();
        let ratio = path(["slurp", "ratio"]);
        assert_eq!(src.primitive(&ratio, &[TypeHint::Int]).unwrap(), Value::Int(2));
        let read = path(["slurp", "read_size"]);
        assert_eq!(
            src.primitive(&read, &[TypeHint::Bool]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            src.primitive(&read, &[TypeHint::Str]).unwrap(),
            Value::Str("1024".into())
        );
    }

    #[test]
    fn strict_refuses_cross_type_coercion() {
        let src = JsonSource::new(DOC).unwrap().strict();
        assert!(src.primitive(&path(["slurp", "ratio"]), &[TypeHint::Int]).is_err());
        assert!(src.primitive(&path(["slurp", "read_size"]), &[TypeHint::Bool]).is_err());
        assert!(src.primitive(&path(["slurp", "read_size"]), &[TypeHint::Str]).is_err());
        // Same-type access still works.
        assert_eq!(
            src.primitive(&path(["slurp", "backfill"]), &[TypeHint::Bool]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn strings_never_parse_as_numbers() {
        let src = JsonSource::new(r#"{"n": "12"}"#).unwrap();
        assert!(src.primitive(&path(["n"]), &[TypeHint::Int]).is_err());
    }

    #[test]
    fn dotted_keys_traverse_objects() {
        let src = JsonSource::new(DOC).unwrap();
        assert!(src.exists(&path(["slurp.read_size"])));
    }

    #[test]
    fn location_prefixes_rendered_paths() {
        let src = JsonSource::new(DOC).unwrap().with_location("payload.json");
        let err = src.sequence(&path(["slurp", "read_size"])).unwrap_err();
        assert_eq!(err.to_string(), "payload.json:slurp.read_size - is not a sequence");
    }
}

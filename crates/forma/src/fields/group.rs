//! Group field: one logical field mapped from a family of alternative
//! source keys, including regex-matched key families like `field[gt]`.

use std::sync::Arc;

use regex::Regex;

use crate::field::{Field, FieldType, Outcome};
use crate::form::Scope;
use crate::path::Segment;
use crate::source::SourceError;
use crate::value::Value;

/// One alternative key specification of a group.
#[derive(Debug, Clone)]
pub enum KeySpec {
    /// Matches exactly this key.
    Literal(String),
    /// Matches keys against a pattern; the `op` capture (or group 1)
    /// becomes the triple's captured component.
    Pattern(Regex),
}

impl KeySpec {
    /// The captured component for a matching key: `None` if the key does
    /// not match, `Some(None)` for a literal match, `Some(Some(op))` for a
    /// pattern match.
    fn matches(&self, key: &str) -> Option<Option<String>> {
        match self {
            KeySpec::Literal(literal) => (literal == key).then_some(None),
            KeySpec::Pattern(pattern) => pattern.captures(key).map(|captures| {
                captures
                    .name("op")
                    .or_else(|| captures.get(1))
                    .map(|m| m.as_str().to_owned())
            }),
        }
    }
}

/// Builder for a grouped field. Every key of the current source position
/// is tested against every spec; each match resolves through that spec's
/// sub-field. The result is a list of `[matched key, captured op, value]`
/// triples — the shape operator-style query inputs (`a[in]`, `a[gt]`)
/// want.
#[derive(Debug, Clone)]
pub struct GroupField {
    pub(crate) field: Field,
    specs: Vec<(KeySpec, Field)>,
}

impl GroupField {
    #[must_use]
    pub fn new() -> Self {
        Self {
            // A group matches keys of the position it sits at; it never
            // pushes a key of its own.
            field: Field::any().src_whole(),
            specs: Vec::new(),
        }
    }

    /// Adds a literal key alternative.
    #[must_use]
    pub fn literal(mut self, key: impl Into<String>, field: impl Into<Field>) -> Self {
        self.specs.push((KeySpec::Literal(key.into()), field.into()));
        self
    }

    /// Adds a regex key-family alternative.
    ///
    /// # Panics
    ///
    /// On an invalid pattern — a schema declaration mistake.
    #[must_use]
    pub fn pattern(mut self, pattern: &str, field: impl Into<Field>) -> Self {
        let pattern = Regex::new(pattern).expect("valid group pattern");
        self.specs.push((KeySpec::Pattern(pattern), field.into()));
        self
    }
}

impl Default for GroupField {
    fn default() -> Self {
        Self::new()
    }
}

super::field_builders!(GroupField);

impl From<GroupField> for Field {
    fn from(builder: GroupField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(GroupType {
            specs: builder.specs,
        });
        field
    }
}

#[derive(Debug)]
struct GroupType {
    specs: Vec<(KeySpec, Field)>,
}

impl FieldType for GroupType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let keys = match scope.source.mapping(scope.ctx.path()) {
            Ok(keys) => keys,
            Err(error) => {
                scope.ctx.report_invalid(error.message);
                return Some(Outcome::Error);
            }
        };
        let mut triples = Vec::new();
        for key in keys {
            for (spec, sub_field) in &self.specs {
                let Some(captured) = spec.matches(&key) else {
                    continue;
                };
                let outcome = scope.at(Segment::Key(key.clone()), |scope| {
                    sub_field.map_value(scope, None)
                });
                if let Outcome::Value(value) = outcome {
                    triples.push(Value::List(vec![
                        Value::Str(key.clone()),
                        captured.map_or(Value::Null, Value::Str),
                        value,
                    ]));
                }
            }
        }
        if triples.is_empty() {
            return Some(field.fallback(scope));
        }
        Some(Outcome::Value(Value::List(triples)))
    }
}

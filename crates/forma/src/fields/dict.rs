//! Dict field: typed keys and values over an open mapping.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::field::{Field, FieldType, Outcome};
use crate::form::Scope;
use crate::path::Segment;
use crate::source::SourceError;
use crate::value::Value;

type KeyFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Builder for a mapping field: every source key is fed through the key
/// field (transform or reject keys) and every value through the value
/// field.
#[derive(Clone)]
pub struct DictField {
    pub(crate) field: Field,
    key: Field,
    value: Field,
    required: Vec<String>,
    max_keys: Option<usize>,
    key_filter: Option<KeyFilter>,
}

impl std::fmt::Debug for DictField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictField")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl DictField {
    #[must_use]
    pub fn new(key: impl Into<Field>, value: impl Into<Field>) -> Self {
        Self {
            field: Field::any(),
            key: key.into(),
            value: value.into(),
            required: Vec::new(),
            max_keys: None,
            key_filter: None,
        }
    }

    /// Keys that must be present in the constructed mapping.
    #[must_use]
    pub fn required_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.required = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Caps the number of keys.
    #[must_use]
    pub fn max_keys(mut self, max: usize) -> Self {
        self.max_keys = Some(max);
        self
    }

    /// Skips source keys the predicate rejects, before either the key or
    /// the value field sees them.
    #[must_use]
    pub fn key_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.key_filter = Some(Arc::new(filter));
        self
    }
}

super::field_builders!(DictField);

impl From<DictField> for Field {
    fn from(builder: DictField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(DictType {
            key: builder.key,
            value: builder.value,
            required: builder.required,
            max_keys: builder.max_keys,
            key_filter: builder.key_filter,
        });
        field
    }
}

struct DictType {
    key: Field,
    value: Field,
    required: Vec<String>,
    max_keys: Option<usize>,
    key_filter: Option<KeyFilter>,
}

impl std::fmt::Debug for DictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictType")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("required", &self.required)
            .field("max_keys", &self.max_keys)
            .field("key_filter", &self.key_filter.as_ref().map(|_| ".."))
            .finish()
    }
}

impl FieldType for DictType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, _field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let keys = match scope.source.mapping(scope.ctx.path()) {
            Ok(keys) => keys,
            Err(error) => {
                scope.ctx.report_invalid(error.message);
                return Some(Outcome::Error);
            }
        };
        let mut entries = IndexMap::new();
        for key in keys {
            if let Some(filter) = &self.key_filter {
                if !filter(&key) {
                    continue;
                }
            }
            let mapped = scope.at(Segment::Key(key.clone()), |scope| {
                // Value first, at the pushed path; then the raw key
                // through the key field, still at this position.
                let value = self.value.map_value(scope, None);
                let Outcome::Value(value) = value else {
                    return None;
                };
                let key = self.key.map_value(scope, Some(Value::Str(key.clone())));
                let Outcome::Value(key) = key else {
                    return None;
                };
                Some((key.to_string(), value))
            });
            if let Some((key, value)) = mapped {
                entries.insert(key, value);
            }
        }
        Some(Outcome::Value(Value::Map(entries)))
    }

    fn validate(&self, _field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(entries) = value.as_map() else {
            return true;
        };
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|key| !entries.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            scope
                .ctx
                .report_invalid(format!("missing required keys {}", missing.join(", ")));
            return false;
        }
        if let Some(max) = self.max_keys {
            if entries.len() > max {
                scope
                    .ctx
                    .report_invalid(format!("cannot have more than {max} key(s)"));
                return false;
            }
        }
        true
    }
}

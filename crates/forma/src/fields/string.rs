//! String field: length, pattern, and choice constraints, plus the
//! cross-field format and regex-capture helpers.

use std::sync::Arc;

use regex::Regex;

use crate::field::{Field, FieldType, Munged, Outcome};
use crate::form::Scope;
use crate::source::{SourceError, TypeHint};
use crate::value::Value;

/// Builder for a string-typed field.
#[derive(Debug, Clone)]
pub struct StringField {
    pub(crate) field: Field,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    choices: Vec<Value>,
}

impl StringField {
    #[must_use]
    pub fn new() -> Self {
        Self {
            field: Field::any(),
            min_length: None,
            max_length: None,
            pattern: None,
            choices: Vec::new(),
        }
    }

    /// Requires at least `length` characters.
    #[must_use]
    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Allows at most `length` characters.
    #[must_use]
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Requires values to match an anchored pattern.
    ///
    /// # Panics
    ///
    /// On an invalid pattern — a schema declaration mistake.
    #[must_use]
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern).expect("valid string pattern"));
        self
    }

    /// Restricts values to a closed set. Translation targets are also
    /// accepted, so `choices` can name the pre-translation spellings.
    #[must_use]
    pub fn choices<V: Into<Value>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Computes the value from a format string over other fields of the
    /// owning form: `format("/my/{id}", [("id", "id")])` resolves field
    /// `id` (on demand, if it has not mapped yet) and substitutes it.
    #[must_use]
    pub fn format<N, P>(
        mut self,
        fmt: impl Into<String>,
        refs: impl IntoIterator<Item = (N, P)>,
    ) -> Self
    where
        N: Into<String>,
        P: Into<String>,
    {
        let fmt: String = fmt.into();
        let refs: Vec<(String, String)> = refs
            .into_iter()
            .map(|(name, path)| (name.into(), path.into()))
            .collect();
        self.field = self.field.on_compute(move |_, scope| {
            let mut rendered = fmt.clone();
            for (name, path) in &refs {
                let mut atoms = path.split('.');
                let head = atoms.next().unwrap_or(path);
                let Some(mut value) = scope.demand(head) else {
                    scope
                        .ctx
                        .report_invalid(format!("\"{path}\" is not resolvable"));
                    return Outcome::Error;
                };
                for atom in atoms {
                    match value.as_map().and_then(|entries| entries.get(atom)) {
                        Some(inner) => value = inner.clone(),
                        None => {
                            scope
                                .ctx
                                .report_invalid(format!("\"{path}\" is not resolvable"));
                            return Outcome::Error;
                        }
                    }
                }
                rendered = rendered.replace(&format!("{{{name}}}"), &value.to_string());
            }
            Outcome::Value(Value::Str(rendered))
        });
        self
    }

    /// Munges the value through a regex capture: no match defers to the
    /// default; a match keeps the named group (falling back to group 1,
    /// then the whole match).
    ///
    /// # Panics
    ///
    /// On an invalid pattern — a schema declaration mistake.
    #[must_use]
    pub fn capture(mut self, pattern: &str, group: Option<&str>) -> Self {
        let pattern = Regex::new(pattern).expect("valid capture pattern");
        let group = group.map(ToOwned::to_owned);
        self.field = self.field.on_munge(move |field, _, value| {
            let Some(text) = value.as_str() else {
                return Munged::Value(value);
            };
            let Some(captures) = pattern.captures(text) else {
                return Munged::Defer;
            };
            let name = group.as_deref().unwrap_or(field.name());
            let captured = captures
                .name(name)
                .or_else(|| captures.get(1))
                .or_else(|| captures.get(0));
            match captured {
                Some(m) => Munged::Value(Value::Str(m.as_str().to_owned())),
                None => Munged::Defer,
            }
        });
        self
    }
}

impl Default for StringField {
    fn default() -> Self {
        Self::new()
    }
}

super::field_builders!(StringField);

impl From<StringField> for Field {
    fn from(builder: StringField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(StringType {
            min_length: builder.min_length,
            max_length: builder.max_length,
            pattern: builder.pattern,
            choices: builder.choices,
        });
        field
    }
}

#[derive(Debug)]
struct StringType {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    choices: Vec<Value>,
}

impl FieldType for StringType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        scope.source.primitive(scope.ctx.path(), &[TypeHint::Str])
    }

    fn validate(&self, field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            // A munge hook replaced the string; nothing left to check.
            return true;
        };
        let length = text.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                scope
                    .ctx
                    .report_invalid(format!("\"{text}\" must have length >= {min}"));
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                scope
                    .ctx
                    .report_invalid(format!("\"{text}\" must have length <= {max}"));
                return false;
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                scope.ctx.report_invalid(format!(
                    "\"{text}\" must match pattern \"{}\"",
                    pattern.as_str()
                ));
                return false;
            }
        }
        if !self.choices.is_empty() {
            let allowed = self
                .choices
                .iter()
                .chain(field.translations().iter().map(|(_, to)| to));
            if !allowed.clone().any(|choice| choice == value) {
                let listed = allowed
                    .map(|choice| format!("\"{choice}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                if self.choices.len() == 1 && field.translations().is_empty() {
                    scope
                        .ctx
                        .report_invalid(format!("\"{text}\" is not {listed}"));
                } else {
                    scope
                        .ctx
                        .report_invalid(format!("\"{text}\" is not one of {listed}"));
                }
                return false;
            }
        }
        true
    }
}

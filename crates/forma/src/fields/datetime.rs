//! Datetime field: strptime-style parsing with ordering constraints.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::field::{Field, FieldType};
use crate::form::Scope;
use crate::source::{SourceError, TypeHint};
use crate::value::Value;

/// Format actually used when the shorthand `"iso8601"` is declared.
const ISO8601: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Builder for a datetime-typed field.
#[derive(Debug, Clone)]
pub struct DatetimeField {
    pub(crate) field: Field,
    format: String,
    after: Option<NaiveDateTime>,
    before: Option<NaiveDateTime>,
}

impl DatetimeField {
    /// A datetime parsed with the given strptime-style format. The
    /// shorthand `"iso8601"` accepts `2014-03-01T08:00:00` style stamps
    /// with optional fractional seconds.
    #[must_use]
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            field: Field::any(),
            format: format.into(),
            after: None,
            before: None,
        }
    }

    /// Requires timestamps strictly after `value`.
    #[must_use]
    pub fn after(mut self, value: NaiveDateTime) -> Self {
        self.after = Some(value);
        self
    }

    /// Requires timestamps strictly before `value`.
    #[must_use]
    pub fn before(mut self, value: NaiveDateTime) -> Self {
        self.before = Some(value);
        self
    }

    /// Requires `low < value < high`.
    #[must_use]
    pub fn between(self, low: NaiveDateTime, high: NaiveDateTime) -> Self {
        self.after(low).before(high)
    }
}

super::field_builders!(DatetimeField);

impl From<DatetimeField> for Field {
    fn from(builder: DatetimeField) -> Self {
        let format = if builder.format == "iso8601" {
            ISO8601.to_owned()
        } else {
            builder.format
        };
        let mut field = builder.field;
        field.kind = Arc::new(DatetimeType {
            format,
            after: builder.after,
            before: builder.before,
        });
        field
    }
}

#[derive(Debug)]
struct DatetimeType {
    format: String,
    after: Option<NaiveDateTime>,
    before: Option<NaiveDateTime>,
}

impl FieldType for DatetimeType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        let raw = scope.source.primitive(scope.ctx.path(), &[TypeHint::Str])?;
        let text = raw.as_str().unwrap_or_default();
        NaiveDateTime::parse_from_str(text, &self.format)
            .map(Value::DateTime)
            .map_err(|_| {
                SourceError::new(
                    scope.source.render(scope.ctx.path()),
                    format!("\"{text}\" does not match format \"{}\"", self.format),
                )
            })
    }

    fn validate(&self, _field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(stamp) = value.as_datetime() else {
            return true;
        };
        if let Some(after) = self.after {
            if stamp <= after {
                scope.ctx.report_invalid(format!("must be after {after}"));
                return false;
            }
        }
        if let Some(before) = self.before {
            if stamp >= before {
                scope.ctx.report_invalid(format!("must be before {before}"));
                return false;
            }
        }
        true
    }
}

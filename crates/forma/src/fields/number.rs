//! Numeric fields: integer and float, with range constraints and
//! pattern-extraction parsing.

use std::sync::Arc;

use regex::Regex;

use crate::field::{Field, FieldType};
use crate::form::Scope;
use crate::source::{SourceError, TypeHint};
use crate::value::Value;

macro_rules! range_builders {
    ($name:ident, $num:ty) => {
        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self {
                    field: Field::any(),
                    min: None,
                    max: None,
                    pattern: None,
                }
            }

            /// Requires values >= `value`.
            #[must_use]
            pub fn min(mut self, value: $num) -> Self {
                self.min = Some(value);
                self
            }

            /// Requires values <= `value`.
            #[must_use]
            pub fn max(mut self, value: $num) -> Self {
                self.max = Some(value);
                self
            }

            /// Requires `low <= value <= high`.
            #[must_use]
            pub fn range(self, low: $num, high: $num) -> Self {
                self.min(low).max(high)
            }

            /// Parses the number out of a string by regex: the match at
            /// the start of the string is converted.
            ///
            /// # Panics
            ///
            /// On an invalid pattern — a schema declaration mistake.
            #[must_use]
            pub fn pattern(mut self, pattern: &str) -> Self {
                self.pattern = Some(Regex::new(pattern).expect("valid number pattern"));
                self
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Extracts the leading regex match from the string at the live path.
fn matched_text(
    pattern: &Regex,
    scope: &mut Scope<'_>,
) -> Result<String, SourceError> {
    let raw = scope.source.primitive(scope.ctx.path(), &[TypeHint::Str])?;
    let text = raw.as_str().unwrap_or_default();
    match pattern.find(text).filter(|m| m.start() == 0) {
        Some(found) => Ok(found.as_str().to_owned()),
        None => Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            format!(
                "\"{text}\" does not match pattern \"{}\"",
                pattern.as_str()
            ),
        )),
    }
}

// ============================================================================
// INTEGER
// ============================================================================

/// Builder for an integer-typed field.
#[derive(Debug, Clone)]
pub struct IntegerField {
    pub(crate) field: Field,
    min: Option<i64>,
    max: Option<i64>,
    pattern: Option<Regex>,
}

range_builders!(IntegerField, i64);
super::field_builders!(IntegerField);

impl From<IntegerField> for Field {
    fn from(builder: IntegerField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(IntegerType {
            min: builder.min,
            max: builder.max,
            pattern: builder.pattern,
        });
        field
    }
}

#[derive(Debug)]
struct IntegerType {
    min: Option<i64>,
    max: Option<i64>,
    pattern: Option<Regex>,
}

impl FieldType for IntegerType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        match &self.pattern {
            None => scope.source.primitive(scope.ctx.path(), &[TypeHint::Int]),
            Some(pattern) => {
                let text = matched_text(pattern, scope)?;
                text.parse().map(Value::Int).map_err(|_| {
                    SourceError::new(
                        scope.source.render(scope.ctx.path()),
                        format!("\"{text}\" is not an integer"),
                    )
                })
            }
        }
    }

    fn validate(&self, _field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(number) = value.as_float() else {
            return true;
        };
        if let Some(min) = self.min {
            if number < min as f64 {
                scope
                    .ctx
                    .report_invalid(format!("\"{value}\" must be >= {min}"));
                return false;
            }
        }
        if let Some(max) = self.max {
            if number > max as f64 {
                scope
                    .ctx
                    .report_invalid(format!("\"{value}\" must be <= {max}"));
                return false;
            }
        }
        true
    }
}

// ============================================================================
// FLOAT
// ============================================================================

/// Builder for a float-typed field.
#[derive(Debug, Clone)]
pub struct FloatField {
    pub(crate) field: Field,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
}

range_builders!(FloatField, f64);
super::field_builders!(FloatField);

impl From<FloatField> for Field {
    fn from(builder: FloatField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(FloatType {
            min: builder.min,
            max: builder.max,
            pattern: builder.pattern,
        });
        field
    }
}

#[derive(Debug)]
struct FloatType {
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
}

impl FieldType for FloatType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        match &self.pattern {
            None => scope.source.primitive(scope.ctx.path(), &[TypeHint::Float]),
            Some(pattern) => {
                let text = matched_text(pattern, scope)?;
                text.parse().map(Value::Float).map_err(|_| {
                    SourceError::new(
                        scope.source.render(scope.ctx.path()),
                        format!("\"{text}\" is not a float"),
                    )
                })
            }
        }
    }

    fn validate(&self, _field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(number) = value.as_float() else {
            return true;
        };
        if let Some(min) = self.min {
            if number < min {
                scope
                    .ctx
                    .report_invalid(format!("\"{value}\" must be >= {min}"));
                return false;
            }
        }
        if let Some(max) = self.max {
            if number > max {
                scope
                    .ctx
                    .report_invalid(format!("\"{value}\" must be <= {max}"));
                return false;
            }
        }
        true
    }
}

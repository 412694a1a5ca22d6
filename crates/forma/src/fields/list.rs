//! List field: homogeneous repetition with length bounds and optional
//! scalar promotion.

use std::sync::Arc;

use crate::field::{Field, FieldType, Outcome};
use crate::form::Scope;
use crate::path::Segment;
use crate::source::SourceError;
use crate::value::Value;

/// Builder for a list of one element field, repeated per index.
#[derive(Debug, Clone)]
pub struct ListField {
    pub(crate) field: Field,
    element: Field,
    min: Option<usize>,
    max: Option<usize>,
    promote: bool,
}

impl ListField {
    #[must_use]
    pub fn new(element: impl Into<Field>) -> Self {
        Self {
            field: Field::any(),
            element: element.into(),
            min: None,
            max: None,
            promote: false,
        }
    }

    /// Requires at least `length` kept elements.
    #[must_use]
    pub fn min(mut self, length: usize) -> Self {
        self.min = Some(length);
        self
    }

    /// Allows at most `length` kept elements.
    #[must_use]
    pub fn max(mut self, length: usize) -> Self {
        self.max = Some(length);
        self
    }

    /// Requires `low <= length <= high`.
    #[must_use]
    pub fn range(self, low: usize, high: usize) -> Self {
        self.min(low).max(high)
    }

    /// When the source position is not a sequence, attempt the element's
    /// singular parse and wrap the result in a one-element list instead of
    /// failing.
    #[must_use]
    pub fn promote_scalar(mut self) -> Self {
        self.promote = true;
        self
    }
}

super::field_builders!(ListField);

impl From<ListField> for Field {
    fn from(builder: ListField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(ListType {
            element: builder.element,
            min: builder.min,
            max: builder.max,
            promote: builder.promote,
        });
        field
    }
}

#[derive(Debug)]
struct ListType {
    element: Field,
    min: Option<usize>,
    max: Option<usize>,
    promote: bool,
}

impl FieldType for ListType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        // Never reached: compute drives the recursion.
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, _field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let length = match scope.source.sequence(scope.ctx.path()) {
            Ok(length) => length,
            Err(_) if self.promote => {
                tracing::trace!(path = %scope.ctx.path(), "promoting scalar to list");
                return Some(match self.element.map_value(scope, None) {
                    Outcome::Value(value) => Outcome::Value(Value::List(vec![value])),
                    other => other,
                });
            }
            Err(error) => {
                scope.ctx.report_invalid(error.message);
                return Some(Outcome::Error);
            }
        };
        let mut items = Vec::with_capacity(length);
        for index in 0..length {
            let outcome =
                scope.at(Segment::Index(index), |scope| self.element.map_value(scope, None));
            if let Outcome::Value(value) = outcome {
                items.push(value);
            }
        }
        Some(Outcome::Value(Value::List(items)))
    }

    fn validate(&self, _field: &Field, scope: &mut Scope<'_>, value: &Value) -> bool {
        let Some(items) = value.as_list() else {
            return true;
        };
        if let Some(min) = self.min {
            if items.len() < min {
                scope
                    .ctx
                    .report_invalid(format!("must have {min} or more items"));
                return false;
            }
        }
        if let Some(max) = self.max {
            if items.len() > max {
                scope
                    .ctx
                    .report_invalid(format!("must have {max} or fewer items"));
                return false;
            }
        }
        true
    }
}

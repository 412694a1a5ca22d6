//! Tuple field: fixed heterogeneous positions.

use std::sync::Arc;

use crate::field::{Field, FieldType, Outcome};
use crate::form::Scope;
use crate::path::Segment;
use crate::source::SourceError;
use crate::value::Value;

/// Builder for a fixed-arity tuple: one independently typed field per
/// position. The source sequence length must equal the declared arity.
#[derive(Debug, Clone)]
pub struct TupleField {
    pub(crate) field: Field,
    positions: Vec<Field>,
}

impl TupleField {
    #[must_use]
    pub fn new(positions: impl IntoIterator<Item = Field>) -> Self {
        Self {
            field: Field::any(),
            positions: positions.into_iter().collect(),
        }
    }
}

super::field_builders!(TupleField);

impl From<TupleField> for Field {
    fn from(builder: TupleField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(TupleType {
            positions: builder.positions,
        });
        field
    }
}

#[derive(Debug)]
struct TupleType {
    positions: Vec<Field>,
}

impl FieldType for TupleType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, _field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let length = match scope.source.sequence(scope.ctx.path()) {
            Ok(length) => length,
            Err(error) => {
                scope.ctx.report_invalid(error.message);
                return Some(Outcome::Error);
            }
        };
        if length != self.positions.len() {
            scope
                .ctx
                .report_invalid(format!("must have exactly {} items", self.positions.len()));
            return Some(Outcome::Error);
        }
        let mut items = Vec::with_capacity(length);
        for (index, position) in self.positions.iter().enumerate() {
            let outcome =
                scope.at(Segment::Index(index), |scope| position.map_value(scope, None));
            if let Outcome::Value(value) = outcome {
                items.push(value);
            }
        }
        Some(Outcome::Value(Value::List(items)))
    }
}

//! Boolean field.

use std::sync::Arc;

use crate::field::{Field, FieldType};
use crate::form::Scope;
use crate::source::{SourceError, TypeHint};
use crate::value::Value;

/// Builder for a boolean-typed field. Accepts whatever the source's
/// boolean coercion accepts — native booleans, nonzero integers, and the
/// usual string spellings.
#[derive(Debug, Clone)]
pub struct BooleanField {
    pub(crate) field: Field,
}

impl BooleanField {
    #[must_use]
    pub fn new() -> Self {
        Self { field: Field::any() }
    }
}

impl Default for BooleanField {
    fn default() -> Self {
        Self::new()
    }
}

super::field_builders!(BooleanField);

impl From<BooleanField> for Field {
    fn from(builder: BooleanField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(BooleanType);
        field
    }
}

#[derive(Debug, Clone, Copy)]
struct BooleanType;

impl FieldType for BooleanType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        scope.source.primitive(scope.ctx.path(), &[TypeHint::Bool])
    }
}

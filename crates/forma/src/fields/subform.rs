//! Nested forms: plain sub-forms and discriminator-dispatched polymorphic
//! ones.

use std::sync::Arc;

use crate::context::Frame;
use crate::error::SchemaError;
use crate::field::{Field, FieldType, Outcome};
use crate::form::{Record, Schema, Scope, Unmapped, map_fields};
use crate::path::{Path, Segment};
use crate::source::{Source, SourceError, TypeHint};
use crate::value::Value;

// ============================================================================
// SUB-FORM
// ============================================================================

/// Builder for a nested form mapped at this field's position. The nested
/// schema's fields resolve under the field's path; their errors flow into
/// the same collector, already qualified.
#[derive(Debug, Clone)]
pub struct SubFormField {
    pub(crate) field: Field,
    schema: Arc<Schema>,
    unmapped: Unmapped,
}

impl SubFormField {
    #[must_use]
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            field: Field::any(),
            schema: schema.into(),
            unmapped: Unmapped::Ignore,
        }
    }

    /// What happens to source keys no declared nested field claims.
    #[must_use]
    pub fn unmapped(mut self, unmapped: Unmapped) -> Self {
        self.unmapped = unmapped;
        self
    }
}

super::field_builders!(SubFormField);

impl From<SubFormField> for Field {
    fn from(builder: SubFormField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(SubFormType {
            schema: builder.schema,
            unmapped: builder.unmapped,
        });
        field
    }
}

#[derive(Debug)]
struct SubFormType {
    schema: Arc<Schema>,
    unmapped: Unmapped,
}

impl FieldType for SubFormType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, _field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let mut record = Record::new();
        {
            let mut child = scope.child(&mut record, &self.schema);
            child.in_frame(Frame::form(), |child| {
                map_fields(child, false, &self.unmapped);
            });
        }
        Some(Outcome::Value(Value::Map(record)))
    }

    fn nested_schema(&self) -> Option<&Arc<Schema>> {
        Some(&self.schema)
    }
}

// ============================================================================
// POLYMORPHIC SUB-FORM
// ============================================================================

/// Builder for a polymorphic nested form: a registry of
/// `discriminator value -> schema` variants, populated explicitly at
/// schema-definition time. Resolution probes the discriminator key's raw
/// value and fully maps the selected variant; an unregistered value is one
/// Invalid error and no partial record.
#[derive(Debug, Clone)]
pub struct PolyField {
    pub(crate) field: Field,
    discriminator: String,
    variants: Vec<(Value, Arc<Schema>)>,
}

impl PolyField {
    #[must_use]
    pub fn new(discriminator: impl Into<String>) -> Self {
        Self {
            field: Field::any(),
            discriminator: discriminator.into(),
            variants: Vec::new(),
        }
    }

    /// Registers a concrete variant under a discriminator value.
    #[must_use]
    pub fn variant(mut self, value: impl Into<Value>, schema: impl Into<Arc<Schema>>) -> Self {
        self.variants.push((value.into(), schema.into()));
        self
    }

    /// Probes a source's root for the discriminator and returns the
    /// schema registered for its value — the constructor-style dispatch
    /// used before mapping by hand.
    pub fn cast(&self, source: &dyn Source) -> Result<Arc<Schema>, SchemaError> {
        let path: Path = [self.discriminator.as_str()].into_iter().collect();
        let probed = source
            .primitive(&path, &[TypeHint::Auto])
            .map_err(|_| SchemaError::MissingDiscriminator(self.discriminator.clone()))?;
        self.variants
            .iter()
            .find(|(value, _)| *value == probed)
            .map(|(_, schema)| Arc::clone(schema))
            .ok_or_else(|| SchemaError::UnknownVariant(probed.to_string()))
    }
}

super::field_builders!(PolyField);

impl From<PolyField> for Field {
    fn from(builder: PolyField) -> Self {
        let mut field = builder.field;
        field.kind = Arc::new(PolyType {
            discriminator: builder.discriminator,
            variants: builder.variants,
        });
        field
    }
}

#[derive(Debug)]
struct PolyType {
    discriminator: String,
    variants: Vec<(Value, Arc<Schema>)>,
}

impl FieldType for PolyType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        Err(SourceError::new(
            scope.source.render(scope.ctx.path()),
            "is not a primitive",
        ))
    }

    fn compute(&self, _field: &Field, scope: &mut Scope<'_>) -> Option<Outcome> {
        let discriminator = Segment::Key(self.discriminator.clone());
        let probed = scope.at(discriminator, |scope| {
            if !scope.source.exists(scope.ctx.path()) {
                scope.ctx.report_missing();
                return None;
            }
            match scope.source.primitive(scope.ctx.path(), &[TypeHint::Auto]) {
                Ok(value) => Some(value),
                Err(error) => {
                    scope.ctx.report_invalid(error.message);
                    None
                }
            }
        });
        let Some(probed) = probed else {
            return Some(Outcome::Error);
        };

        let Some((_, schema)) = self.variants.iter().find(|(value, _)| *value == probed) else {
            let known = self
                .variants
                .iter()
                .map(|(value, _)| format!("\"{value}\""))
                .collect::<Vec<_>>()
                .join(", ");
            scope.at(Segment::Key(self.discriminator.clone()), |scope| {
                scope
                    .ctx
                    .report_invalid(format!("\"{probed}\" is not one of {known}"));
            });
            return Some(Outcome::Error);
        };

        tracing::debug!(variant = %probed, path = %scope.ctx.path(), "polymorphic dispatch");
        let mut record = Record::new();
        {
            let mut child = scope.child(&mut record, schema);
            child.in_frame(Frame::form(), |child| {
                map_fields(child, false, &Unmapped::Ignore);
            });
        }
        Some(Outcome::Value(Value::Map(record)))
    }

    fn nested_schema(&self) -> Option<&Arc<Schema>> {
        None
    }
}

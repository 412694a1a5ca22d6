//! Schemas, forms, and the mapping pass.
//!
//! Schema declaration is two-phase: a [`Schema`] is an immutable, ordered
//! field list built once per record type through [`SchemaBuilder`], and a
//! [`Form`] is the mutable record a mapping pass populates. Attribute-style
//! access is an explicit lookup against the record, with "never mapped"
//! (absent key) distinct from "mapped to null".
//!
//! ```
//! use forma::source::MemorySource;
//! use forma::{Form, MapOptions, Schema, fields};
//!
//! let schema = Schema::builder()
//!     .field("read_size", fields::integer().min(1).default(1024))
//!     .field("strict", fields::boolean().default(false))
//!     .build();
//!
//! let mut form = Form::new(schema);
//! let errors = form.map(
//!     &MemorySource::from(serde_json::json!({"read_size": 4096})),
//!     &MapOptions::default(),
//! );
//! assert!(errors.is_empty());
//! assert_eq!(form.get("read_size"), Some(&forma::Value::Int(4096)));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::{Context, Frame, FrameKind};
use crate::error::{Errors, MapError};
use crate::field::{Field, Outcome};
use crate::path::Segment;
use crate::source::Source;
use crate::value::Value;

/// The mapped record: field name to resolved value, in assignment order.
pub type Record = IndexMap<String, Value>;

// ============================================================================
// SCHEMA
// ============================================================================

/// An ordered, immutable set of attached fields — the static half of a
/// record type. Built once, shared by `Arc`, usable from any number of
/// forms and traversals.
#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Starts an empty schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    /// The attached fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up an attached field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

/// Builds a [`Schema`], attaching each field exactly once.
///
/// Redeclaring a name replaces the earlier field **in its original
/// position** — extending a base schema keeps the base's declaration
/// order even for overridden fields.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Inherits every field of `base`, in order.
    #[must_use]
    pub fn extend(mut self, base: &Schema) -> Self {
        self.fields.extend(base.fields.iter().cloned());
        self
    }

    /// Attaches a field under `name`.
    #[must_use]
    pub fn field(mut self, name: &str, field: impl Into<Field>) -> Self {
        let mut field = field.into();
        field.attach(name);
        match self.fields.iter().position(|f| f.name() == name) {
            Some(position) => self.fields[position] = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Finishes the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

// ============================================================================
// MAP OPTIONS
// ============================================================================

/// What to do with source keys no declared field claims.
#[derive(Debug, Clone, Default)]
pub enum Unmapped {
    /// Drop them.
    #[default]
    Ignore,
    /// Copy each unclaimed key's raw value into the record under its own
    /// key.
    Capture,
    /// Capture through a caller-supplied key/value field pair.
    With {
        key: Box<Field>,
        value: Box<Field>,
    },
}

impl Unmapped {
    /// Captures unclaimed values through `value`, keeping keys as-is.
    #[must_use]
    pub fn with_value(value: impl Into<Field>) -> Self {
        Unmapped::With {
            key: Box::new(Field::any()),
            value: Box::new(value.into()),
        }
    }

    /// Captures unclaimed entries through a key field and a value field.
    #[must_use]
    pub fn with_pair(key: impl Into<Field>, value: impl Into<Field>) -> Self {
        Unmapped::With {
            key: Box::new(key.into()),
            value: Box::new(value.into()),
        }
    }
}

/// Error propagation mode of a mapping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Collect every violation and report them all (the default).
    #[default]
    Collect,
    /// Stop at the first violation and return just that one.
    Raise,
}

/// Options of one [`Form::map`] pass.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) reset: bool,
    pub(crate) unmapped: Unmapped,
    pub(crate) error: ErrorMode,
    pub(crate) vars: Vec<(String, Value)>,
}

impl MapOptions {
    /// Defines a context variable visible to every hook of the pass (and
    /// to [`from_context`](crate::field::Field::from_context) fields).
    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }

    /// Restricts the pass to fields carrying at least one of `tags`.
    #[must_use]
    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Clears previously assigned values (respecting the tag restriction)
    /// before mapping, for idempotent re-parsing.
    #[must_use]
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sets the unclaimed-key policy.
    #[must_use]
    pub fn unmapped(mut self, unmapped: Unmapped) -> Self {
        self.unmapped = unmapped;
        self
    }

    /// Sets the error propagation mode.
    #[must_use]
    pub fn error(mut self, error: ErrorMode) -> Self {
        self.error = error;
        self
    }
}

// ============================================================================
// SCOPE
// ============================================================================

/// Everything one field resolution can see: the source, the traversal
/// context, and the record and schema of the form being mapped. Handed to
/// every hook.
pub struct Scope<'a> {
    /// The source being mapped from.
    pub source: &'a dyn Source,
    /// The traversal context (path, errors, frames).
    pub ctx: &'a mut Context,
    pub(crate) record: &'a mut Record,
    pub(crate) schema: &'a Schema,
    pub(crate) fail_fast: bool,
}

impl<'a> Scope<'a> {
    /// Read access to the record mapped so far.
    #[must_use]
    pub fn record(&self) -> &Record {
        self.record
    }

    /// The value of a sibling field, resolving it on demand if it has not
    /// mapped yet. On-demand resolution rewinds the context to the owning
    /// form's frame so the sibling's source key resolves against the
    /// form's path, not the caller's.
    pub fn demand(&mut self, name: &str) -> Option<Value> {
        if let Some(value) = self.record.get(name) {
            return Some(value.clone());
        }
        let schema: &Schema = self.schema;
        let field = schema.field(name)?;
        let source = self.source;
        let fail_fast = self.fail_fast;
        let record = &mut *self.record;
        let outcome = self
            .ctx
            .rewind(
                |frame| frame.kind() == FrameKind::Form,
                |ctx| {
                    let mut scope = Scope {
                        source,
                        ctx,
                        record,
                        schema,
                        fail_fast,
                    };
                    field.map_value(&mut scope, None)
                },
            )
            .ok()?;
        match outcome {
            Outcome::Value(value) => {
                self.record.insert(name.to_owned(), value.clone());
                Some(value)
            }
            Outcome::Absent | Outcome::Error => None,
        }
    }

    pub(crate) fn at<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> T) -> T {
        self.ctx.push_segment(segment);
        let out = f(self);
        self.ctx.pop_segment();
        out
    }

    pub(crate) fn in_frame<T>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> T) -> T {
        self.ctx.push_frame(frame);
        let out = f(self);
        self.ctx.pop_frame();
        out
    }

    pub(crate) fn child<'b>(&'b mut self, record: &'b mut Record, schema: &'b Schema) -> Scope<'b> {
        Scope {
            source: self.source,
            ctx: &mut *self.ctx,
            record,
            schema,
            fail_fast: self.fail_fast,
        }
    }
}

// ============================================================================
// MAPPING PASS
// ============================================================================

fn active_tags(ctx: &Context) -> Option<Vec<String>> {
    let tags = ctx.var("tags")?.as_list()?;
    Some(
        tags.iter()
            .filter_map(|tag| tag.as_str().map(ToOwned::to_owned))
            .collect(),
    )
}

fn tag_match(tags: &Option<Vec<String>>, field: &Field) -> bool {
    match tags {
        None => true,
        Some(tags) => tags.iter().any(|tag| field.has_tag(tag)),
    }
}

/// Maps every field of the scope's schema into its record, in declaration
/// order, then applies the unclaimed-key policy. One failing field never
/// aborts the pass (unless the pass is fail-fast). Fields already present
/// in the record are skipped — re-mapping is idempotent unless reset.
pub(crate) fn map_fields(scope: &mut Scope<'_>, reset: bool, unmapped: &Unmapped) {
    let tags = active_tags(scope.ctx);
    if reset {
        let stale: Vec<String> = scope
            .schema
            .fields()
            .iter()
            .filter(|field| tag_match(&tags, field))
            .map(|field| field.name().to_owned())
            .collect();
        for name in stale {
            scope.record.shift_remove(&name);
        }
    }

    let schema: &Schema = scope.schema;
    for field in schema.fields() {
        if !tag_match(&tags, field) {
            continue;
        }
        if scope.record.contains_key(field.name()) {
            continue;
        }
        match field.map_value(scope, None) {
            Outcome::Value(value) => {
                scope.record.insert(field.name().to_owned(), value);
            }
            Outcome::Absent | Outcome::Error => {}
        }
        if scope.fail_fast && !scope.ctx.errors().is_empty() {
            return;
        }
    }

    apply_unmapped(scope, unmapped);
}

/// Absorbs source keys no declared field claimed, per policy.
fn apply_unmapped(scope: &mut Scope<'_>, unmapped: &Unmapped) {
    let (key_field, value_field) = match unmapped {
        Unmapped::Ignore => return,
        Unmapped::Capture => (None, None),
        Unmapped::With { key, value } => (Some(key.as_ref()), Some(value.as_ref())),
    };
    let Ok(keys) = scope.source.mapping(scope.ctx.path()) else {
        return;
    };
    let schema: &Schema = scope.schema;
    let claimed: Vec<&str> = schema.fields().iter().filter_map(Field::src_key).collect();
    let passthrough = Field::any();
    let value_field = value_field.unwrap_or(&passthrough);

    for key in keys {
        if claimed.contains(&key.as_str()) || scope.record.contains_key(&key) {
            continue;
        }
        let captured = scope.at(Segment::Key(key.clone()), |scope| {
            let Outcome::Value(value) = value_field.map_value(scope, None) else {
                return None;
            };
            let key = match key_field {
                None => key.clone(),
                Some(field) => match field.map_value(scope, Some(Value::Str(key.clone()))) {
                    Outcome::Value(mapped) => mapped.to_string(),
                    Outcome::Absent | Outcome::Error => return None,
                },
            };
            Some((key, value))
        });
        if let Some((key, value)) = captured {
            scope.record.insert(key, value);
        }
    }
}

// ============================================================================
// FORM
// ============================================================================

/// The mutable half of a record type: a schema plus the values one or
/// more mapping passes assigned.
#[derive(Debug, Clone)]
pub struct Form {
    schema: Arc<Schema>,
    values: Record,
}

impl Form {
    /// An empty form over a schema.
    #[must_use]
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            values: Record::new(),
        }
    }

    /// Construct-and-map in one step, failing on the first error.
    pub fn parse(
        schema: impl Into<Arc<Schema>>,
        source: &dyn Source,
    ) -> Result<Self, MapError> {
        let mut form = Self::new(schema);
        let mut errors = form.map(source, &MapOptions::default().error(ErrorMode::Raise));
        match errors.take_first() {
            Some(error) => Err(error),
            None => Ok(form),
        }
    }

    /// The schema this form maps.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Maps the schema's fields from `source`, collecting errors.
    ///
    /// The full-control entry point: restrict by tags, reset previously
    /// assigned values, absorb unclaimed keys, or switch to fail-fast
    /// error mode — see [`MapOptions`].
    pub fn map(&mut self, source: &dyn Source, options: &MapOptions) -> Errors {
        tracing::debug!(
            fields = self.schema.fields().len(),
            reset = options.reset,
            "mapping form"
        );
        let mut ctx = Context::new();
        let mut frame = Frame::form();
        if let Some(tags) = &options.tags {
            frame = frame.with_var(
                "tags",
                Value::List(tags.iter().map(|tag| Value::from(tag.as_str())).collect()),
            );
        }
        for (name, value) in &options.vars {
            frame = frame.with_var(name.clone(), value.clone());
        }

        let schema = Arc::clone(&self.schema);
        {
            let mut scope = Scope {
                source,
                ctx: &mut ctx,
                record: &mut self.values,
                schema: &schema,
                fail_fast: options.error == ErrorMode::Raise,
            };
            scope.in_frame(frame, |scope| {
                map_fields(scope, options.reset, &options.unmapped);
            });
        }

        let mut errors = ctx.take_errors();
        if options.error == ErrorMode::Raise {
            if let Some(first) = errors.take_first() {
                errors = Errors::new();
                errors.push(first);
            }
        }
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "mapping finished with errors");
        }
        errors
    }

    /// The mapped value of a field, if the field has been assigned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Assigns a field value directly.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// The record mapped so far.
    #[must_use]
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Consumes the form, returning the record.
    #[must_use]
    pub fn into_values(self) -> Record {
        self.values
    }

    /// The record as a [`Value::Map`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(self.values.clone())
    }

    /// Number of assigned fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no field has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A new form containing only the assigned fields matching (or, with
    /// `inv`, not matching) the given tags, recursing into sub-form
    /// values.
    #[must_use]
    pub fn filter(&self, tags: &[&str], inv: bool) -> Self {
        let mut out = Self::new(Arc::clone(&self.schema));
        for field in self.schema.fields() {
            let Some(value) = self.values.get(field.name()) else {
                continue;
            };
            let matched = tags.iter().any(|tag| field.has_tag(tag));
            if matched == inv {
                continue;
            }
            let value = match (field.kind.nested_schema(), value.as_map()) {
                (Some(nested), Some(entries)) => {
                    let nested_form = Form {
                        schema: Arc::clone(nested),
                        values: entries.clone(),
                    };
                    Value::Map(nested_form.filter(tags, inv).values)
                }
                _ => value.clone(),
            };
            out.values.insert(field.name().to_owned(), value);
        }
        out
    }

    /// Iterates the assigned `(name, value)` entries in assignment order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a Form {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn builder_attaches_names_in_declaration_order() {
        let schema = Schema::builder()
            .field("first", fields::integer())
            .field("second", fields::string())
            .build();
        let names: Vec<_> = schema.fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(schema.field("second").unwrap().src_key(), Some("second"));
    }

    #[test]
    fn override_keeps_the_base_position() {
        let base = Schema::builder()
            .field("id", fields::integer())
            .field("kind", fields::string())
            .field("note", fields::string().default("-"))
            .build();
        let derived = Schema::builder()
            .extend(&base)
            .field("extra", fields::boolean().default(false))
            .field("kind", fields::string().choices(["a", "b"]))
            .build();
        let names: Vec<_> = derived.fields().iter().map(Field::name).collect();
        // The redeclared "kind" stays in the base's slot.
        assert_eq!(names, vec!["id", "kind", "note", "extra"]);
    }

    #[test]
    fn explicit_src_survives_attachment() {
        let schema = Schema::builder()
            .field("renamed", fields::boolean().src("raw_name"))
            .build();
        assert_eq!(schema.field("renamed").unwrap().src_key(), Some("raw_name"));
    }
}

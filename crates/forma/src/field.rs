//! The schema node: one addressable value and the pipeline that maps it.
//!
//! A [`Field`] declares how a single value is located, parsed, transformed,
//! and validated. Mapping one field runs a fixed pipeline:
//!
//! ```text
//! resolve -> parse -> munge -> filter -> validate -> (default fallback)
//! ```
//!
//! Every stage has a built-in behavior and an independently substitutable
//! hook slot, installed at construction time. Stages communicate through
//! [`Outcome`] — a tagged result, never an exception-shaped control flow:
//! a failing stage records exactly one error against the live path and
//! yields [`Outcome::Error`]; a filtered or deferred value falls back to
//! the declared default.

use std::sync::Arc;

use crate::context::Frame;
use crate::form::Scope;
use crate::path::Segment;
use crate::source::{SourceError, TypeHint};
use crate::value::Value;

// ============================================================================
// OUTCOME
// ============================================================================

/// The tagged result of mapping one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A successfully computed (or defaulted) value.
    Value(Value),
    /// Nothing to assign and nothing wrong; the caller skips this field.
    Absent,
    /// An error was recorded in the active collector; the caller skips
    /// this field and continues with the next one.
    Error,
}

impl Outcome {
    /// The value, if this outcome carries one.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Absent | Outcome::Error => None,
        }
    }
}

/// What the compute step decided, before munging starts.
enum Computed {
    /// The path resolved; carry its outcome through the pipeline.
    Outcome(Outcome),
    /// The path is absent; route straight to the default stage.
    Missing,
}

/// What a munge hook decided. "Defer to default" and "explicit discard"
/// are deliberately distinct outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Munged {
    /// Continue the pipeline with this (possibly replaced) value.
    Value(Value),
    /// Treat the value as absent: fall back to the field default.
    Defer,
    /// Short-circuit to [`Outcome::Error`]. Nothing is recorded
    /// implicitly; the hook reports its own violation if one is wanted.
    Discard,
}

// ============================================================================
// DECLARATION PIECES
// ============================================================================

/// Where a field's value lives relative to the current source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrcSpec {
    /// Use the field's attached name as the source key (the default).
    Name,
    /// Use an explicit source key.
    Key(String),
    /// No key at all: the field maps the entire current source position.
    /// Envelope fields and composite children use this.
    Whole,
}

/// A declared default: a value used verbatim, or a factory invoked fresh
/// per use so mutable defaults are never shared between records.
#[derive(Clone)]
pub enum DefaultSpec {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl std::fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultSpec::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultSpec::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// ============================================================================
// HOOKS
// ============================================================================

/// Replaces resolve + parse entirely.
pub type ComputeFn = dyn Fn(&Field, &mut Scope<'_>) -> Outcome + Send + Sync;
/// Replaces the existence probe of the resolve stage.
pub type ResolveFn = dyn Fn(&Field, &mut Scope<'_>) -> bool + Send + Sync;
/// Replaces the built-in typed parse.
pub type ParseFn = dyn Fn(&Field, &mut Scope<'_>) -> Result<Value, SourceError> + Send + Sync;
/// Transforms a parsed value.
pub type MungeFn = dyn Fn(&Field, &mut Scope<'_>, Value) -> Munged + Send + Sync;
/// Keeps (true) or rejects (false, falling back to default) a value.
pub type FilterFn = dyn Fn(&Field, &Scope<'_>, &Value) -> bool + Send + Sync;
/// Accepts (true) or rejects (false, recording its own violation) a value.
pub type ValidateFn = dyn Fn(&Field, &mut Scope<'_>, &Value) -> bool + Send + Sync;

/// The six override slots. Empty slots fall through to built-in behavior.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) compute: Option<Arc<ComputeFn>>,
    pub(crate) resolve: Option<Arc<ResolveFn>>,
    pub(crate) parse: Option<Arc<ParseFn>>,
    pub(crate) munge: Option<Arc<MungeFn>>,
    pub(crate) filter: Option<Arc<FilterFn>>,
    pub(crate) validate: Option<Arc<ValidateFn>>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = Vec::new();
        if self.compute.is_some() {
            set.push("compute");
        }
        if self.resolve.is_some() {
            set.push("resolve");
        }
        if self.parse.is_some() {
            set.push("parse");
        }
        if self.munge.is_some() {
            set.push("munge");
        }
        if self.filter.is_some() {
            set.push("filter");
        }
        if self.validate.is_some() {
            set.push("validate");
        }
        write!(f, "Hooks({})", set.join(", "))
    }
}

// ============================================================================
// FIELD TYPE
// ============================================================================

/// The type-specific behavior slot of a field.
///
/// Scalar types implement [`FieldType::parse`] (and constraint checks in
/// [`FieldType::validate`]); composite types take over the whole compute
/// step via [`FieldType::compute`] to recurse into nested structure.
pub trait FieldType: std::fmt::Debug + Send + Sync {
    /// Parses the value at the live path into a typed [`Value`].
    fn parse(&self, field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError>;

    /// Full compute override. `None` means "use the ordinary parse flow";
    /// composites return `Some` and drive their own recursion. Only
    /// called once the path is known to exist and hold a non-null value —
    /// missing paths fall back to the default and null surfaces as
    /// [`Value::Null`] before this runs.
    fn compute(&self, _field: &Field, _scope: &mut Scope<'_>) -> Option<Outcome> {
        None
    }

    /// Type-specific constraint checks. Record violations through the
    /// scope and return false to fail the field. Never called for null
    /// values — nullability is checked separately.
    fn validate(&self, _field: &Field, _scope: &mut Scope<'_>, _value: &Value) -> bool {
        true
    }

    /// The nested schema, for field types that wrap one. Lets record
    /// post-processing (tag filtering) recurse without downcasting.
    fn nested_schema(&self) -> Option<&Arc<crate::form::Schema>> {
        None
    }
}

/// Raw pass-through: whatever the source holds at the path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnyType;

impl FieldType for AnyType {
    fn parse(&self, _field: &Field, scope: &mut Scope<'_>) -> Result<Value, SourceError> {
        scope.source.primitive(scope.ctx.path(), &[TypeHint::Auto])
    }
}

// ============================================================================
// FIELD
// ============================================================================

/// A single schema node.
///
/// Structural identity (name and source key) is fixed once the field is
/// attached to a schema; everything else is configured up front through
/// the builder methods.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) src: SrcSpec,
    pub(crate) default: Option<DefaultSpec>,
    pub(crate) nullable: Option<bool>,
    pub(crate) ignores: Vec<Value>,
    pub(crate) translations: Vec<(Value, Value)>,
    pub(crate) tags: Vec<String>,
    pub(crate) kind: Arc<dyn FieldType>,
    pub(crate) hooks: Hooks,
}

impl Field {
    /// An untyped pass-through field.
    #[must_use]
    pub fn any() -> Self {
        Self::with_kind(Arc::new(AnyType))
    }

    /// A field with an explicit type implementation.
    #[must_use]
    pub fn with_kind(kind: Arc<dyn FieldType>) -> Self {
        Self {
            name: String::new(),
            src: SrcSpec::Name,
            default: None,
            nullable: None,
            ignores: Vec::new(),
            translations: Vec::new(),
            tags: Vec::new(),
            kind,
            hooks: Hooks::default(),
        }
    }

    // ==================== Builder surface ====================

    /// Sets the source key this field resolves from. Defaults to the
    /// attached name.
    #[must_use]
    pub fn src(mut self, key: impl Into<String>) -> Self {
        self.src = SrcSpec::Key(key.into());
        self
    }

    /// Maps the entire current source position instead of a keyed entry —
    /// the envelope-field configuration.
    #[must_use]
    pub fn src_whole(mut self) -> Self {
        self.src = SrcSpec::Whole;
        self
    }

    /// Declares a default used when the source key is absent. Without a
    /// default the field is required.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Value(value.into()));
        self
    }

    /// Declares a default factory, invoked fresh on every use.
    #[must_use]
    pub fn default_fn(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultSpec::Factory(Arc::new(factory)));
        self
    }

    /// Whether a null value is acceptable. Unset, nullability follows the
    /// default: a field whose default is null is nullable.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Adds a literal value treated as absent (routing to the default).
    #[must_use]
    pub fn ignore(mut self, value: impl Into<Value>) -> Self {
        self.ignores.push(value.into());
        self
    }

    /// Adds a literal translation applied during the munge stage.
    #[must_use]
    pub fn translate(mut self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.translations.push((from.into(), to.into()));
        self
    }

    /// Tags this field for selective mapping and record filtering.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    // ==================== Hook slots ====================

    /// Replaces resolve + parse with a computation.
    #[must_use]
    pub fn on_compute(
        mut self,
        hook: impl Fn(&Field, &mut Scope<'_>) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.hooks.compute = Some(Arc::new(hook));
        self
    }

    /// Replaces the existence probe.
    #[must_use]
    pub fn on_resolve(
        mut self,
        hook: impl Fn(&Field, &mut Scope<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hooks.resolve = Some(Arc::new(hook));
        self
    }

    /// Replaces the built-in typed parse.
    #[must_use]
    pub fn on_parse(
        mut self,
        hook: impl Fn(&Field, &mut Scope<'_>) -> Result<Value, SourceError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.parse = Some(Arc::new(hook));
        self
    }

    /// Transforms parsed values.
    #[must_use]
    pub fn on_munge(
        mut self,
        hook: impl Fn(&Field, &mut Scope<'_>, Value) -> Munged + Send + Sync + 'static,
    ) -> Self {
        self.hooks.munge = Some(Arc::new(hook));
        self
    }

    /// Keeps or rejects computed values; rejection falls back to the
    /// default.
    #[must_use]
    pub fn on_filter(
        mut self,
        hook: impl Fn(&Field, &Scope<'_>, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hooks.filter = Some(Arc::new(hook));
        self
    }

    /// Adds a validation predicate; a rejecting hook records its own
    /// violation.
    #[must_use]
    pub fn on_validate(
        mut self,
        hook: impl Fn(&Field, &mut Scope<'_>, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hooks.validate = Some(Arc::new(hook));
        self
    }

    // ==================== Canned hooks ====================

    /// Computes a constant, whatever the source holds.
    #[must_use]
    pub fn constant(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.on_compute(move |_, _| Outcome::Value(value.clone()))
    }

    /// Computes the field by resolving its source key as a dotted variable
    /// path through the traversal context instead of the source.
    #[must_use]
    pub fn from_context(self) -> Self {
        self.on_compute(|field, scope| {
            let key = field.src_key().unwrap_or(&field.name).to_owned();
            match scope.ctx.lookup(&key) {
                Ok(value) => Outcome::Value(value),
                Err(error) => {
                    scope.ctx.report_invalid(error.to_string());
                    Outcome::Error
                }
            }
        })
    }

    // ==================== Introspection ====================

    /// The attached name. Empty until the field joins a schema.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit source key, if one was declared.
    #[must_use]
    pub fn src_key(&self) -> Option<&str> {
        match &self.src {
            SrcSpec::Key(key) => Some(key),
            SrcSpec::Name if !self.name.is_empty() => Some(&self.name),
            _ => None,
        }
    }

    /// True if the field carries this tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The field's tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The field's literal translation table.
    #[must_use]
    pub fn translations(&self) -> &[(Value, Value)] {
        &self.translations
    }

    /// Effective nullability: explicit flag, else true iff the default is
    /// null.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(matches!(
            &self.default,
            Some(DefaultSpec::Value(Value::Null))
        ))
    }

    /// True if the field has no default and is therefore required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub(crate) fn attach(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn segment(&self) -> Option<Segment> {
        self.src_key().map(|key| Segment::Key(key.to_owned()))
    }

    // ==================== Pipeline ====================

    /// Maps this field's value from the scope's source position.
    ///
    /// `precomputed` skips the compute step — composite fields use it to
    /// feed a value that never lived at a path of its own (a mapping key,
    /// for instance) through the rest of the pipeline.
    pub(crate) fn map_value(&self, scope: &mut Scope<'_>, precomputed: Option<Value>) -> Outcome {
        scope.in_frame(Frame::field(), |scope| match self.segment() {
            Some(segment) => scope.at(segment, |scope| self.run(scope, precomputed)),
            None => self.run(scope, precomputed),
        })
    }

    fn run(&self, scope: &mut Scope<'_>, precomputed: Option<Value>) -> Outcome {
        let computed = match precomputed {
            Some(value) => Outcome::Value(value),
            None => match self.compute(scope) {
                // A missing path is terminal: the default is used verbatim
                // (or a Missing error recorded), never munged or validated.
                Computed::Missing => return self.fallback(scope),
                Computed::Outcome(outcome) => outcome,
            },
        };
        let Outcome::Value(mut value) = computed else {
            return computed;
        };

        // Munge: literal translations, then the hook.
        if let Some((_, to)) = self.translations.iter().find(|(from, _)| *from == value) {
            value = to.clone();
        }
        if let Some(hook) = &self.hooks.munge {
            match hook(self, scope, value) {
                Munged::Value(munged) => value = munged,
                Munged::Defer => return self.fallback(scope),
                Munged::Discard => return Outcome::Error,
            }
        }

        // Filter: literal ignores, then the hook. Rejection means "treat
        // as absent", not "error".
        if self.ignores.iter().any(|ignored| *ignored == value) {
            return self.fallback(scope);
        }
        if let Some(hook) = &self.hooks.filter {
            if !hook(self, scope, &value) {
                return self.fallback(scope);
            }
        }

        // Validate: nullability, typed constraints, then the hook.
        if value.is_null() {
            if !self.is_nullable() {
                scope.ctx.report_invalid("not nullable");
                return Outcome::Error;
            }
        } else if !self.kind.validate(self, scope, &value) {
            return Outcome::Error;
        }
        if let Some(hook) = &self.hooks.validate {
            if !hook(self, scope, &value) {
                return Outcome::Error;
            }
        }

        tracing::trace!(field = %self.name, path = %scope.ctx.path(), "mapped");
        Outcome::Value(value)
    }

    fn compute(&self, scope: &mut Scope<'_>) -> Computed {
        // An installed compute hook replaces resolve and parse entirely;
        // its outcome still flows through munge, filter, and validate.
        if let Some(hook) = &self.hooks.compute {
            return Computed::Outcome(hook(self, scope));
        }

        // Resolve.
        let present = match &self.hooks.resolve {
            Some(hook) => hook(self, scope),
            None => scope.source.exists(scope.ctx.path()),
        };
        if !present {
            return Computed::Missing;
        }
        if scope.source.is_null(scope.ctx.path()) {
            return Computed::Outcome(Outcome::Value(Value::Null));
        }

        // Composite recursion, or the typed parse.
        if let Some(outcome) = self.kind.compute(self, scope) {
            return Computed::Outcome(outcome);
        }
        let parsed = match &self.hooks.parse {
            Some(hook) => hook(self, scope),
            None => self.kind.parse(self, scope),
        };
        Computed::Outcome(match parsed {
            Ok(value) => Outcome::Value(value),
            Err(error) => {
                scope.ctx.report_invalid(error.message);
                Outcome::Error
            }
        })
    }

    /// The default stage: a missing required field records one Missing
    /// error; factories run fresh per use.
    pub(crate) fn fallback(&self, scope: &mut Scope<'_>) -> Outcome {
        match &self.default {
            None => {
                scope.ctx.report_missing();
                Outcome::Error
            }
            Some(DefaultSpec::Value(value)) => Outcome::Value(value.clone()),
            Some(DefaultSpec::Factory(factory)) => Outcome::Value(factory()),
        }
    }
}

//! Typed field constructors.
//!
//! Every concrete field type is a thin builder over the common [`Field`]
//! core: type-specific options live on the wrapper, everything else
//! (source key, default, nullability, ignores, translations, tags, hook
//! slots) delegates down. Convert with `Into<Field>` — attaching to a
//! schema does this for you.
//!
//! ```
//! use forma::fields;
//!
//! let age = fields::integer().min(0).max(150).src("years");
//! let kind = fields::string().choices(["cat", "dog"]);
//! ```

mod boolean;
mod datetime;
mod dict;
mod group;
mod list;
mod number;
mod string;
mod subform;
mod tuple;

pub use boolean::BooleanField;
pub use datetime::DatetimeField;
pub use dict::DictField;
pub use group::{GroupField, KeySpec};
pub use list::ListField;
pub use number::{FloatField, IntegerField};
pub use string::StringField;
pub use subform::{PolyField, SubFormField};
pub use tuple::TupleField;

use crate::field::Field;
use crate::form::Schema;
use std::sync::Arc;

/// Generates the common builder surface for a typed field wrapper, all
/// delegating to the embedded [`Field`](crate::field::Field).
macro_rules! field_builders {
    ($name:ident) => {
        impl $name {
            /// Sets the source key. See [`Field::src`](crate::field::Field::src).
            #[must_use]
            pub fn src(mut self, key: impl Into<String>) -> Self {
                self.field = self.field.src(key);
                self
            }

            /// Maps the whole current source position.
            /// See [`Field::src_whole`](crate::field::Field::src_whole).
            #[must_use]
            pub fn src_whole(mut self) -> Self {
                self.field = self.field.src_whole();
                self
            }

            /// Declares a default value.
            /// See [`Field::default`](crate::field::Field::default).
            #[must_use]
            pub fn default(mut self, value: impl Into<$crate::Value>) -> Self {
                self.field = self.field.default(value);
                self
            }

            /// Declares a default factory.
            /// See [`Field::default_fn`](crate::field::Field::default_fn).
            #[must_use]
            pub fn default_fn(
                mut self,
                factory: impl Fn() -> $crate::Value + Send + Sync + 'static,
            ) -> Self {
                self.field = self.field.default_fn(factory);
                self
            }

            /// Sets nullability explicitly.
            #[must_use]
            pub fn nullable(mut self, nullable: bool) -> Self {
                self.field = self.field.nullable(nullable);
                self
            }

            /// Adds an ignored literal.
            #[must_use]
            pub fn ignore(mut self, value: impl Into<$crate::Value>) -> Self {
                self.field = self.field.ignore(value);
                self
            }

            /// Adds a literal translation.
            #[must_use]
            pub fn translate(
                mut self,
                from: impl Into<$crate::Value>,
                to: impl Into<$crate::Value>,
            ) -> Self {
                self.field = self.field.translate(from, to);
                self
            }

            /// Adds a tag.
            #[must_use]
            pub fn tag(mut self, tag: impl Into<String>) -> Self {
                self.field = self.field.tag(tag);
                self
            }

            /// Installs a compute hook.
            #[must_use]
            pub fn on_compute(
                mut self,
                hook: impl Fn(&$crate::field::Field, &mut $crate::form::Scope<'_>) -> $crate::field::Outcome
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_compute(hook);
                self
            }

            /// Installs a resolve hook.
            #[must_use]
            pub fn on_resolve(
                mut self,
                hook: impl Fn(&$crate::field::Field, &mut $crate::form::Scope<'_>) -> bool
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_resolve(hook);
                self
            }

            /// Installs a parse hook.
            #[must_use]
            pub fn on_parse(
                mut self,
                hook: impl Fn(
                        &$crate::field::Field,
                        &mut $crate::form::Scope<'_>,
                    )
                        -> Result<$crate::Value, $crate::source::SourceError>
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_parse(hook);
                self
            }

            /// Installs a munge hook.
            #[must_use]
            pub fn on_munge(
                mut self,
                hook: impl Fn(
                        &$crate::field::Field,
                        &mut $crate::form::Scope<'_>,
                        $crate::Value,
                    ) -> $crate::field::Munged
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_munge(hook);
                self
            }

            /// Installs a filter hook.
            #[must_use]
            pub fn on_filter(
                mut self,
                hook: impl Fn(&$crate::field::Field, &$crate::form::Scope<'_>, &$crate::Value) -> bool
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_filter(hook);
                self
            }

            /// Installs a validate hook.
            #[must_use]
            pub fn on_validate(
                mut self,
                hook: impl Fn(&$crate::field::Field, &mut $crate::form::Scope<'_>, &$crate::Value) -> bool
                    + Send
                    + Sync
                    + 'static,
            ) -> Self {
                self.field = self.field.on_validate(hook);
                self
            }

            /// Computes a constant.
            /// See [`Field::constant`](crate::field::Field::constant).
            #[must_use]
            pub fn constant(mut self, value: impl Into<$crate::Value>) -> Self {
                self.field = self.field.constant(value);
                self
            }

            /// Computes from context variables.
            /// See [`Field::from_context`](crate::field::Field::from_context).
            #[must_use]
            pub fn from_context(mut self) -> Self {
                self.field = self.field.from_context();
                self
            }
        }
    };
}

pub(crate) use field_builders;

// ============================================================================
// FACTORIES
// ============================================================================

/// An untyped pass-through field.
#[must_use]
pub fn any() -> Field {
    Field::any()
}

/// A string field.
#[must_use]
pub fn string() -> StringField {
    StringField::new()
}

/// An integer field.
#[must_use]
pub fn integer() -> IntegerField {
    IntegerField::new()
}

/// A float field.
#[must_use]
pub fn float() -> FloatField {
    FloatField::new()
}

/// A boolean field.
#[must_use]
pub fn boolean() -> BooleanField {
    BooleanField::new()
}

/// A datetime field parsing the given strptime-style format (or the
/// `"iso8601"` shorthand).
#[must_use]
pub fn datetime(format: impl Into<String>) -> DatetimeField {
    DatetimeField::new(format)
}

/// A homogeneous list of `element` fields.
#[must_use]
pub fn list(element: impl Into<Field>) -> ListField {
    ListField::new(element)
}

/// A fixed-arity tuple of positional fields.
#[must_use]
pub fn tuple(fields: impl IntoIterator<Item = Field>) -> TupleField {
    TupleField::new(fields)
}

/// A mapping with typed keys and values.
#[must_use]
pub fn dict(key: impl Into<Field>, value: impl Into<Field>) -> DictField {
    DictField::new(key, value)
}

/// A nested form mapped at this field's position.
#[must_use]
pub fn subform(schema: impl Into<Arc<Schema>>) -> SubFormField {
    SubFormField::new(schema)
}

/// A polymorphic nested form dispatching on a discriminator key.
#[must_use]
pub fn poly(discriminator: impl Into<String>) -> PolyField {
    PolyField::new(discriminator)
}

/// A grouped field matching alternative source-key specs.
#[must_use]
pub fn group() -> GroupField {
    GroupField::new()
}

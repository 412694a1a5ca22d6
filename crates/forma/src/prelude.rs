//! Prelude module for convenient imports.
//!
//! ```
//! use forma::prelude::*;
//!
//! let schema = Schema::builder()
//!     .field("kind", string().choices(["cat", "dog"]))
//!     .build();
//! ```

pub use crate::context::{Context, ContextError, Frame, FrameKind};
pub use crate::error::{ErrorCause, Errors, MapError, SchemaError};
pub use crate::field::{Field, FieldType, Munged, Outcome};
pub use crate::fields::{
    BooleanField, DatetimeField, DictField, FloatField, GroupField, IntegerField, KeySpec,
    ListField, PolyField, StringField, SubFormField, TupleField, any, boolean, datetime, dict,
    float, group, integer, list, poly, string, subform, tuple,
};
pub use crate::form::{ErrorMode, Form, MapOptions, Record, Schema, SchemaBuilder, Scope, Unmapped};
pub use crate::path::{Path, Segment};
pub use crate::source::{
    ConfigSource, JsonSource, MemorySource, Merge, Source, SourceError, TypeHint, UnionSource,
};
pub use crate::value::{Value, ValueKind};

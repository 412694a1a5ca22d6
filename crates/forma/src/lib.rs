//! # forma
//!
//! Declarative data mapping and validation: schemas of typed fields are
//! resolved against path-addressable sources — in-memory values, INI-style
//! config text, JSON documents, or unions of several — into ordered
//! records, collecting every violation with the exact path at which it
//! happened.
//!
//! ## Quick Start
//!
//! ```
//! use forma::source::MemorySource;
//! use forma::{Form, MapOptions, Schema, Value, fields};
//!
//! let schema = Schema::builder()
//!     .field("name", fields::string().min_length(1))
//!     .field("port", fields::integer().range(1, 65535).default(8080))
//!     .build();
//!
//! let source = MemorySource::from(serde_json::json!({"name": "slurp"}));
//! let form = Form::parse(schema, &source).unwrap();
//! assert_eq!(form.get("port"), Some(&Value::Int(8080)));
//! ```
//!
//! ## How a field maps
//!
//! Each field runs a fixed pipeline — resolve, parse, munge, filter,
//! validate, with a default fallback — and each stage is a hook slot that
//! can be replaced per field at construction time. Composite fields (
//! [`fields::list`], [`fields::tuple`], [`fields::dict`],
//! [`fields::subform`], [`fields::poly`], [`fields::group`]) recurse
//! through nested structure, pushing path segments so every recorded
//! error carries its full location, like `items[1].name`.
//!
//! ## Errors
//!
//! A mapping pass keeps going past failures and reports everything at
//! once — a caller fixing a multi-field payload sees all violations, not
//! just the first. [`ErrorMode::Raise`](crate::ErrorMode) flips one pass
//! to fail-fast.

// MapError carries an owned path and message; boxing the error type would
// indirect every mapping result for no practical benefit.
#![allow(clippy::result_large_err)]

pub mod context;
pub mod error;
pub mod field;
pub mod fields;
pub mod form;
pub mod path;
pub mod prelude;
pub mod source;
pub mod value;

pub use context::{Context, ContextError, Frame, FrameKind};
pub use error::{ErrorCause, Errors, MapError, SchemaError};
pub use field::{Field, Munged, Outcome};
pub use form::{ErrorMode, Form, MapOptions, Record, Schema, SchemaBuilder, Scope, Unmapped};
pub use path::{Path, Segment};
pub use value::{Value, ValueKind};

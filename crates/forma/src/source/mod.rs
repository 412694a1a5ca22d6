//! Path-addressable backends a schema maps values out of.
//!
//! A [`Source`] answers a small set of questions about a [`Path`]: does it
//! exist, is it explicitly null, what primitive does it hold, how long is
//! the sequence there, what keys does the mapping there have. Everything a
//! source hands back is already materialized — construction parses text or
//! takes ownership of a value tree; traversal never touches I/O.
//!
//! Four backends ship with the crate:
//!
//! - [`MemorySource`] — an owned [`Value`](crate::Value) tree
//! - [`ConfigSource`] — INI-style section/option text
//! - [`JsonSource`] — JSON text, parsed once
//! - [`UnionSource`] — an ordered composition of other sources

mod config;
mod json;
mod memory;
mod union;

pub use config::{ConfigError, ConfigSource};
pub use json::JsonSource;
pub use memory::MemorySource;
pub use union::{Merge, UnionSource};

use crate::path::Path;
use crate::value::Value;

// ============================================================================
// SOURCE ERROR
// ============================================================================

/// A source-level resolution failure: a coercion that could not be
/// performed, or a sequence/mapping operation on a position that is
/// neither.
///
/// Fields catch these at the pipeline boundary and record them as Invalid
/// mapping errors at the live path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{at} - {message}")]
pub struct SourceError {
    /// Rendered location of the failure (the source may prefix a file
    /// label or section).
    pub at: String,
    /// What went wrong.
    pub message: String,
}

impl SourceError {
    /// Creates a source error at a rendered location.
    #[must_use]
    pub fn new(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            at: at.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// TYPE HINTS
// ============================================================================

/// The primitive a caller would like a raw value coerced to.
///
/// [`Source::primitive`] receives a slice of hints and tries them in order;
/// the first coercion that succeeds wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    /// No coercion — hand back whatever the source holds.
    Auto,
    /// Coerce to string.
    Str,
    /// Coerce to integer.
    Int,
    /// Coerce to float.
    Float,
    /// Coerce to boolean.
    Bool,
}

impl TypeHint {
    fn name(self) -> &'static str {
        match self {
            TypeHint::Auto => "a value",
            TypeHint::Str => "a string",
            TypeHint::Int => "an integer",
            TypeHint::Float => "a float",
            TypeHint::Bool => "a boolean",
        }
    }
}

// ============================================================================
// SOURCE
// ============================================================================

/// A backend presenting path-addressable resolution over some underlying
/// data.
pub trait Source: std::fmt::Debug {
    /// True if `path` resolves to anything at all (including null).
    fn exists(&self, path: &Path) -> bool;

    /// True if `path` resolves to an explicit null.
    fn is_null(&self, path: &Path) -> bool;

    /// Resolves `path` and coerces the value to the first hint that
    /// accepts it.
    fn primitive(&self, path: &Path, hints: &[TypeHint]) -> Result<Value, SourceError>;

    /// Resolves `path` as a sequence, returning its element count for
    /// index-based iteration.
    fn sequence(&self, path: &Path) -> Result<usize, SourceError>;

    /// Resolves `path` as a mapping, returning its key set for key-based
    /// iteration.
    fn mapping(&self, path: &Path) -> Result<Vec<String>, SourceError>;

    /// Renders `path` for diagnostics; sources with a file location or
    /// section scope prefix it here.
    fn render(&self, path: &Path) -> String {
        path.to_string()
    }
}

// ============================================================================
// SHARED COERCION
// ============================================================================

/// The lenient coercion contract shared by the in-memory and config
/// sources. The JSON source carries its own, stricter table.
///
/// Booleans from integers follow the conventional nonzero-is-true rule.
pub(crate) mod coerce {
    use super::{SourceError, TypeHint};
    use crate::value::Value;

    /// Applies `hints` in order, returning the first coercion that
    /// succeeds.
    pub(crate) fn primitive(
        at: impl Fn() -> String,
        value: &Value,
        hints: &[TypeHint],
    ) -> Result<Value, SourceError> {
        let hints = if hints.is_empty() {
            &[TypeHint::Auto]
        } else {
            hints
        };
        for hint in hints {
            if let Some(coerced) = apply(*hint, value) {
                return Ok(coerced);
            }
        }
        Err(mismatch(&at(), value, hints))
    }

    pub(crate) fn mismatch(at: &str, value: &Value, hints: &[TypeHint]) -> SourceError {
        let wanted = hints
            .iter()
            .map(|h| h.name())
            .collect::<Vec<_>>()
            .join(" or ");
        SourceError::new(at, format!("\"{value}\" is not {wanted}"))
    }

    fn apply(hint: TypeHint, value: &Value) -> Option<Value> {
        match hint {
            TypeHint::Auto => Some(value.clone()),
            TypeHint::Str => as_str(value).map(Value::Str),
            TypeHint::Int => as_int(value).map(Value::Int),
            TypeHint::Float => as_float(value).map(Value::Float),
            TypeHint::Bool => as_bool(value).map(Value::Bool),
        }
    }

    /// Any value stringifies.
    pub(crate) fn as_str(value: &Value) -> Option<String> {
        Some(value.to_string())
    }

    /// Native integers (never booleans), integral floats, and parseable
    /// strings.
    pub(crate) fn as_int(value: &Value) -> Option<i64> {
        match value {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Native floats and integers, and parseable strings.
    pub(crate) fn as_float(value: &Value) -> Option<f64> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Native booleans, nonzero integers, and the conventional string
    /// spellings.
    pub(crate) fn as_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Int(n) => Some(*n != 0),
            Value::Str(s) => match s.to_ascii_lowercase().as_str() {
                "0" | "f" | "false" => Some(false),
                "1" | "t" | "true" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

}

//! The user-input error taxonomy and its ordered collector.
//!
//! Mapping distinguishes exactly two user-facing failures: a required value
//! that was nowhere to be found ([`ErrorCause::Missing`]) and a value that
//! was present but failed coercion, munging, or validation
//! ([`ErrorCause::Invalid`]). Both carry the traversal [`Path`] captured at
//! the moment of failure, so callers never re-derive where an error
//! happened.
//!
//! Schema mis-declarations are programmer errors and live in
//! [`SchemaError`], outside the user-input taxonomy.

use std::borrow::Cow;

use crate::path::Path;

// ============================================================================
// MAP ERROR
// ============================================================================

/// Why a field failed to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    /// The field's source key was absent and the field declares no default.
    Missing,
    /// A value was present but failed parse, munge, or validation.
    Invalid,
}

/// A single mapping failure, annotated with the path at which it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct MapError {
    /// Missing or Invalid.
    pub cause: ErrorCause,
    /// Where in the source the failure happened.
    pub path: Path,
    /// Human-readable violation text. Empty for plain Missing errors.
    pub message: Cow<'static, str>,
}

impl MapError {
    /// A required value was absent.
    #[must_use]
    pub fn missing(path: Path) -> Self {
        Self {
            cause: ErrorCause::Missing,
            path,
            message: Cow::Borrowed(""),
        }
    }

    /// A present value violated a constraint.
    #[must_use]
    pub fn invalid(path: Path, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            cause: ErrorCause::Invalid,
            path,
            message: message.into(),
        }
    }

    /// True for [`ErrorCause::Missing`] errors.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self.cause, ErrorCause::Missing)
    }

    /// True for [`ErrorCause::Invalid`] errors.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self.cause, ErrorCause::Invalid)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cause {
            ErrorCause::Missing => write!(f, "{} is missing", self.path),
            ErrorCause::Invalid => write!(f, "{} - {}", self.path, self.message),
        }
    }
}

impl std::error::Error for MapError {}

// ============================================================================
// ERRORS COLLECTOR
// ============================================================================

/// Ordered collection of [`MapError`]s, in traversal order.
///
/// A mapping pass appends here and keeps going; nothing is dropped and
/// nothing aborts the pass (unless the caller asked for fail-fast mode).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Errors {
    entries: Vec<MapError>,
}

impl Errors {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a [`MapError::missing`] at `path`.
    pub fn missing(&mut self, path: Path) {
        self.entries.push(MapError::missing(path));
    }

    /// Records a [`MapError::invalid`] at `path`.
    pub fn invalid(&mut self, path: Path, message: impl Into<Cow<'static, str>>) {
        self.entries.push(MapError::invalid(path, message));
    }

    /// Appends an already-built error.
    pub fn push(&mut self, error: MapError) {
        self.entries.push(error);
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The collected errors, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[MapError] {
        &self.entries
    }

    /// Iterates the collected errors, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, MapError> {
        self.entries.iter()
    }

    /// Removes and returns the first collected error, if any.
    pub fn take_first(&mut self) -> Option<MapError> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// Moves every error out of `other` into this collector.
    pub fn absorb(&mut self, other: Errors) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Errors {
    type Item = MapError;
    type IntoIter = std::vec::IntoIter<MapError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a MapError;
    type IntoIter = std::slice::Iter<'a, MapError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mapping error(s)", self.entries.len())?;
        for error in &self.entries {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

// ============================================================================
// SCHEMA ERROR
// ============================================================================

/// Programmer errors in schema declaration or use, raised immediately
/// rather than collected.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A polymorphic probe could not read its discriminator at all.
    #[error("discriminator \"{0}\" is not present in the source")]
    MissingDiscriminator(String),

    /// A polymorphic probe found no registered variant to dispatch to.
    #[error("no variant registered for discriminator value \"{0}\"")]
    UnknownVariant(String),
}

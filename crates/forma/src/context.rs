//! Traversal state threaded through every resolution call.
//!
//! A [`Context`] is owned by exactly one in-flight mapping pass and handed
//! down by `&mut` — there is no global and no thread-local. It carries the
//! live [`Path`], the error collector, and a stack of [`Frame`]s holding
//! named variables. Scoping is closure-shaped: [`Context::at`] and
//! [`Context::in_frame`] restore their state after the closure returns on
//! every exit path, which is the discipline error-path accuracy depends on.

use crate::error::Errors;
use crate::path::{Path, Segment};
use crate::value::Value;

// ============================================================================
// FRAME
// ============================================================================

/// What a stack frame marks. Rewind predicates dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The bottom frame; never popped.
    Root,
    /// A form mapping in progress.
    Form,
    /// A single field resolution in progress.
    Field,
    /// A user variable scope.
    Scope,
}

/// One entry of the context stack: a kind marker plus named variables.
#[derive(Debug, Clone)]
pub struct Frame {
    kind: FrameKind,
    vars: Vec<(String, Value)>,
    /// Path depth at the moment this frame was pushed.
    path_mark: usize,
}

impl Frame {
    fn new(kind: FrameKind, vars: Vec<(String, Value)>) -> Self {
        Self {
            kind,
            vars,
            path_mark: 0,
        }
    }

    /// Marks a form mapping scope.
    #[must_use]
    pub fn form() -> Self {
        Self::new(FrameKind::Form, Vec::new())
    }

    /// Marks a single field resolution.
    #[must_use]
    pub fn field() -> Self {
        Self::new(FrameKind::Field, Vec::new())
    }

    /// A plain variable scope.
    #[must_use]
    pub fn scope(vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self::new(FrameKind::Scope, vars.into_iter().collect())
    }

    /// Adds a variable to this frame before it is pushed.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }

    /// This frame's kind marker.
    #[must_use]
    pub const fn kind(&self) -> FrameKind {
        self.kind
    }

    fn var(&self, name: &str) -> Option<&Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

// ============================================================================
// CONTEXT ERROR
// ============================================================================

/// Failures of context operations. Distinct variants so callers can tell an
/// ordinary lookup miss from a rewind that never reached its stop
/// condition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    /// No frame anywhere in the stack defines the named variable.
    #[error("\"{0}\" is not defined")]
    Undefined(String),

    /// [`Context::rewind`] unwound the whole stack without its predicate
    /// matching any frame.
    #[error("rewind did not reach its stop condition")]
    RewindExhausted,
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Per-traversal state: live path, error collector, frame stack.
#[derive(Debug)]
pub struct Context {
    path: Path,
    errors: Errors,
    frames: Vec<Frame>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a fresh context with an empty path and a root frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: Path::new(),
            errors: Errors::new(),
            frames: vec![Frame::new(FrameKind::Root, Vec::new())],
        }
    }

    /// The live traversal path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The errors collected so far.
    #[must_use]
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Takes the collected errors out of the context.
    pub fn take_errors(&mut self) -> Errors {
        std::mem::take(&mut self.errors)
    }

    /// Records a Missing error at the live path.
    pub fn report_missing(&mut self) {
        self.errors.missing(self.path.clone());
    }

    /// Records an Invalid error at the live path.
    pub fn report_invalid(&mut self, message: impl Into<std::borrow::Cow<'static, str>>) {
        self.errors.invalid(self.path.clone(), message);
    }

    // ==================== Scoping ====================

    /// Raw segment push for scope types that wrap this context; pair with
    /// [`Context::pop_segment`] on a single exit path.
    pub(crate) fn push_segment(&mut self, segment: Segment) {
        self.path.push(segment);
    }

    /// Raw segment pop; see [`Context::push_segment`].
    pub(crate) fn pop_segment(&mut self) {
        self.path.pop();
    }

    /// Raw frame push; pair with [`Context::pop_frame`] on a single exit
    /// path.
    pub(crate) fn push_frame(&mut self, mut frame: Frame) {
        frame.path_mark = self.path.len();
        self.frames.push(frame);
    }

    /// Raw frame pop; see [`Context::push_frame`].
    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Runs `f` with `segment` pushed onto the path; the segment is popped
    /// after `f` returns, whatever it returns.
    pub fn at<T>(&mut self, segment: impl Into<Segment>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    /// Runs `f` with `frame` pushed onto the stack; the frame is popped
    /// after `f` returns, whatever it returns.
    pub fn in_frame<T>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_frame(frame);
        let out = f(self);
        self.pop_frame();
        out
    }

    /// Runs `f` inside a [`Frame::scope`] holding the given variables.
    pub fn with_vars<T>(
        &mut self,
        vars: impl IntoIterator<Item = (String, Value)>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.in_frame(Frame::scope(vars), f)
    }

    // ==================== Variables ====================

    /// Looks a variable up, searching frames top-down.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.var(name))
    }

    /// Like [`Context::var`] but failing with [`ContextError::Undefined`].
    pub fn require_var(&self, name: &str) -> Result<&Value, ContextError> {
        self.var(name)
            .ok_or_else(|| ContextError::Undefined(name.to_owned()))
    }

    /// Resolves a dotted variable path: the first atom names a variable,
    /// the remaining atoms descend through [`Value::Map`] entries.
    pub fn lookup(&self, dotted: &str) -> Result<Value, ContextError> {
        let mut atoms = dotted.split('.');
        let head = atoms.next().unwrap_or(dotted);
        let mut value = self.require_var(head)?;
        for atom in atoms {
            value = value
                .as_map()
                .and_then(|entries| entries.get(atom))
                .ok_or_else(|| ContextError::Undefined(dotted.to_owned()))?;
        }
        Ok(value.clone())
    }

    // ==================== Rewind ====================

    /// Unwinds the frame stack (and the path, in step) until the topmost
    /// frame satisfies `pred`, runs `f` there, then restores the unwound
    /// frames and path segments exactly.
    ///
    /// Used when a value being resolved needs to temporarily rejoin an
    /// ancestor's traversal context — a cross-field reference inside a
    /// nested form resolves the sibling against the *form's* path, not the
    /// referencing field's.
    ///
    /// Fails with [`ContextError::RewindExhausted`] — distinct from a
    /// variable lookup miss — when no frame matches.
    pub fn rewind<T>(
        &mut self,
        pred: impl Fn(&Frame) -> bool,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, ContextError> {
        let Some(target) = self.frames.iter().rposition(&pred) else {
            return Err(ContextError::RewindExhausted);
        };
        let saved_frames = self.frames.split_off(target + 1);
        let saved_segments = match saved_frames.first() {
            Some(frame) => self.path.truncate(frame.path_mark),
            None => Vec::new(),
        };
        tracing::trace!(
            depth = self.frames.len(),
            unwound = saved_frames.len(),
            "context rewind"
        );

        let out = f(self);

        for segment in saved_segments.into_iter().rev() {
            self.path.push(segment);
        }
        self.frames.extend(saved_frames);
        Ok(out)
    }
}

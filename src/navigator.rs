//! Schema navigation
//!
//! Safe lookups into an untyped JSON tree. Every step of a path either resolves
//! or yields `None`; a missing key, an out-of-range index or a type mismatch
//! along the way is reported as absence, never as a failure. All structural
//! assumptions about the export format go through this module.

use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// One step in a document path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for PathStep<'a> {
    fn from(key: &'a str) -> Self {
        PathStep::Key(key)
    }
}

impl<'a> From<&'a String> for PathStep<'a> {
    fn from(key: &'a String) -> Self {
        PathStep::Key(key.as_str())
    }
}

impl From<usize> for PathStep<'_> {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// Build a `[PathStep; N]` from keys and indices.
///
/// ```
/// use percept_trend::path;
/// use percept_trend::navigator::PathStep;
///
/// let p = path!["Groups", "Final", 0];
/// assert_eq!(p[2], PathStep::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    ($($step:expr),* $(,)?) => {
        [$($crate::navigator::PathStep::from($step)),*]
    };
}

/// Resolve `path` starting at `root`
pub fn navigate<'v>(root: &'v Value, path: &[PathStep<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, step| match (step, node) {
        (PathStep::Key(key), Value::Object(map)) => map.get(*key),
        (PathStep::Index(idx), Value::Array(items)) => items.get(*idx),
        _ => None,
    })
}

/// Render a path as a pointer-like string for diagnostics, e.g. `/Groups/Final/0`
pub fn format_path(path: &[PathStep<'_>]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter()
        .map(|step| match step {
            PathStep::Key(key) => format!("/{key}"),
            PathStep::Index(idx) => format!("/{idx}"),
        })
        .collect()
}

/// Typed lookups on any JSON node
pub trait Navigate {
    fn at(&self, path: &[PathStep<'_>]) -> Option<&Value>;

    fn f64_at(&self, path: &[PathStep<'_>]) -> Option<f64> {
        self.at(path).and_then(Value::as_f64)
    }

    fn str_at(&self, path: &[PathStep<'_>]) -> Option<&str> {
        self.at(path).and_then(Value::as_str)
    }

    fn bool_at(&self, path: &[PathStep<'_>]) -> Option<bool> {
        self.at(path).and_then(Value::as_bool)
    }

    fn array_at(&self, path: &[PathStep<'_>]) -> Option<&Vec<Value>> {
        self.at(path).and_then(Value::as_array)
    }

    fn object_at(&self, path: &[PathStep<'_>]) -> Option<&Map<String, Value>> {
        self.at(path).and_then(Value::as_object)
    }
}

impl Navigate for Value {
    fn at(&self, path: &[PathStep<'_>]) -> Option<&Value> {
        navigate(self, path)
    }
}

/// A parsed export document.
///
/// The root is guaranteed to be a JSON object; anything else is rejected at
/// construction since no component could make sense of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn from_value(root: Value) -> Result<Self> {
        match root {
            Value::Object(_) => Ok(Self { root }),
            other => Err(PipelineError::malformed(
                "/",
                format!("document root must be an object, found {}", kind_of(&other)),
            )),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up an array that may be absent.
    ///
    /// Absence yields `Ok(None)`. A value of any other type at the path is
    /// malformed input, since callers rely on iterating it.
    pub fn optional_array(&self, path: &[PathStep<'_>]) -> Result<Option<&Vec<Value>>> {
        match self.root.at(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(PipelineError::malformed(
                format_path(path),
                format!("expected an array, found {}", kind_of(other)),
            )),
        }
    }

    /// Look up an object that may be absent; see [`Document::optional_array`]
    pub fn optional_object(&self, path: &[PathStep<'_>]) -> Result<Option<&Map<String, Value>>> {
        match self.root.at(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(PipelineError::malformed(
                format_path(path),
                format!("expected an object, found {}", kind_of(other)),
            )),
        }
    }
}

impl Navigate for Document {
    fn at(&self, path: &[PathStep<'_>]) -> Option<&Value> {
        navigate(&self.root, path)
    }
}

/// Short JSON type name for error messages
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

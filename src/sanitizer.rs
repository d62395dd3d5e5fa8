//! Session sanitization
//!
//! Strips heavy fields (raw PSD sample arrays) from arbitrary JSON trees while
//! leaving every other key, value and ordering untouched. The walk uses an
//! explicit work-stack so pathological nesting cannot exhaust the call stack.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::Result;
use crate::navigator::Document;
use crate::path;

/// Keys removed from exported sessions by default
pub const DEFAULT_EXCLUDED_KEYS: [&str; 2] = ["SignalFrequencies", "SignalPsdValues"];

/// Set of keys to drop at every nesting depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedKeys(HashSet<String>);

impl Default for ExcludedKeys {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_KEYS)
    }
}

impl ExcludedKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

/// Pending work for the iterative walk
enum Frame<'a> {
    /// Sanitize this node and push the result onto the output stack
    Visit(&'a Value),
    /// Pop `keys.len()` results and assemble them into an object
    Object(Vec<&'a str>),
    /// Pop `len` results and assemble them into an array
    Array(usize),
}

/// Return a copy of `tree` with every excluded key removed at any depth
pub fn sanitize(tree: &Value, excluded: &ExcludedKeys) -> Value {
    let mut work = vec![Frame::Visit(tree)];
    let mut out: Vec<Value> = Vec::new();

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Visit(Value::Object(map)) => {
                let kept: Vec<(&str, &Value)> = map
                    .iter()
                    .filter(|(k, _)| !excluded.contains(k))
                    .map(|(k, v)| (k.as_str(), v))
                    .collect();
                work.push(Frame::Object(kept.iter().map(|&(k, _)| k).collect()));
                // Reverse so the first child is visited (and emitted) first
                work.extend(kept.iter().rev().map(|&(_, v)| Frame::Visit(v)));
            }
            Frame::Visit(Value::Array(items)) => {
                work.push(Frame::Array(items.len()));
                work.extend(items.iter().rev().map(Frame::Visit));
            }
            Frame::Visit(scalar) => out.push(scalar.clone()),
            Frame::Object(keys) => {
                let children = out.split_off(out.len() - keys.len());
                let map: Map<String, Value> = keys
                    .into_iter()
                    .map(str::to_string)
                    .zip(children)
                    .collect();
                out.push(Value::Object(map));
            }
            Frame::Array(len) => {
                let children = out.split_off(out.len() - len);
                out.push(Value::Array(children));
            }
        }
    }

    // Every Visit pushes exactly one value once its frames are drained
    out.pop().unwrap_or(Value::Null)
}

/// Sanitize each `GroupHistory` session of a document.
///
/// A document without `GroupHistory` has no sessions.
pub fn extract_sessions(document: &Document, excluded: &ExcludedKeys) -> Result<Vec<Value>> {
    let sessions = document
        .optional_array(&path!["GroupHistory"])?
        .map(|items| items.iter().map(|s| sanitize(s, excluded)).collect())
        .unwrap_or_default();
    Ok(sessions)
}

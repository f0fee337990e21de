//! # Schema Paths
//!
//! A [`SchemaPath`] locates a construct in the input tree, rendered as
//! `/module:container/list/leaf`. Compile errors carry one so that the
//! offending YANG statement can be found without re-running the compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Slash-separated location of a schema node, from the compilation root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaPath(Vec<String>);

impl SchemaPath {
    /// The empty path (the compilation root).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment, returning it.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for SchemaPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

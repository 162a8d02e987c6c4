//! Variable expansion over string scalars.
//!
//! An [`Expansion`] pass scans every string scalar for delimited references
//! (default `${name}`) and asks its mapper for a replacement. Substituted
//! text is rescanned so replacements may themselves contain references; a
//! per-value substitution cap guards against cycles such as `A=${A}`.

use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::node::{Node, NodeValue, Scalar};
use crate::path::join_segments;
use crate::result_ext::IntoShared;

#[cfg(test)]
mod tests;

/// Default per-value substitution cap.
pub const DEFAULT_SUBSTITUTION_LIMIT: usize = 10_000;

/// Mapper resolving a reference name to its replacement.
///
/// Returning `None` (or an empty replacement) leaves the reference literal
/// in place.
pub type Mapper = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// One template-substitution pass over a tree.
#[derive(Clone)]
pub struct Expansion {
    label: String,
    start: String,
    end: String,
    mapper: Mapper,
    limit: usize,
}

impl std::fmt::Debug for Expansion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expansion")
            .field("label", &self.label)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl Expansion {
    /// A pass with the default `${` / `}` delimiters and substitution cap.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        mapper: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            start: "${".to_owned(),
            end: "}".to_owned(),
            mapper: Arc::new(mapper),
            limit: DEFAULT_SUBSTITUTION_LIMIT,
        }
    }

    /// A pass resolving references against process environment variables.
    ///
    /// Unset and empty variables leave their references literal.
    #[must_use]
    pub fn environment() -> Self {
        Self::new("environment", |name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
        })
    }

    /// Replace the reference delimiters.
    #[must_use]
    pub fn with_delimiters(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    /// Replace the per-value substitution cap.
    #[must_use]
    pub fn with_substitution_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply this pass to a tree, producing a new tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExceededIterations`] when any single value
    /// needs more than the configured substitution cap.
    pub fn apply(&self, root: &Node) -> ConfigResult<Node> {
        let mut path = Vec::new();
        self.expand_node(&mut path, root).into_shared()
    }

    fn expand_node(&self, path: &mut Vec<String>, node: &Node) -> Result<Node, ConfigError> {
        match node.value() {
            NodeValue::Map(children) => {
                let mut expanded = indexmap::IndexMap::with_capacity(children.len());
                for (key, child) in children {
                    path.push(key.clone());
                    expanded.insert(key.clone(), self.expand_node(path, child)?);
                    path.pop();
                }
                Ok(node.with_value(NodeValue::Map(expanded)))
            }
            NodeValue::Array(children) => {
                let mut expanded = Vec::with_capacity(children.len());
                for (index, child) in children.iter().enumerate() {
                    path.push(index.to_string());
                    expanded.push(self.expand_node(path, child)?);
                    path.pop();
                }
                Ok(node.with_value(NodeValue::Array(expanded)))
            }
            NodeValue::Scalar(Scalar::String(text)) => {
                match self.expand_text(path, text)? {
                    Some(expanded) => {
                        Ok(node.with_value(NodeValue::Scalar(Scalar::String(expanded))))
                    }
                    None => Ok(node.clone()),
                }
            }
            _ => Ok(node.clone()),
        }
    }

    /// Expand one value, returning `None` when nothing changed.
    fn expand_text(
        &self,
        path: &[String],
        text: &str,
    ) -> Result<Option<String>, ConfigError> {
        let mut value = text.to_owned();
        let mut cursor = 0;
        let mut substitutions = 0;
        while let Some(offset) = value.get(cursor..).and_then(|rest| rest.find(&self.start)) {
            let start_at = cursor + offset;
            let name_from = start_at + self.start.len();
            let Some(end_offset) = value.get(name_from..).and_then(|rest| rest.find(&self.end))
            else {
                break;
            };
            let end_at = name_from + end_offset;
            let name = value.get(name_from..end_at).unwrap_or("").to_owned();
            match (self.mapper)(&name).filter(|replacement| !replacement.is_empty()) {
                Some(replacement) => {
                    substitutions += 1;
                    if substitutions > self.limit {
                        return Err(ConfigError::exceeded_iterations(
                            join_segments(path),
                            self.limit,
                        ));
                    }
                    value.replace_range(start_at..end_at + self.end.len(), &replacement);
                    // Rescan from the replacement: it may contain references.
                    cursor = start_at;
                }
                None => {
                    cursor = end_at + self.end.len();
                }
            }
        }
        if substitutions == 0 {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}

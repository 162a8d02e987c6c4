//! Conversion between [`Node`] trees and generic JSON values.
//!
//! Codecs decode to [`serde_json::Value`] and hand the result to
//! [`Node::from_value`], which parses directive-bearing keys through the
//! shared grammar and attaches provenance. The reverse direction feeds
//! encoders and structure materialization.

use serde_json::{Map as JsonMap, Value as JsonValue};

use indexmap::IndexMap;

use crate::directive::parse_key;
use crate::error::ConfigError;
use crate::result_ext::IntoShared;

use super::{Node, NodeValue, Origin, REDACTED, Scalar};

impl Node {
    /// Build a tree from a generic decoded value, attributing every node to
    /// `source`.
    ///
    /// Map keys are run through the directive grammar: the clean name
    /// becomes the child's key and any directives are attached to the child
    /// for the merge engine to consume. A `secret` directive marks the
    /// whole subtree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] when a key carries a malformed
    /// directive block, or when stripping directives makes two keys
    /// collide.
    pub fn from_value(source: &str, value: &JsonValue) -> crate::ConfigResult<Self> {
        build(source, value).into_shared()
    }

    /// Render this tree as a generic JSON value.
    ///
    /// Maps keep their iteration order, arrays their element order; an
    /// empty node renders as null. Provenance and secrecy are not
    /// represented.
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        render(self, false, false)
    }

    /// Render this tree with secret values masked as [`REDACTED`].
    #[must_use]
    pub fn to_value_redacted(&self) -> JsonValue {
        render(self, true, false)
    }
}

fn build(source: &str, value: &JsonValue) -> Result<Node, ConfigError> {
    let node = match value {
        JsonValue::Null => Node::scalar(Scalar::Null),
        JsonValue::Bool(flag) => Node::scalar(*flag),
        JsonValue::Number(number) => Node::scalar(number_scalar(number)),
        JsonValue::String(text) => Node::scalar(text.as_str()),
        JsonValue::Array(items) => {
            let children = items
                .iter()
                .map(|item| build(source, item))
                .collect::<Result<Vec<_>, _>>()?;
            Node::array(children)
        }
        JsonValue::Object(entries) => Node::map(build_map(source, entries)?),
    };
    Ok(node.with_origin(Origin::new(source)))
}

fn build_map(
    source: &str,
    entries: &JsonMap<String, JsonValue>,
) -> Result<IndexMap<String, Node>, ConfigError> {
    let mut children = IndexMap::with_capacity(entries.len());
    for (raw_key, raw_value) in entries {
        let (key, directives) = parse_key(raw_key)
            .map_err(|error| ConfigError::decode(source, format!("key '{raw_key}': {error}")))?;
        let mut child = build(source, raw_value)?;
        child.set_directives(directives);
        if directives.secret {
            child.mark_secret();
        }
        if children.insert(key.clone(), child).is_some() {
            return Err(ConfigError::decode(
                source,
                format!("key '{key}' appears more than once after directive stripping"),
            ));
        }
    }
    Ok(children)
}

fn number_scalar(number: &serde_json::Number) -> Scalar {
    number.as_i64().map_or_else(
        || number.as_f64().map_or(Scalar::Null, Scalar::Float),
        Scalar::Integer,
    )
}

fn render(node: &Node, redact: bool, inherited_secret: bool) -> JsonValue {
    let secret = inherited_secret || node.is_secret();
    match node.value() {
        NodeValue::Map(children) => JsonValue::Object(
            children
                .iter()
                .map(|(key, child)| (key.clone(), render(child, redact, secret)))
                .collect(),
        ),
        NodeValue::Array(children) => JsonValue::Array(
            children
                .iter()
                .map(|child| render(child, redact, secret))
                .collect(),
        ),
        NodeValue::Scalar(_) if redact && secret => JsonValue::String(REDACTED.to_owned()),
        NodeValue::Scalar(scalar) => scalar_value(scalar),
        NodeValue::Empty => JsonValue::Null,
    }
}

fn scalar_value(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::Null => JsonValue::Null,
        Scalar::Bool(flag) => JsonValue::Bool(*flag),
        Scalar::Integer(value) => JsonValue::from(*value),
        Scalar::Float(value) => {
            serde_json::Number::from_f64(*value).map_or(JsonValue::Null, JsonValue::Number)
        }
        Scalar::String(text) => JsonValue::String(text.clone()),
    }
}

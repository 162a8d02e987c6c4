//! Tree and provenance model.
//!
//! Every configuration source decodes into a [`Node`] tree. A node carries
//! its value, the ordered list of [`Origin`] attributions accumulated
//! through decode and merge, a redaction flag, and any pending merge
//! directives parsed from its key. Structural equality and the content hash
//! consider only the value; provenance, secrecy and directives are
//! metadata.

mod build;
mod hash;


use indexmap::IndexMap;

use crate::directive::DirectiveSet;

/// Placeholder emitted in place of secret scalars when redacting output.
pub const REDACTED: &str = "*****";

/// Attribution of a value to the source that contributed it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Origin {
    /// Record name the value came from.
    pub source: String,
    /// One-based line in the source, where the codec could determine it.
    pub line: Option<usize>,
    /// One-based column in the source, where the codec could determine it.
    pub column: Option<usize>,
}

impl Origin {
    /// Attribution to a source with no position information.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: None,
            column: None,
        }
    }

    /// Attribution to a position within a source.
    #[must_use]
    pub fn at(source: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            source: source.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{}:{line}:{column}", self.source)
            }
            (Some(line), None) => write!(f, "{}:{line}", self.source),
            _ => f.write_str(&self.source),
        }
    }
}

/// Discriminant of a node's value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Keyed children.
    Map,
    /// Ordered children.
    Array,
    /// A decoded primitive.
    Scalar,
    /// The absence of any value.
    Empty,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Map => "map",
            Self::Array => "array",
            Self::Scalar => "scalar",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// A decoded primitive in its best-inferred type.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    String(String),
}

impl Scalar {
    /// The text of a string scalar, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(text) => f.write_str(text),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// The value payload of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    /// Keyed children; iteration order is insertion order and therefore
    /// deterministic.
    Map(IndexMap<String, Node>),
    /// Ordered children.
    Array(Vec<Node>),
    /// A decoded primitive.
    Scalar(Scalar),
    /// The absence of any value, e.g. the tree before any record merges.
    Empty,
}

/// A node of the configuration tree.
#[derive(Clone, Debug, Default)]
pub struct Node {
    value: NodeValue,
    provenance: Vec<Origin>,
    secret: bool,
    directives: DirectiveSet,
}

impl Default for NodeValue {
    fn default() -> Self {
        Self::Empty
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Node {
    /// An empty node with no provenance.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A map node from keyed children.
    #[must_use]
    pub fn map(children: IndexMap<String, Self>) -> Self {
        Self {
            value: NodeValue::Map(children),
            ..Self::default()
        }
    }

    /// An array node from ordered children.
    #[must_use]
    pub fn array(children: Vec<Self>) -> Self {
        Self {
            value: NodeValue::Array(children),
            ..Self::default()
        }
    }

    /// A scalar node.
    #[must_use]
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self {
            value: NodeValue::Scalar(value.into()),
            ..Self::default()
        }
    }

    pub(crate) fn assembled(value: NodeValue, provenance: Vec<Origin>, secret: bool) -> Self {
        Self {
            value,
            provenance,
            secret,
            directives: DirectiveSet::default(),
        }
    }

    /// The discriminant of this node's value.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Map(_) => NodeKind::Map,
            NodeValue::Array(_) => NodeKind::Array,
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Empty => NodeKind::Empty,
        }
    }

    /// The value payload.
    #[must_use]
    pub const fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Keyed children, when this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match &self.value {
            NodeValue::Map(children) => Some(children),
            _ => None,
        }
    }

    /// Ordered children, when this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match &self.value {
            NodeValue::Array(children) => Some(children),
            _ => None,
        }
    }

    /// The primitive, when this is a scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            NodeValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Ordered source attributions, oldest first.
    #[must_use]
    pub fn provenance(&self) -> &[Origin] {
        &self.provenance
    }

    /// Whether this node is redacted on output.
    #[must_use]
    pub const fn is_secret(&self) -> bool {
        self.secret
    }

    /// Pending merge directives parsed from this node's key.
    #[must_use]
    pub const fn directives(&self) -> DirectiveSet {
        self.directives
    }

    /// Append an attribution, preserving all earlier ones.
    pub fn push_origin(&mut self, origin: Origin) {
        self.provenance.push(origin);
    }

    /// Builder-style variant of [`Node::push_origin`].
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.provenance.push(origin);
        self
    }

    pub(crate) fn set_directives(&mut self, directives: DirectiveSet) {
        self.directives = directives;
    }

    /// Flag this node and every descendant as secret.
    pub fn mark_secret(&mut self) {
        self.secret = true;
        match &mut self.value {
            NodeValue::Map(children) => {
                for child in children.values_mut() {
                    child.mark_secret();
                }
            }
            NodeValue::Array(children) => {
                for child in children {
                    child.mark_secret();
                }
            }
            _ => {}
        }
    }

    /// Clone this node with its value swapped and metadata retained.
    pub(crate) fn with_value(&self, value: NodeValue) -> Self {
        Self {
            value,
            provenance: self.provenance.clone(),
            secret: self.secret,
            directives: self.directives,
        }
    }

    /// Clone this subtree with every pending directive consumed.
    pub(crate) fn strip_directives(&self) -> Self {
        let value = match &self.value {
            NodeValue::Map(children) => NodeValue::Map(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.strip_directives()))
                    .collect(),
            ),
            NodeValue::Array(children) => {
                NodeValue::Array(children.iter().map(Self::strip_directives).collect())
            }
            other => other.clone(),
        };
        Self {
            value,
            provenance: self.provenance.clone(),
            secret: self.secret,
            directives: DirectiveSet::default(),
        }
    }

    /// Fetch a subtree by `.`-delimited path with byte-exact key matching.
    ///
    /// This is a convenience over [`crate::resolve`] for the default path
    /// syntax. An empty path returns this node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::NotFound`] when any segment is absent
    /// or an array index is not a valid in-bounds non-negative integer.
    pub fn fetch(&self, path: &str) -> crate::ConfigResult<&Self> {
        crate::path::resolve(self, path, ".", crate::path::KeyCase::Sensitive)
    }
}

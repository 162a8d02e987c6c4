//! Materializing merged subtrees into caller-defined structures.
//!
//! The engine hands this boundary an already-merged generic value, never
//! raw source bytes. Deserialization goes through `serde`, so any
//! `DeserializeOwned` type works; an optional hook runs after population
//! for validation that depends on multiple fields.

use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;
use crate::result_ext::IntoShared;

/// Hook invoked after a structure has been populated from the tree.
///
/// Implement this for validation or normalization that needs the whole
/// structure, then materialize through
/// [`materialize_validated`].
///
/// # Examples
///
/// ```
/// use conflux::{ConfigResult, Node, PostMaterialize, materialize_validated};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize)]
/// struct Server {
///     port: u16,
/// }
///
/// impl PostMaterialize for Server {
///     fn post_materialize(&mut self) -> ConfigResult<()> {
///         if self.port == 0 {
///             return Err(conflux::ConfigError::validation("port", "must be non-zero").shared());
///         }
///         Ok(())
///     }
/// }
///
/// let tree = Node::from_value("inline", &json!({"port": 8080}))?;
/// let server: Server = materialize_validated(&tree, "")?;
/// assert_eq!(server.port, 8080);
/// # Ok::<_, std::sync::Arc<conflux::ConfigError>>(())
/// ```
pub trait PostMaterialize {
    /// Validate or adjust the freshly populated structure.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] (typically
    /// [`ConfigError::Validation`]) to reject the structure.
    fn post_materialize(&mut self) -> ConfigResult<()>;
}

/// Populate a `T` from a merged subtree.
///
/// `path` is used only to label errors; pass the path the subtree was
/// fetched from, or an empty string for the root.
///
/// # Errors
///
/// Returns [`ConfigError::Materialize`] when the tree does not match the
/// target shape.
pub fn materialize<T: DeserializeOwned>(node: &Node, path: &str) -> ConfigResult<T> {
    serde_json::from_value(node.to_value())
        .map_err(|error| ConfigError::materialize(display_path(path), error.to_string()))
        .into_shared()
}

/// Populate a `T` and run its [`PostMaterialize`] hook.
///
/// # Errors
///
/// Returns [`ConfigError::Materialize`] when deserialization fails, or
/// whatever error the hook raises.
pub fn materialize_validated<T>(node: &Node, path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned + PostMaterialize,
{
    let mut populated: T = materialize(node, path)?;
    populated.post_materialize()?;
    Ok(populated)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

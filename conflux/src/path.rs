//! Delimited path resolution against a tree.

use std::sync::Arc;

use uncased::UncasedStr;

use crate::error::{ConfigError, ConfigResult};
use crate::node::{Node, NodeValue};

/// Key comparison mode for map descent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyCase {
    /// Keys match byte-for-byte.
    #[default]
    Sensitive,
    /// Keys match case-insensitively.
    Insensitive,
}

/// Join internal path segments for diagnostics.
pub(crate) fn join_segments(segments: &[String]) -> String {
    segments.join(".")
}

/// Resolve `path` against `root`, descending one segment at a time.
///
/// Map descent looks the segment up as a key under the configured case
/// normalization; array descent requires the segment to parse as an
/// in-bounds non-negative integer. An empty path returns the root.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when a segment fails to resolve,
/// retaining the prefix that did resolve for diagnostics.
pub fn resolve<'a>(
    root: &'a Node,
    path: &str,
    delimiter: &str,
    key_case: KeyCase,
) -> ConfigResult<&'a Node> {
    if path.is_empty() {
        return Ok(root);
    }
    let mut current = root;
    let mut resolved: Vec<&str> = Vec::new();
    for segment in path.split(delimiter) {
        current = descend(current, segment, key_case).ok_or_else(|| {
            Arc::new(ConfigError::not_found(path, resolved.join(delimiter)))
        })?;
        resolved.push(segment);
    }
    Ok(current)
}

fn descend<'a>(node: &'a Node, segment: &str, key_case: KeyCase) -> Option<&'a Node> {
    match node.value() {
        NodeValue::Map(children) => match key_case {
            KeyCase::Sensitive => children.get(segment),
            KeyCase::Insensitive => children.get(segment).or_else(|| {
                children
                    .iter()
                    .find(|(key, _)| UncasedStr::new(key) == UncasedStr::new(segment))
                    .map(|(_, child)| child)
            }),
        },
        NodeValue::Array(children) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| children.get(index)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;
    use serde_json::json;

    use crate::error::ConfigError;
    use crate::node::Node;

    use super::{KeyCase, resolve};

    fn sample() -> Result<Node> {
        Node::from_value("sample", &json!({"server": {"hosts": ["a", "b"], "Port": 80}}))
            .map_err(|error| anyhow!("decode failed: {error}"))
    }

    #[test]
    fn empty_path_returns_the_root() -> Result<()> {
        let tree = sample()?;
        let found = resolve(&tree, "", ".", KeyCase::Sensitive)
            .map_err(|error| anyhow!("{error}"))?;
        ensure!(found == &tree, "root not returned");
        Ok(())
    }

    #[test]
    fn descends_maps_and_arrays() -> Result<()> {
        let tree = sample()?;
        let found = resolve(&tree, "server.hosts.1", ".", KeyCase::Sensitive)
            .map_err(|error| anyhow!("{error}"))?;
        ensure!(found.to_value() == json!("b"), "wrong node resolved");
        Ok(())
    }

    #[test]
    fn insensitive_lookup_matches_mixed_case_keys() -> Result<()> {
        let tree = sample()?;
        let found = resolve(&tree, "server.port", ".", KeyCase::Insensitive)
            .map_err(|error| anyhow!("{error}"))?;
        ensure!(found.to_value() == json!(80), "wrong node resolved");
        Ok(())
    }

    #[rstest]
    #[case::missing_key("server.missing", "server")]
    #[case::bad_index("server.hosts.x", "server.hosts")]
    #[case::out_of_bounds("server.hosts.7", "server.hosts")]
    #[case::negative_index("server.hosts.-1", "server.hosts")]
    #[case::scalar_descent("server.Port.deep", "server.Port")]
    fn misses_retain_the_resolved_prefix(
        #[case] path: &str,
        #[case] expected_prefix: &str,
    ) -> Result<()> {
        let tree = sample()?;
        let error = resolve(&tree, path, ".", KeyCase::Sensitive)
            .err()
            .ok_or_else(|| anyhow!("expected a miss for {path}"))?;
        ensure!(
            matches!(
                &*error,
                ConfigError::NotFound { resolved, .. } if resolved == expected_prefix
            ),
            "unexpected error for {path}: {error}"
        );
        Ok(())
    }

    #[test]
    fn custom_delimiter_is_honoured() -> Result<()> {
        let tree = sample()?;
        let found = resolve(&tree, "server/hosts/0", "/", KeyCase::Sensitive)
            .map_err(|error| anyhow!("{error}"))?;
        ensure!(found.to_value() == json!("a"), "wrong node resolved");
        Ok(())
    }
}

//! YAML codec.

use serde_json::Value as JsonValue;

use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;
use crate::result_ext::IntoShared;

use super::{Codec, DecodeContext, EncodeOptions};

/// Codec for YAML documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn decode(&self, context: &DecodeContext<'_>, bytes: &[u8]) -> ConfigResult<Node> {
        if bytes.is_empty() {
            // An empty document decodes to an empty tree rather than null.
            return Ok(Node::empty());
        }
        let value: JsonValue = serde_yaml::from_slice(bytes).map_err(|error| {
            let location = error.location();
            ConfigError::decode_at(
                context.source,
                location.as_ref().map(serde_yaml::Location::line),
                location.as_ref().map(serde_yaml::Location::column),
                error.to_string(),
            )
            .shared()
        })?;
        Node::from_value(context.source, &value)
    }

    fn encode(&self, node: &Node, options: &EncodeOptions) -> ConfigResult<Vec<u8>> {
        let value = if options.redact_secrets {
            node.to_value_redacted()
        } else {
            node.to_value()
        };
        serde_yaml::to_string(&value)
            .map(String::into_bytes)
            .map_err(|error| ConfigError::encode("yaml", error.to_string()))
            .into_shared()
    }
}

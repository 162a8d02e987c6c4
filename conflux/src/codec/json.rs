//! JSON codec.

use serde_json::Value as JsonValue;

use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;
use crate::result_ext::IntoShared;

use super::{Codec, DecodeContext, EncodeOptions};

/// Codec for JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, context: &DecodeContext<'_>, bytes: &[u8]) -> ConfigResult<Node> {
        let value: JsonValue = serde_json::from_slice(bytes).map_err(|error| {
            ConfigError::decode_at(
                context.source,
                Some(error.line()),
                Some(error.column()),
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
        let mut bytes = serde_json::to_vec_pretty(&value)
            .map_err(|error| ConfigError::encode("json", error.to_string()))
            .into_shared()?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

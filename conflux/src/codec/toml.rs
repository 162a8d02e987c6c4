//! TOML codec.

use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;
use crate::result_ext::IntoShared;

use super::{Codec, DecodeContext, EncodeOptions};

/// Codec for TOML documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn decode(&self, context: &DecodeContext<'_>, bytes: &[u8]) -> ConfigResult<Node> {
        let text = std::str::from_utf8(bytes)
            .map_err(|error| ConfigError::decode(context.source, error.to_string()))
            .into_shared()?;
        let parsed: toml::Value = toml::from_str(text).map_err(|error| {
            let position = error
                .span()
                .map(|span| position_at(text, span.start));
            ConfigError::decode_at(
                context.source,
                position.map(|(line, _)| line),
                position.map(|(_, column)| column),
                error.message().to_owned(),
            )
            .shared()
        })?;
        let value = serde_json::to_value(&parsed)
            .map_err(|error| ConfigError::decode(context.source, error.to_string()))
            .into_shared()?;
        Node::from_value(context.source, &value)
    }

    fn encode(&self, node: &Node, options: &EncodeOptions) -> ConfigResult<Vec<u8>> {
        let value = if options.redact_secrets {
            node.to_value_redacted()
        } else {
            node.to_value()
        };
        toml::to_string_pretty(&value)
            .map(String::into_bytes)
            .map_err(|error| ConfigError::encode("toml", error.to_string()))
            .into_shared()
    }
}

/// One-based line and column of a byte offset within `text`.
fn position_at(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (index, ch) in text.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

//! Codec boundary: pluggable per-extension decoders and encoders.
//!
//! A codec turns raw bytes into a [`Node`] tree and back. Codecs are keyed
//! by file extension (case-insensitive) in a [`CodecRegistry`] owned by
//! each compiler instance; registering the same extension twice is
//! rejected rather than silently replaced.

mod json;
#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "yaml")]
mod yaml;

pub use json::JsonCodec;
#[cfg(feature = "toml")]
pub use toml::TomlCodec;
#[cfg(feature = "yaml")]
pub use yaml::YamlCodec;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::node::Node;
use crate::result_ext::IntoShared;


/// Context handed to codecs when decoding a record.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext<'a> {
    /// Record name used for provenance and error attribution.
    pub source: &'a str,
    /// Key-path delimiter configured on the compiler.
    pub delimiter: &'a str,
}

/// Options controlling encoder output.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodeOptions {
    /// Mask scalars flagged secret instead of emitting them.
    pub redact_secrets: bool,
}

/// A file-format decoder/encoder pair.
pub trait Codec: Send + Sync {
    /// Decode raw bytes into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] carrying the source name and, where
    /// the format reports one, the line and column of the failure.
    fn decode(&self, context: &DecodeContext<'_>, bytes: &[u8]) -> ConfigResult<Node>;

    /// Encode a tree into serialized bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] when the tree cannot be represented
    /// in the target format.
    fn encode(&self, node: &Node, options: &EncodeOptions) -> ConfigResult<Vec<u8>>;
}

/// Extension-keyed codec registry owned by a compiler instance.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl CodecRegistry {
    /// A registry with no codecs.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in codecs for the enabled formats.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.insert("json", Arc::new(JsonCodec));
        #[cfg(feature = "toml")]
        registry.insert("toml", Arc::new(TomlCodec));
        #[cfg(feature = "yaml")]
        {
            registry.insert("yaml", Arc::new(YamlCodec));
            registry.insert("yml", Arc::new(YamlCodec));
        }
        registry
    }

    fn insert(&mut self, extension: &str, codec: Arc<dyn Codec>) {
        self.codecs.insert(extension.to_ascii_lowercase(), codec);
    }

    /// Register a codec for `extension`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Duplicate`] when the extension (compared
    /// case-insensitively) is already registered.
    pub fn register(&mut self, extension: &str, codec: Arc<dyn Codec>) -> ConfigResult<()> {
        let key = extension.to_ascii_lowercase();
        if self.codecs.contains_key(&key) {
            return Err(ConfigError::duplicate(key)).into_shared();
        }
        self.codecs.insert(key, codec);
        Ok(())
    }

    /// Look up the codec for `extension`, case-insensitively.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.get(&extension.to_ascii_lowercase()).cloned()
    }

    /// Whether a codec is registered for `extension`.
    #[must_use]
    pub fn supports(&self, extension: &str) -> bool {
        self.codecs.contains_key(&extension.to_ascii_lowercase())
    }

    /// Registered extensions, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.codecs.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}
